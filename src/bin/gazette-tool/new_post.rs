use std::fmt::Write;
use std::fs::{create_dir, File};
use std::path::PathBuf;

use chrono::Local;

use gazette::content::front_matter::{
    render_front_matter, split_categories, FrontMatter, DEFAULT_LAYOUT,
};
use gazette::text_utils::post_slug;

use crate::{NewArgs, PostOutput};

fn get_author(args: &NewArgs) -> String {
    if let Some(ref name) = args.name {
        return name.clone();
    }

    let name = whoami::realname();
    if name.is_empty() {
        return whoami::username();
    }
    name
}

fn render_body() -> String {
    let mut buf = String::new();

    let _ = writeln!(&mut buf, "This is the opening of your post");
    let _ = writeln!(&mut buf, "Everything above the break ends up in the listing preview");
    let _ = writeln!(&mut buf, "");
    let _ = writeln!(&mut buf, "<!-- more -->");
    let _ = writeln!(&mut buf, "");
    let _ = writeln!(&mut buf, "And this is the rest of your post");

    buf
}

pub fn new_cmd(args: NewArgs) {
    let author = get_author(&args);
    let date = Local::now().fixed_offset();

    let req_title = match args.output {
        PostOutput::Stdout => false,
        _ => true,
    };

    if req_title && args.title.is_none() {
        eprintln!("For file and dir outputs, title is required");
        return;
    }

    let title = args
        .title
        .clone()
        .unwrap_or_else(|| "Replace with title".to_string());
    let categories = args
        .categories
        .as_deref()
        .map(split_categories)
        .unwrap_or_default();

    let front_matter = FrontMatter {
        layout: DEFAULT_LAYOUT.to_string(),
        title,
        date,
        categories,
        author,
    };

    let header = render_front_matter(&front_matter);
    let body = render_body();

    match args.output {
        PostOutput::Stdout => {
            println!("{}", header);
            println!("{}", body);
        }
        PostOutput::File => {
            use std::io::Write;
            let file_name = post_slug(&date.date_naive(), &front_matter.title);
            let file_name = format!("{}.md", file_name);
            println!("Creating file {}", file_name);
            let mut file = File::create(&file_name).unwrap();
            file.write_all(header.as_bytes()).unwrap();
            file.write_all(b"\n").unwrap();
            file.write_all(body.as_bytes()).unwrap();
        }
        PostOutput::Dir => {
            use std::io::Write;
            let dir_name = post_slug(&date.date_naive(), &front_matter.title);
            let file_name = "index.md";
            let full_path: PathBuf = PathBuf::from(&dir_name).join(file_name);
            println!("Creating dir post {}", full_path.display());
            create_dir(&dir_name).unwrap();
            let mut file = File::create(&full_path).unwrap();
            file.write_all(header.as_bytes()).unwrap();
            file.write_all(b"\n").unwrap();
            file.write_all(body.as_bytes()).unwrap();
        }
    };
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use gazette::content::front_matter::scan_front_matter;

    use super::*;

    #[test]
    fn test_happy_case() {
        let front_matter = FrontMatter {
            layout: "post".to_string(),
            title: "This is a title".to_string(),
            date: FixedOffset::west_opt(3 * 3600)
                .unwrap()
                .with_ymd_and_hms(2024, 2, 27, 6, 20, 53)
                .unwrap(),
            categories: vec!["rust".to_string(), "blog".to_string()],
            author: "Thiago".to_string(),
        };

        let header = render_front_matter(&front_matter);
        assert_eq!(
            header,
            r##"---
layout: post
title: This is a title
date: 2024-02-27 06:20:53 -0300
categories: rust blog
author: Thiago
---
"##
        );
    }

    #[test]
    fn test_generated_post_parses_back() {
        let front_matter = FrontMatter {
            layout: DEFAULT_LAYOUT.to_string(),
            title: "Replace with title".to_string(),
            date: FixedOffset::east_opt(3600)
                .unwrap()
                .with_ymd_and_hms(2025, 1, 5, 9, 0, 0)
                .unwrap(),
            categories: vec![],
            author: "ana".to_string(),
        };

        let source = format!("{}\n{}", render_front_matter(&front_matter), render_body());
        let path = PathBuf::from("20250105_replace_with_title.md");
        let (raw, _) = scan_front_matter(&path, source.lines()).unwrap();
        let parsed = FrontMatter::from_raw(&path, &raw).unwrap();
        assert_eq!(parsed, front_matter);
    }
}
