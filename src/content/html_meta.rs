use std::fmt::Write;
use std::io;
use std::io::ErrorKind;

use lazy_static::lazy_static;
use regex::Regex;

use crate::content::front_matter::{
    parse_offset_date, split_categories, FrontMatter, CANONICAL_DATE_FORMAT, DEFAULT_LAYOUT,
};

/// Emits the post metadata as a block of `<meta name="post:...">` tags for
/// the page head. `extract_meta` reads the same block back, so generated
/// pages stay machine-readable without a sidecar file.
pub fn embed_meta(front_matter: &FrontMatter) -> String {
    let mut buf = String::new();
    push_meta(&mut buf, "layout", &front_matter.layout);
    push_meta(&mut buf, "title", &front_matter.title);
    push_meta(
        &mut buf,
        "date",
        &front_matter.date.format(CANONICAL_DATE_FORMAT).to_string(),
    );
    push_meta(&mut buf, "author", &front_matter.author);
    if !front_matter.categories.is_empty() {
        push_meta(&mut buf, "categories", &front_matter.categories.join(" "));
    }
    buf
}

fn push_meta(buf: &mut String, name: &str, content: &str) {
    let _ = writeln!(
        buf,
        "<meta name=\"post:{}\" content=\"{}\">",
        name,
        escape_attr(content)
    );
}

pub fn extract_meta(html: &str) -> io::Result<FrontMatter> {
    lazy_static! {
        static ref META_RE: Regex = Regex::new(
            r#"<meta name="post:(?P<name>[a-z]+)" content="(?P<content>[^"]*)">"#
        )
        .unwrap();
    }

    let mut layout: Option<String> = None;
    let mut title: Option<String> = None;
    let mut date: Option<String> = None;
    let mut author: Option<String> = None;
    let mut categories: Vec<String> = vec![];

    for captures in META_RE.captures_iter(html) {
        let name = &captures["name"];
        let content = unescape_attr(&captures["content"]);
        match name {
            "layout" => layout = Some(content),
            "title" => title = Some(content),
            "date" => date = Some(content),
            "author" => author = Some(content),
            "categories" => categories = split_categories(&content),
            _ => {}
        }
    }

    let title = title.ok_or_else(|| missing_meta("title"))?;
    let author = author.ok_or_else(|| missing_meta("author"))?;
    let date = date.ok_or_else(|| missing_meta("date"))?;
    let date = parse_offset_date(&date).map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;

    Ok(FrontMatter {
        layout: layout.unwrap_or_else(|| DEFAULT_LAYOUT.to_string()),
        title,
        date,
        categories,
        author,
    })
}

fn missing_meta(name: &str) -> io::Error {
    io::Error::new(
        ErrorKind::InvalidData,
        format!("Page has no post:{} meta tag", name),
    )
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn unescape_attr(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, TimeZone};

    use super::*;

    fn sample() -> FrontMatter {
        FrontMatter {
            layout: "post".to_string(),
            title: "How to run a code review".to_string(),
            date: FixedOffset::west_opt(7 * 3600)
                .unwrap()
                .with_ymd_and_hms(2020, 5, 22, 10, 15, 0)
                .unwrap(),
            categories: vec!["engineering".to_string(), "process".to_string()],
            author: "thiago".to_string(),
        }
    }

    #[test]
    fn test_embed_meta_output() {
        let block = embed_meta(&sample());
        println!("{}", block);
        assert_eq!(
            block,
            r##"<meta name="post:layout" content="post">
<meta name="post:title" content="How to run a code review">
<meta name="post:date" content="2020-05-22 10:15:00 -0700">
<meta name="post:author" content="thiago">
<meta name="post:categories" content="engineering process">
"##
        );
    }

    #[test]
    fn test_round_trip() {
        let original = sample();
        let block = embed_meta(&original);
        let page = format!("<html><head>\n{}</head><body></body></html>", block);
        let parsed = extract_meta(&page).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_round_trip_with_markup_in_title() {
        let mut original = sample();
        original.title = "Ben & Jerry's \"best\" <post>".to_string();
        original.categories = vec![];
        let block = embed_meta(&original);
        assert!(block.contains("Ben &amp; Jerry's &quot;best&quot; &lt;post&gt;"));
        let parsed = extract_meta(&block).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn test_extract_requires_core_fields() {
        let page = r##"<meta name="post:title" content="T">"##;
        assert!(extract_meta(page).is_err());
    }

    #[test]
    fn test_extract_defaults_layout() {
        let page = r##"<meta name="post:title" content="T">
<meta name="post:date" content="2024-01-02 03:04:05 +0000">
<meta name="post:author" content="A">
"##;
        let parsed = extract_meta(page).unwrap();
        assert_eq!(parsed.layout, "post");
        assert!(parsed.categories.is_empty());
    }
}
