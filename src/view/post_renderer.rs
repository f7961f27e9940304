use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::content::html_meta::embed_meta;
use crate::content::Content;
use crate::text_utils::format_date_time;

#[derive(ramhorns::Content)]
struct ViewCategory<'a> {
    name: &'a str,
}

#[derive(ramhorns::Content)]
struct ViewItem<'a> {
    /// Meta tag block for the page head, templates place it with
    /// `{{{meta}}}`.
    meta: &'a str,
    link: &'a str,
    author: &'a str,
    categories: &'a Vec<ViewCategory<'a>>,
    date: &'a str,
    time: &'a str,
    post_title: &'a str,
    post_content: &'a str,
}

pub struct PostRenderer<'a> {
    pub template: Template<'a>,
}

impl PostRenderer<'_> {
    pub fn new(view_tpl_src: &str) -> io::Result<PostRenderer> {
        let template = match Template::new(view_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("Error parsing post view template: {}", e),
                ));
            }
        };

        Ok(PostRenderer { template })
    }

    pub fn render(&self, content: &Content) -> String {
        let ref categories: Vec<ViewCategory> = content
            .front_matter
            .categories
            .iter()
            .map(|c| ViewCategory { name: c.as_str() })
            .collect();
        let (date, time) = format_date_time(&content.front_matter.date);
        let meta = embed_meta(&content.front_matter);

        self.template.render(&ViewItem {
            meta: meta.as_str(),
            link: content.link.as_str(),
            author: content.front_matter.author.as_str(),
            categories,
            date: date.as_str(),
            time: time.as_str(),
            post_title: content.front_matter.title.as_str(),
            post_content: content.rendered.as_str(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{FixedOffset, TimeZone};

    use crate::content::front_matter::FrontMatter;
    use crate::content::html_meta::extract_meta;
    use crate::content::Content;
    use crate::view::post_renderer::PostRenderer;

    fn sample_content() -> Content {
        Content {
            front_matter: FrontMatter {
                layout: "post".to_string(),
                title: "<post-title>".to_string(),
                date: FixedOffset::east_opt(0)
                    .unwrap()
                    .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
                    .unwrap(),
                categories: vec!["<rust>".to_string(), "programming".to_string()],
                author: "<Thiago>".to_string(),
            },
            link: "post-link".to_string(),
            file_path: PathBuf::from("file_name.md"),
            rendered: "<post-content>".to_string(),
        }
    }

    #[test]
    fn render_view() {
        let template_src = r##"
TITLE=[{{{post_title}}}]
AUTHOR=[{{author}}]
DATE=[{{date}}]
TIME=[{{time}}]
CATEGORIES=[{{#categories}}({{name}}){{/categories}}]
POST_CONTENT=[{{{post_content}}}]"##;
        let post_renderer = PostRenderer::new(template_src).unwrap();
        let res = post_renderer.render(&sample_content());
        assert_eq!(
            res,
            r##"
TITLE=[<post-title>]
AUTHOR=[&lt;Thiago&gt;]
DATE=[2024-01-02]
TIME=[03:04:05]
CATEGORIES=[(&lt;rust&gt;)(programming)]
POST_CONTENT=[<post-content>]"##
        );
    }

    #[test]
    fn rendered_page_keeps_metadata_readable() {
        let template_src = "<head>\n{{{meta}}}</head>\n<body>{{{post_content}}}</body>";
        let post_renderer = PostRenderer::new(template_src).unwrap();
        let content = sample_content();
        let page = post_renderer.render(&content);
        let recovered = extract_meta(&page).unwrap();
        assert_eq!(recovered, content.front_matter);
    }
}
