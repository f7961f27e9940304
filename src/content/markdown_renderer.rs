use std::io;
use std::io::ErrorKind;
use std::str::Lines;

use markdown::Options;

use crate::content::content_file::ContentFile;
use crate::content::front_matter::FrontMatter;
use crate::content::Content;

pub const DEFAULT_BREAK_TAG: &str = "<!-- more -->";

/// Prefix applied to relative image targets so posts can reference their
/// sibling files no matter which page embeds the rendered HTML.
#[derive(Clone)]
pub struct AssetPrefix(pub String);

#[derive(Clone)]
pub struct PreviewLimit {
    pub break_tag: String,
    /// Fallback cap for posts that never place a break tag.
    pub max_lines: Option<usize>,
}

impl Default for PreviewLimit {
    fn default() -> Self {
        PreviewLimit {
            break_tag: DEFAULT_BREAK_TAG.to_string(),
            max_lines: None,
        }
    }
}

#[derive(Clone)]
pub enum RenderMode {
    Preview(PreviewLimit, AssetPrefix),
    Full,
}

pub struct MarkdownRenderer {}

impl MarkdownRenderer {
    pub fn render(content_file: &ContentFile, render_mode: RenderMode) -> io::Result<Content> {
        let link = content_file.link.clone();
        let (front_matter, lines) =
            FrontMatter::parse(&content_file.file_path, content_file.raw_content.lines())?;
        let body = collect_body(lines, &render_mode);

        let prefix: Option<&str> = match render_mode {
            RenderMode::Preview(_, ref asset_prefix) => Some(asset_prefix.0.as_str()),
            RenderMode::Full => None,
        };
        let rendered = render_markdown(&body, prefix)?;

        Ok(Content {
            front_matter,
            link,
            file_path: content_file.file_path.clone(),
            rendered,
        })
    }
}

fn collect_body(mut lines: Lines, render_mode: &RenderMode) -> String {
    match render_mode {
        RenderMode::Preview(limit, _) => {
            let mut content = String::new();
            let mut line_count: usize = 0;
            while let Some(line) = lines.next() {
                if line.contains(limit.break_tag.as_str()) {
                    break;
                }
                if let Some(max_lines) = limit.max_lines {
                    if line_count >= max_lines {
                        break;
                    }
                }
                content.push_str(line);
                content.push('\n');
                line_count += 1;
            }
            content
        }
        RenderMode::Full => {
            let mut content = String::new();
            while let Some(line) = lines.next() {
                content.push_str(line);
                content.push('\n');
            }
            content
        }
    }
}

fn render_markdown(md_text: &str, asset_prefix: Option<&str>) -> io::Result<String> {
    let buf = remove_comments(md_text)?;
    let buf = if let Some(asset_prefix) = asset_prefix {
        change_images(asset_prefix, buf.as_str())
    } else {
        buf
    };
    match markdown::to_html_with_options(buf.as_str(), &Options::gfm()) {
        Ok(x) => Ok(x),
        Err(e) => Err(io::Error::new(ErrorKind::InvalidInput, e.reason.as_str())),
    }
}

/// Strips HTML comments before rendering. The break tag is a comment too,
/// so full renders never leak it into the page.
pub fn remove_comments(md_post: &str) -> io::Result<String> {
    let mut res: String = String::new();
    let mut slice = Some(md_post);

    let start_comment = "<!--";
    let end_comment = "-->";

    loop {
        if let Some(block) = slice {
            let maybe_start = block.find(start_comment);
            let md_buf: &str = match maybe_start {
                Some(start) => {
                    let to_render: &str = &block[0..start];

                    let next: &str = &block[(start + start_comment.len())..];
                    match next.find(end_comment) {
                        Some(end) => {
                            slice = Some(&next[(end + end_comment.len())..]);
                        }
                        None => {
                            return Err(io::Error::new(
                                io::ErrorKind::InvalidData,
                                "Error finding end of comment",
                            ));
                        }
                    };

                    to_render
                }
                None => {
                    slice = None;
                    block
                }
            };
            res.push_str(md_buf);
        } else {
            break;
        }
    }

    Ok(res)
}

fn is_relative_target(url: &str) -> bool {
    !url.starts_with('/') && !url.contains("://") && !url.starts_with("data:")
}

/// Rewrites relative image targets (`![alt](photo.png)`) to live under the
/// given prefix. Absolute and rooted targets are left alone.
fn change_images(prefix: &str, md_post: &str) -> String {
    let mut parsed_string = String::new();
    let mut remaining_input = md_post;

    while let Some(text_start) = remaining_input.find("![") {
        let text_end = text_start + 2;

        parsed_string.push_str(&remaining_input[0..text_end]);
        remaining_input = &remaining_input[text_end..];

        if let Some(link_end) = remaining_input.find("](") {
            let link_text = &remaining_input[..link_end];
            let url_start = link_end + 2;

            let url_start_slice = &remaining_input[url_start..];
            if let Some(url_end) = url_start_slice.find(')') {
                let url = &url_start_slice[..url_end];
                let prefixed_url = if !is_relative_target(url) {
                    url.to_string()
                } else if prefix.ends_with('/') {
                    format!("{}{}", prefix, url)
                } else {
                    format!("{}/{}", prefix, url)
                };

                parsed_string.push_str(link_text);
                parsed_string.push_str("](");
                parsed_string.push_str(&prefixed_url);
                parsed_string.push(')');

                remaining_input = &url_start_slice[url_end + 1..];
            }
        }
    }

    parsed_string.push_str(remaining_input);

    parsed_string
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use crate::test_data::POST_DATA;

    use super::*;

    fn post_file() -> ContentFile {
        ContentFile {
            link: "20200522_how_to_run_a_code_review".to_string(),
            file_path: PathBuf::from("posts/20200522_how_to_run_a_code_review/index.md"),
            raw_content: POST_DATA.to_string(),
        }
    }

    #[test]
    fn test_preview_stops_at_break_tag() {
        let prefix = AssetPrefix("image/".to_string());
        let content =
            MarkdownRenderer::render(&post_file(), RenderMode::Preview(PreviewLimit::default(), prefix))
                .unwrap();
        assert_eq!(content.front_matter.title, "How to run a code review");
        assert_eq!(
            content.rendered,
            r##"<p>Code reviews are the cheapest quality tool a team has.</p>
<p>This is how I run mine after twenty years of doing them.</p>
"##
        );
    }

    #[test]
    fn test_full_content() {
        let content = MarkdownRenderer::render(&post_file(), RenderMode::Full).unwrap();
        assert!(!content.rendered.contains("<!-- more -->"));
        assert_eq!(
            content.rendered,
            r##"<p>Code reviews are the cheapest quality tool a team has.</p>
<p>This is how I run mine after twenty years of doing them.</p>
<h2>Start with the tests</h2>
<p>Read the tests first. They tell you what the author believes the change does.</p>
<p>A review that starts with the implementation ends in style nitpicks.</p>
"##
        );
    }

    #[test]
    fn test_preview_line_cap() {
        let raw = "---\ntitle: T\ndate: 2024-01-02 03:04:05 +0000\nauthor: A\n---\nParagraph one.\n\nParagraph two.\n";
        let file = ContentFile {
            link: "t".to_string(),
            file_path: PathBuf::from("posts/t.md"),
            raw_content: raw.to_string(),
        };
        let limit = PreviewLimit {
            break_tag: DEFAULT_BREAK_TAG.to_string(),
            max_lines: Some(1),
        };
        let content =
            MarkdownRenderer::render(&file, RenderMode::Preview(limit, AssetPrefix("p/".to_string())))
                .unwrap();
        assert_eq!(content.rendered, "<p>Paragraph one.</p>\n");
    }

    #[test]
    fn test_remove_comments() {
        let content = r#"Some text.<!-- more -->Wo<!-- xyz -->rd"#;
        let res = remove_comments(content).unwrap();
        assert_eq!(res, "Some text.Word");

        let res = remove_comments("").unwrap();
        assert_eq!(res, "");

        let res = remove_comments("<!-- more --><!-- xyz -->").unwrap();
        assert_eq!(res, "");

        let res = remove_comments("No comment here").unwrap();
        assert_eq!(res, "No comment here");

        assert!(remove_comments("Broken <!-- comment").is_err());
    }

    #[test]
    fn test_change_images_prefixes_relative_targets() {
        let md = "Before\n![diagram](diagram.png)\nAfter";
        let res = change_images("/view/my-post", md);
        assert_eq!(res, "Before\n![diagram](/view/my-post/diagram.png)\nAfter");

        let res = change_images("/view/my-post/", md);
        assert_eq!(res, "Before\n![diagram](/view/my-post/diagram.png)\nAfter");
    }

    #[test]
    fn test_change_images_leaves_absolute_targets() {
        let md = "![a](https://example.com/a.png) ![b](/public/b.png) ![c](c.png)";
        let res = change_images("/view/p", md);
        assert_eq!(
            res,
            "![a](https://example.com/a.png) ![b](/public/b.png) ![c](/view/p/c.png)"
        );
    }
}
