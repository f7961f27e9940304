use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::{fs, io};

use anyhow::Result;
use spdlog::info;

use crate::config::Config;
use crate::content::content_file::is_markdown;
use crate::content::Content;
use crate::paginator::Paginator;
use crate::post_processor::{
    corpus_stats, list_post_files, load_previews, open_content, render_feed, render_index,
    render_list,
};
use crate::render_cache::RenderCache;
use crate::view::list_renderer::PageLinkStyle;

pub struct BuildSummary {
    pub posts: usize,
    pub pages_written: usize,
    pub assets_copied: usize,
}

/// Bakes the whole blog into the output directory. The tree mirrors the
/// server routes, so a page keeps its address when the blog moves between
/// served and static hosting:
///
/// ```text
/// index.html
/// list/index.html               list/page/2/index.html ...
/// list/<category>/index.html    list/<category>/page/2/index.html ...
/// view/<link>/index.html        plus the post's own asset files
/// feed.xml                      when a feed is configured
/// public/...
/// ```
pub fn build_site(config: &Config) -> Result<BuildSummary> {
    let output_dir = &config.paths.output_dir;
    fs::create_dir_all(output_dir)?;
    info!("Building site into {}", output_dir.display());

    let posts = list_post_files(&config.paths.posts_dir, config.index_base())?;
    let post_links: HashMap<String, PathBuf> =
        posts.into_iter().map(|post| (post.link, post.path)).collect();

    let mut cache = RenderCache::new();
    let preview = config.preview_limit();
    let listing = load_previews(&mut cache, &post_links, None, &preview)?;

    let mut summary = BuildSummary {
        posts: listing.contents.len(),
        pages_written: 0,
        assets_copied: 0,
    };

    let stats = corpus_stats(&listing);
    write_page(&output_dir.join("index.html"), &render_index(config, &stats)?)?;
    summary.pages_written += 1;

    summary.pages_written +=
        write_listing_tree(config, &mut cache, &post_links, None, &output_dir.join("list"))?;

    for category in listing.categories.by_frequency() {
        let dir = output_dir.join("list").join(&category);
        summary.pages_written +=
            write_listing_tree(config, &mut cache, &post_links, Some(category.as_str()), &dir)?;
    }

    for content in listing.contents.iter() {
        let page = open_content(config, &post_links, &content.link)?;
        let post_dir = output_dir.join("view").join(&content.link);
        write_page(&post_dir.join("index.html"), &page)?;
        summary.pages_written += 1;

        // Posts living in their own directory carry images and other
        // files next to the markdown source
        if let Some(src_dir) = content.file_path.parent() {
            if src_dir != config.paths.posts_dir {
                summary.assets_copied += copy_post_assets(src_dir, &post_dir)?;
            }
        }
    }

    if config.feed.is_some() {
        let xml = render_feed(config, &listing)?;
        fs::write(output_dir.join("feed.xml"), xml)?;
        summary.pages_written += 1;
    }

    if config.paths.public_dir.is_dir() {
        summary.assets_copied +=
            copy_dir_recursive(&config.paths.public_dir, &output_dir.join("public"))?;
    }

    Ok(summary)
}

/// Writes every page of one listing. Page 1 sits at the tree root, further
/// pages go under page/<n>/ so they can never collide with a category name.
fn write_listing_tree(
    config: &Config,
    cache: &mut RenderCache<Content>,
    post_links: &HashMap<String, PathBuf>,
    category: Option<&str>,
    dir: &Path,
) -> Result<usize> {
    let preview = config.preview_limit();
    let listing = load_previews(cache, post_links, category, &preview)?;

    // Same arithmetic as the served listing. An empty blog still gets
    // its page 1.
    let page_count = Paginator::from(&listing.contents, config.defaults.page_size)
        .page_count()
        .max(1);

    let base = match category {
        None => "/list".to_string(),
        Some(category) => format!("/list/{}", category),
    };
    let style = PageLinkStyle::Path { base };

    let mut written = 0;
    for page in 1..=page_count {
        let listing = load_previews(cache, post_links, category, &preview)?;
        let html = render_list(config, listing, page, &style)?;
        let target = if page == 1 {
            dir.join("index.html")
        } else {
            dir.join("page").join(page.to_string()).join("index.html")
        };
        write_page(&target, &html)?;
        written += 1;
    }

    Ok(written)
}

fn write_page(target: &Path, html: &str) -> io::Result<()> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(target, html)
}

fn copy_post_assets(src_dir: &Path, target_dir: &Path) -> io::Result<usize> {
    let mut copied = 0;
    for entry in fs::read_dir(src_dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || is_markdown(&path) {
            continue;
        }
        fs::create_dir_all(target_dir)?;
        fs::copy(&path, target_dir.join(entry.file_name()))?;
        copied += 1;
    }
    Ok(copied)
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<usize> {
    fs::create_dir_all(dst)?;
    let mut copied = 0;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let target = dst.join(entry.file_name());
        if path.is_dir() {
            copied += copy_dir_recursive(&path, &target)?;
        } else {
            fs::copy(&path, &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;

    use tempfile::{tempdir, TempDir};

    use crate::config::{Config, Defaults, Paths, Server, Site};
    use crate::test_data::{POST_DATA, POST_DATA_NO_BREAK};

    use super::*;

    fn write_file(path: &Path, data: &str) {
        let mut file = File::create(path).unwrap();
        file.write_all(data.as_bytes()).unwrap();
    }

    fn fixture() -> (TempDir, Config) {
        let root = tempdir().unwrap();
        let posts_dir = root.path().join("posts");
        let template_dir = root.path().join("template");
        let public_dir = root.path().join("public");
        fs::create_dir_all(&posts_dir).unwrap();
        fs::create_dir_all(&template_dir).unwrap();
        fs::create_dir_all(&public_dir).unwrap();

        let dir_post = posts_dir.join("20200522_code_review");
        fs::create_dir(&dir_post).unwrap();
        write_file(&dir_post.join("index.md"), POST_DATA);
        write_file(&dir_post.join("photo.svg"), "<svg></svg>");
        write_file(&posts_dir.join("20211103_sourdough.md"), POST_DATA_NO_BREAK);

        write_file(&public_dir.join("style.css"), "body {}");

        write_file(&template_dir.join("index.tpl"), "{{site_title}}");
        write_file(
            &template_dir.join("postlist.tpl"),
            "{{#post_list}}[{{title}}]{{/post_list}}|{{#page_list}}<{{href}}>{{/page_list}}",
        );
        write_file(
            &template_dir.join("post.tpl"),
            "<h1>{{post_title}}</h1>\n{{{post_content}}}",
        );

        let config = Config {
            site: Site {
                title: "Test blog".to_string(),
                base_url: "https://blog.example.com".to_string(),
                description: "A test blog".to_string(),
            },
            paths: Paths {
                template_dir,
                public_dir,
                posts_dir,
                output_dir: root.path().join("output"),
            },
            defaults: Defaults {
                index_base_name: Some("index".to_string()),
                page_size: 1,
                preview_break_tag: None,
                preview_max_lines: Some(40),
                rendering_cache_enabled: true,
            },
            server: Server {
                address: "127.0.0.1".to_string(),
                port: 4020,
            },
            log: None,
            metrics: None,
            feed: None,
        };
        (root, config)
    }

    #[test]
    fn test_build_site_tree() {
        let (_root, config) = fixture();
        let summary = build_site(&config).unwrap();

        let out = &config.paths.output_dir;
        assert!(out.join("index.html").is_file());
        assert!(out.join("list/index.html").is_file());
        // page_size 1, two posts: exactly two pages, no phantom third
        assert!(out.join("list/page/2/index.html").is_file());
        assert!(!out.join("list/page/3").exists());
        assert!(out.join("list/cooking/index.html").is_file());
        assert!(out.join("list/engineering/index.html").is_file());
        assert!(out.join("list/process/index.html").is_file());
        assert!(out.join("view/20200522_code_review/index.html").is_file());
        assert!(out.join("view/20211103_sourdough/index.html").is_file());
        assert!(out.join("view/20200522_code_review/photo.svg").is_file());
        assert!(out.join("public/style.css").is_file());
        assert!(!out.join("feed.xml").exists());

        assert_eq!(summary.posts, 2);
        // index + 2 listing pages + 3 category pages + 2 posts
        assert_eq!(summary.pages_written, 8);
        // photo.svg + style.css
        assert_eq!(summary.assets_copied, 2);
    }

    #[test]
    fn test_build_site_page_links() {
        let (_root, config) = fixture();
        build_site(&config).unwrap();

        let out = &config.paths.output_dir;
        let page_1 = fs::read_to_string(out.join("list/index.html")).unwrap();
        println!("{}", page_1);
        // newest first, one post per page
        assert_eq!(
            page_1,
            "[Sourdough starter notes]|</list/></list/page/2/>"
        );
        let page_2 = fs::read_to_string(out.join("list/page/2/index.html")).unwrap();
        assert_eq!(
            page_2,
            "[How to run a code review]|</list/></list/page/2/>"
        );

        let cooking = fs::read_to_string(out.join("list/cooking/index.html")).unwrap();
        assert_eq!(cooking, "[Sourdough starter notes]|</list/cooking/>");
    }

    #[test]
    fn test_build_site_feed() {
        let (_root, mut config) = fixture();
        config.feed = Some(crate::config::Feed { page_size: 10 });
        build_site(&config).unwrap();

        let xml =
            fs::read_to_string(config.paths.output_dir.join("feed.xml")).unwrap();
        assert!(xml.contains("<title>Test blog</title>"));
        assert!(xml.contains("20211103_sourdough"));
    }

    #[test]
    fn test_build_empty_blog() {
        let (_root, mut config) = fixture();
        let empty = config.paths.posts_dir.join("none");
        fs::create_dir_all(&empty).unwrap();
        config.paths.posts_dir = empty;

        let summary = build_site(&config).unwrap();
        assert_eq!(summary.posts, 0);
        // index and the empty listing page
        assert_eq!(summary.pages_written, 2);
        assert!(config.paths.output_dir.join("list/index.html").is_file());
    }
}
