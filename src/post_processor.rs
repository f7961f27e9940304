use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::{fs, io};

use anyhow::Result;
use chrono::Utc;
use ntex::web;
use ntex::web::{Error, HttpRequest};
use ntex_files::NamedFile;
use ramhorns::Template;
use spdlog::{info, warn};

use crate::category_index::CategoryIndex;
use crate::config::Config;
use crate::content::content_file::ContentFile;
use crate::content::markdown_renderer::{AssetPrefix, MarkdownRenderer, PreviewLimit, RenderMode};
use crate::content::Content;
use crate::paginator::Paginator;
use crate::post_list::PostList;
use crate::query_string::QueryString;
use crate::render_cache::{Expire, RenderCache};
use crate::view::list_renderer::{ListRenderer, PageLinkStyle};
use crate::view::post_renderer::PostRenderer;
use crate::view::rss_renderer::RssChannel;

#[derive(ramhorns::Content)]
struct IndexPage<'a> {
    site_title: &'a str,
    site_description: &'a str,
    post_count: i64,
    category_count: i64,
    days_since_first_post: i64,
}

#[derive(Debug)]
pub struct PostLink {
    pub link: String,
    pub path: PathBuf,
}

/// Finds every post under the posts directory: subdirectories holding an
/// index file (link = directory name) and loose markdown files
/// (link = file stem).
pub fn list_post_files(root_dir: &Path, index_base: &str) -> Result<Vec<PostLink>> {
    let post_list = PostList {
        root_dir: root_dir.to_path_buf(),
        index_base: index_base.to_string(),
    };

    let dirs = post_list.retrieve_dirs()?;
    let mut posts = vec![];
    for (dir, file_name) in dirs {
        let Some(link) = dir.iter().last().and_then(|name| name.to_str()) else {
            continue;
        };
        posts.push(PostLink {
            link: link.to_string(),
            path: dir.join(file_name),
        });
    }

    let md_posts: Vec<PathBuf> = post_list.retrieve_files()?;
    for post_file in md_posts {
        let Some(link) = post_file.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };
        posts.push(PostLink {
            link: link.to_string(),
            path: post_file.clone(),
        });
    }

    Ok(posts)
}

pub fn read_template(tpl_dir: &Path, file_name: &str) -> io::Result<String> {
    let full_path = tpl_dir.join(file_name);
    fs::read_to_string(full_path)
}

/// True when a request segment would land outside the directory it is
/// joined onto. A substring test misses a bare ".." segment, so the
/// path components are walked instead. Absolute segments are rejected
/// too, since join replaces the whole path with those.
pub fn escapes_root(segment: &str) -> bool {
    let path = Path::new(segment);
    path.has_root()
        || path
            .components()
            .any(|component| matches!(component, Component::ParentDir))
}

pub fn get_file(root_dir: &Path, post: String, file: String) -> Result<NamedFile, Error> {
    if escapes_root(&post) || escapes_root(&file) {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = root_dir.join(post).join(file);
    Ok(NamedFile::open(file_path)?)
}

pub struct CorpusStats {
    pub post_count: i64,
    pub category_count: i64,
    pub days_since_first_post: i64,
}

pub fn corpus_stats(listing: &PostListing) -> CorpusStats {
    let first_post = listing
        .contents
        .iter()
        .map(|content| content.front_matter.date)
        .min();
    let days_since_first_post = match first_post {
        Some(first) => Utc::now().signed_duration_since(first).num_days(),
        None => 0,
    };

    CorpusStats {
        post_count: listing.contents.len() as i64,
        category_count: listing.categories.len() as i64,
        days_since_first_post,
    }
}

pub fn render_index(config: &Config, stats: &CorpusStats) -> io::Result<String> {
    let tpl_dir = &config.paths.template_dir;
    let index_tpl_src: String = match read_template(tpl_dir, "index.tpl") {
        Ok(s) => s,
        Err(e) => {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("Error loading index template: {}", e),
            ));
        }
    };

    let index_tpl = match Template::new(index_tpl_src) {
        Ok(x) => x,
        Err(e) => {
            return Err(io::Error::new(
                ErrorKind::InvalidInput,
                format!("Error parsing index template: {}", e),
            ));
        }
    };

    let rendered = index_tpl.render(&IndexPage {
        site_title: config.site.title.as_str(),
        site_description: config.site.description.as_str(),
        post_count: stats.post_count,
        category_count: stats.category_count,
        days_since_first_post: stats.days_since_first_post,
    });

    Ok(rendered)
}

/// Renders the full page for one post. The template comes from the post's
/// layout field, so `layout: recipe` looks for `recipe.tpl`.
pub fn open_content(
    config: &Config,
    link_to_files: &HashMap<String, PathBuf>,
    link: &str,
) -> io::Result<String> {
    let content_path = match link_to_files.get(link) {
        None => return Err(io::Error::new(ErrorKind::NotFound, "Could not find post")),
        Some(path) => path,
    }
    .clone();

    let content_file = ContentFile::from_file(link.to_string(), content_path)?;
    let content = MarkdownRenderer::render(&content_file, RenderMode::Full)?;

    let template_name = format!("{}.tpl", content.front_matter.layout);
    let template_src = read_template(&config.paths.template_dir, &template_name).map_err(|e| {
        io::Error::new(
            ErrorKind::NotFound,
            format!(
                "Error loading layout template {}: {}",
                template_name, e
            ),
        )
    })?;

    let post_renderer = PostRenderer::new(&template_src)?;
    Ok(post_renderer.render(&content))
}

pub fn get_cur_page(req: &HttpRequest) -> u32 {
    if let Some(query_str) = req.uri().query() {
        let qs = QueryString::from(query_str);
        qs.get_page()
    } else {
        1
    }
}

pub struct PostListing {
    pub contents: Vec<Arc<Content>>,
    pub categories: CategoryIndex,
}

/// Renders (or fetches cached) previews for every post. Category counts
/// cover the whole corpus even when a filter is applied, so the sidebar
/// stays complete. A post that fails to parse is logged and skipped
/// rather than taking the whole listing down.
pub fn load_previews(
    cache: &mut RenderCache<Content>,
    link_to_files: &HashMap<String, PathBuf>,
    category_filter: Option<&str>,
    preview: &PreviewLimit,
) -> io::Result<PostListing> {
    let mut contents = vec![];
    let mut categories = CategoryIndex::new();

    for (post_link, content_path) in link_to_files.iter() {
        let key = format!("preview-{}", post_link);
        let content = cache.get_or(&key, Expire::Never, || {
            info!("Rendering post preview from file for {}", post_link);
            let content_file = ContentFile::from_file(post_link.clone(), content_path.clone())?;
            let asset_prefix = AssetPrefix(format!("/view/{}", post_link));
            MarkdownRenderer::render(
                &content_file,
                RenderMode::Preview(preview.clone(), asset_prefix),
            )
        });
        let content = match content {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping unreadable post {}: {}", post_link, e);
                continue;
            }
        };

        categories.add_post(&content.front_matter.categories);

        match category_filter {
            None => contents.push(content),
            Some(filter) => {
                if content.front_matter.categories.iter().any(|c| c == filter) {
                    contents.push(content);
                }
            }
        };
    }

    Ok(PostListing {
        contents,
        categories,
    })
}

pub fn render_list(
    config: &Config,
    listing: PostListing,
    cur_page: u32,
    link_style: &PageLinkStyle,
) -> io::Result<String> {
    let categories = listing.categories;
    let mut contents = listing.contents;

    // Newest first
    contents.sort_by(|a, b| b.front_matter.date.cmp(&a.front_matter.date));

    let page_size = config.defaults.page_size;
    let paginator = Paginator::from(&contents, page_size);
    let cur_page = match cur_page {
        // Sanity check for current page
        0 => 1,
        x if x > paginator.page_count() => 1,
        x => x,
    };

    let template_src = read_template(&config.paths.template_dir, "postlist.tpl")?;
    let list_renderer = ListRenderer::new(&template_src, paginator.page_count())?;

    let content_page = match paginator.get_page(cur_page) {
        Ok(content) => content,
        Err(err_desc) => {
            if paginator.page_count() == 0 {
                // An empty blog still gets its listing page
                &[]
            } else {
                return Err(io::Error::new(ErrorKind::InvalidInput, err_desc));
            }
        }
    };

    Ok(list_renderer.render(content_page, cur_page, &categories, link_style))
}

/// RSS feed over the newest previews.
pub fn render_feed(config: &Config, listing: &PostListing) -> io::Result<Vec<u8>> {
    let feed = match config.feed {
        Some(ref feed) => feed,
        None => {
            return Err(io::Error::new(
                ErrorKind::NotFound,
                "Feed is not configured",
            ))
        }
    };

    let mut contents = listing.contents.clone();
    contents.sort_by(|a, b| b.front_matter.date.cmp(&a.front_matter.date));
    contents.truncate(feed.page_size as usize);

    let channel = RssChannel {
        ch_title: config.site.title.as_str(),
        ch_link: config.site.base_url.as_str(),
        ch_desc: config.site.description.as_str(),
    };
    channel
        .render(&contents)
        .map_err(|e| io::Error::new(ErrorKind::InvalidData, format!("Error rendering feed: {}", e)))
}
