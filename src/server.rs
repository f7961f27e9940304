use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::io;
use std::sync::{Arc, Mutex};

use chrono::Duration;
use ntex::web;
use ntex::web::HttpRequest;
use ntex_files::NamedFile;
use spdlog::{info, warn};

use crate::config::Config;
use crate::content::Content;
use crate::metrics::{MetricHandler, MetricSender, MetricWriter};
use crate::post_processor::{
    corpus_stats, escapes_root, get_cur_page, get_file, list_post_files, load_previews,
    open_content, render_feed, render_index, render_list, PostLink,
};
use crate::render_cache::{Expire, RenderCache};
use crate::view::list_renderer::PageLinkStyle;

const DEFAULT_TIME_SLOT_SECS: i64 = 60;

struct AppState {
    post_links: HashMap<String, PathBuf>,
    config: Config,
    preview_cache: Mutex<RenderCache<Content>>,
    page_cache: Mutex<RenderCache<String>>,
    metrics: MetricSender,
    _metric_handler: Option<MetricHandler>,
}

fn request_origin(req: &HttpRequest) -> String {
    req.headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

// Begin: Redirect region --------
#[web::get("/view/{post}")]
async fn view_wo_slash(path: web::types::Path<String>) -> web::HttpResponse {
    web::HttpResponse::TemporaryRedirect()
        .header("Location", path.into_inner() + "/")
        .content_type("text/html; charset=utf-8")
        .finish()
}

#[web::get("/list/{category}")]
async fn list_wo_slash(path: web::types::Path<String>) -> web::HttpResponse {
    web::HttpResponse::TemporaryRedirect()
        .header("Location", path.into_inner() + "/")
        .content_type("text/html; charset=utf-8")
        .finish()
}
// End: Redirect region --------

#[web::get("/view/{post}/")]
async fn view(
    req: HttpRequest,
    path: web::types::Path<String>,
    state: web::types::State<Arc<AppState>>,
) -> web::HttpResponse {
    let link = path.into_inner();

    // The guard stays inside this block so it is released before any await
    let rendered = {
        let mut cache = state.page_cache.lock().unwrap();
        cache.get_or(&format!("page-{}", link), Expire::Never, || {
            info!("Rendering full page from file for {}", link);
            open_content(&state.config, &state.post_links, &link)
        })
    };

    let rendered = match rendered {
        Ok(page) => page,
        Err(e) => {
            return web::HttpResponse::NotFound()
                .body(format!("Error loading post {}: {}", link, e));
        }
    };

    state.metrics.view(link, request_origin(&req)).await;

    web::HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body((*rendered).clone())
}

fn render_listing(state: &AppState, category: Option<&str>, cur_page: u32) -> io::Result<String> {
    let mut cache = state.preview_cache.lock().unwrap();
    let listing = load_previews(
        &mut cache,
        &state.post_links,
        category,
        &state.config.preview_limit(),
    )?;
    drop(cache);

    render_list(&state.config, listing, cur_page, &PageLinkStyle::Query)
}

#[web::get("/list")]
async fn list(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let cur_page: u32 = get_cur_page(&req);
    let post_list = match render_listing(&state, None, cur_page) {
        Ok(posts) => posts,
        Err(e) => {
            return web::HttpResponse::InternalServerError()
                .body(format!("Error listing posts: {}", e));
        }
    };

    state.metrics.list(None, request_origin(&req)).await;

    web::HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(post_list)
}

#[web::get("/list/{category}/")]
async fn list_with_category(
    req: HttpRequest,
    path: web::types::Path<String>,
    state: web::types::State<Arc<AppState>>,
) -> web::HttpResponse {
    let category = path.into_inner();

    let cur_page: u32 = get_cur_page(&req);
    let post_list = match render_listing(&state, Some(&category), cur_page) {
        Ok(posts) => posts,
        Err(e) => {
            return web::HttpResponse::InternalServerError()
                .body(format!("Error listing posts: {}", e));
        }
    };

    state.metrics.list(Some(category), request_origin(&req)).await;

    web::HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(post_list)
}

#[web::get("/view/{post}/{file}")]
async fn post_files(
    path: web::types::Path<(String, String)>,
    state: web::types::State<Arc<AppState>>,
) -> Result<NamedFile, web::Error> {
    let (post, file) = path.into_inner();
    get_file(&state.config.paths.posts_dir, post, file)
}

#[web::get("/public/{file_name}")]
async fn public_files(
    path: web::types::Path<String>,
    state: web::types::State<Arc<AppState>>,
) -> Result<NamedFile, web::Error> {
    if escapes_root(&path) {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = state.config.paths.public_dir.join(path.into_inner());

    Ok(NamedFile::open(file_path)?)
}

#[web::get("/rss")]
async fn rss(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let feed = {
        let mut cache = state.preview_cache.lock().unwrap();
        load_previews(
            &mut cache,
            &state.post_links,
            None,
            &state.config.preview_limit(),
        )
        .and_then(|listing| render_feed(&state.config, &listing))
    };

    let feed = match feed {
        Ok(xml) => xml,
        Err(e) => {
            return web::HttpResponse::NotFound().body(format!("Error rendering feed: {}", e));
        }
    };

    state.metrics.feed(request_origin(&req)).await;

    web::HttpResponse::Ok()
        .content_type("application/rss+xml; charset=utf-8")
        .body(feed)
}

#[web::get("/")]
async fn index(req: HttpRequest, state: web::types::State<Arc<AppState>>) -> web::HttpResponse {
    let rendered = {
        let mut cache = state.preview_cache.lock().unwrap();
        load_previews(
            &mut cache,
            &state.post_links,
            None,
            &state.config.preview_limit(),
        )
        .and_then(|listing| render_index(&state.config, &corpus_stats(&listing)))
    };

    let response = match rendered {
        Ok(rendered) => web::HttpResponse::Ok()
            .content_type("text/html; charset=utf-8")
            .body(rendered),
        Err(e) => {
            return web::HttpResponse::InternalServerError()
                .body(format!("Error rendering index: {}", e));
        }
    };

    state.metrics.index(request_origin(&req)).await;

    response
}

fn start_metrics(config: &Config) -> Option<MetricHandler> {
    let metrics = config.metrics.as_ref()?;
    let location = match metrics.location {
        Some(ref location) => location,
        None => {
            warn!("Metrics have no location configured, not recording");
            return None;
        }
    };

    let time_slot = Duration::seconds(metrics.time_slot_secs.unwrap_or(DEFAULT_TIME_SLOT_SECS));
    match MetricWriter::new(location, time_slot) {
        Ok(writer) => Some(MetricHandler::new(writer)),
        Err(e) => {
            warn!("Could not start metrics writer: {}", e);
            None
        }
    }
}

pub async fn server_run(config: Config) -> io::Result<()> {
    // List post files and generate list of link -> post file
    let post_link_vec: Vec<PostLink> =
        list_post_files(&config.paths.posts_dir, config.index_base()).map_err(|e| {
            io::Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Error listing posts: {}. Dir={}",
                    e,
                    config.paths.posts_dir.display()
                ),
            )
        })?;
    for post in post_link_vec.iter() {
        info!("Post: {}", post.link);
    }

    let post_links: HashMap<_, _> = post_link_vec
        .into_iter()
        .map(|post| (post.link, post.path))
        .collect();

    let metric_handler = start_metrics(&config);
    let metrics = match metric_handler {
        Some(ref handler) => handler.new_sender(),
        None => MetricHandler::no_op(),
    };

    let (preview_cache, page_cache) = if config.defaults.rendering_cache_enabled {
        (RenderCache::new(), RenderCache::new())
    } else {
        (RenderCache::disabled(), RenderCache::disabled())
    };

    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    let app_state = Arc::new(AppState {
        post_links,
        config,
        preview_cache: Mutex::new(preview_cache),
        page_cache: Mutex::new(page_cache),
        metrics,
        _metric_handler: metric_handler,
    });

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .service(index)
            .service(public_files)
            .service(list)
            .service(list_with_category)
            .service(list_wo_slash)
            .service(view)
            .service(view_wo_slash)
            .service(post_files)
            .service(rss)
    })
    .bind((bind_addr, bind_port))?
    .run()
    .await
}
