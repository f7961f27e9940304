use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{env, fs, io};

use serde::Deserialize;

use crate::content::markdown_renderer::PreviewLimit;

#[derive(Deserialize)]
pub struct Site {
    pub title: String,
    /// Public address of the blog, used for feed links.
    pub base_url: String,
    pub description: String,
}

#[derive(Deserialize)]
pub struct Paths {
    pub template_dir: PathBuf,
    pub public_dir: PathBuf,
    pub posts_dir: PathBuf,
    /// Where `build` writes the static site.
    pub output_dir: PathBuf,
}

#[derive(Deserialize)]
pub struct Defaults {
    pub index_base_name: Option<String>,
    pub page_size: u32,
    pub preview_break_tag: Option<String>,
    pub preview_max_lines: Option<usize>,
    pub rendering_cache_enabled: bool,
}

#[derive(Deserialize)]
pub struct Server {
    pub address: String,
    pub port: u16,
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct Metrics {
    pub location: Option<PathBuf>,
    pub time_slot_secs: Option<i64>,
}

#[derive(Deserialize)]
pub struct Feed {
    pub page_size: u32,
}

#[derive(Deserialize)]
pub struct Config {
    pub site: Site,
    pub paths: Paths,
    pub defaults: Defaults,
    pub server: Server,
    pub log: Option<Log>,
    pub metrics: Option<Metrics>,
    pub feed: Option<Feed>,
}

impl Config {
    pub fn index_base(&self) -> &str {
        self.defaults
            .index_base_name
            .as_deref()
            .unwrap_or("index")
    }

    pub fn preview_limit(&self) -> PreviewLimit {
        let mut limit = PreviewLimit::default();
        if let Some(ref break_tag) = self.defaults.preview_break_tag {
            limit.break_tag = break_tag.clone();
        }
        limit.max_lines = self.defaults.preview_max_lines;
        limit
    }
}

fn parse_path(path: PathBuf) -> io::Result<PathBuf> {
    if path.starts_with("${exe_dir}") {
        let cur_exe = env::current_exe()?;
        let exe_dir = cur_exe
            .parent()
            .and_then(Path::to_str)
            .ok_or_else(|| io::Error::new(ErrorKind::NotFound, "Could not resolve ${exe_dir}"))?;
        let str_path = path.to_string_lossy().replace("${exe_dir}", exe_dir);
        Ok(PathBuf::from(str_path))
    } else {
        Ok(path)
    }
}

pub fn read_config(cfg_path: &Path) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => {
            return Err(io::Error::new(
                e.kind(),
                format!(
                    "Error opening configuration file {}: {}",
                    cfg_path.display(),
                    e
                ),
            ))
        }
    };

    let mut cfg: Config = match toml::from_str::<Config>(cfg_content.as_str()) {
        Ok(cfg) => cfg,
        Err(e) => {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!("Error parsing configuration file: {}", e),
            ))
        }
    };

    cfg.paths = Paths {
        template_dir: parse_path(cfg.paths.template_dir)?,
        public_dir: parse_path(cfg.paths.public_dir)?,
        posts_dir: parse_path(cfg.paths.posts_dir)?,
        output_dir: parse_path(cfg.paths.output_dir)?,
    };

    Ok(cfg)
}
