use std::path::PathBuf;

use crate::content::front_matter::FrontMatter;

pub mod content_file;
pub mod front_matter;
pub mod html_meta;
pub mod markdown_renderer;

/// One post after rendering: parsed metadata plus the HTML body.
pub struct Content {
    pub front_matter: FrontMatter,
    pub link: String,
    pub file_path: PathBuf,
    pub rendered: String,
}
