use std::path::{Path, PathBuf};
use std::{fs, io};

use crate::content::content_file::is_markdown;

pub struct PostList {
    pub root_dir: PathBuf,
    /// Base name of the post file expected inside a post directory,
    /// usually "index".
    pub index_base: String,
}

impl PostList {
    /// Markdown files sitting directly in the posts directory. Each one is a
    /// standalone post with no sibling assets.
    pub fn retrieve_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut posts = vec![];
        let entries = fs::read_dir(self.root_dir.as_path())?;
        for entry in entries {
            if let Ok(entry) = entry {
                if let Ok(file_type) = entry.file_type() {
                    if !file_type.is_file() {
                        continue;
                    }
                    if is_markdown(&entry.path()) {
                        posts.push(entry.path());
                    }
                }
            }
        }
        Ok(posts)
    }

    /// Subdirectories holding an index post file. Returns the directory and
    /// the name of the post file found inside it.
    pub fn retrieve_dirs(&self) -> io::Result<Vec<(PathBuf, String)>> {
        let dirs = Self::list_dirs(self.root_dir.as_path())?;
        let post_dirs = Self::filter_dirs(&self.index_base, dirs);
        Ok(post_dirs)
    }

    fn list_dirs(posts_dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut dirs: Vec<PathBuf> = vec![];
        let entries = fs::read_dir(posts_dir)?;
        for entry in entries {
            if let Ok(path) = entry {
                if let Ok(file_type) = path.file_type() {
                    if file_type.is_dir() {
                        dirs.push(path.path());
                    }
                }
            }
        }
        Ok(dirs)
    }

    fn filter_dirs(index_base: &str, dirs: Vec<PathBuf>) -> Vec<(PathBuf, String)> {
        let mut post_dirs = vec![];
        for dir in dirs {
            if let Ok(Some(file_name)) = Self::index_file(&dir, index_base) {
                post_dirs.push((dir, file_name));
            }
        }
        post_dirs
    }

    fn index_file(dir: &Path, index_base: &str) -> io::Result<Option<String>> {
        let entries = fs::read_dir(dir)?;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let stem_matches = path
                .file_stem()
                .map(|stem| stem == index_base)
                .unwrap_or(false);
            if stem_matches && is_markdown(&path) {
                if let Some(file_name) = entry.file_name().to_str() {
                    return Ok(Some(file_name.to_string()));
                }
            }
        }

        Ok(None)
    }
}
