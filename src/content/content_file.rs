use std::ffi::OsStr;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fs, io};

pub struct ContentFile {
    pub link: String,
    pub file_path: PathBuf,
    pub raw_content: String,
}

impl ContentFile {
    pub fn from_file(link: String, file_path: PathBuf) -> io::Result<ContentFile> {
        if !is_markdown(&file_path) {
            return Err(io::Error::new(
                ErrorKind::Unsupported,
                format!("Not a markdown post: {}", file_path.display()),
            ));
        }

        let raw_content = fs::read_to_string(&file_path)?;

        Ok(ContentFile {
            link,
            file_path,
            raw_content,
        })
    }
}

pub fn is_markdown(file_name: &Path) -> bool {
    matches!(
        file_name.extension().and_then(OsStr::to_str),
        Some("md") | Some("markdown")
    )
}
