use std::fmt::Write;
use std::io;
use std::io::ErrorKind;
use std::path::Path;
use std::str::Lines;

use chrono::{DateTime, FixedOffset};
use lazy_static::lazy_static;
use regex::Regex;

pub const DEFAULT_LAYOUT: &str = "post";

/// Format used whenever a date is written back out. `%z` prints the offset
/// the post was written in, so round trips keep the author's timezone.
pub const CANONICAL_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

const DELIMITER: &str = "---";

const DATE_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z"];

/// Parsed post metadata. Field meanings:
/// - layout: template base name, defaults to "post"
/// - date: publication date with an explicit UTC offset
/// - categories: free-form labels, order as written
#[derive(Debug, Clone, PartialEq)]
pub struct FrontMatter {
    pub layout: String,
    pub title: String,
    pub date: DateTime<FixedOffset>,
    pub categories: Vec<String>,
    pub author: String,
}

/// Front matter as written in the file, before field validation.
/// Keeps every key (known or not) with its source line so diagnostics
/// can point at the exact spot.
#[derive(Debug, Default, PartialEq)]
pub struct RawFrontMatter {
    pub fields: Vec<RawField>,
    /// Lines consumed from the top of the file, delimiters included.
    pub line_count: usize,
}

#[derive(Debug, PartialEq)]
pub struct RawField {
    pub key: String,
    pub value: String,
    /// 1-based line in the source file.
    pub line: usize,
}

impl RawFrontMatter {
    pub fn get(&self, key: &str) -> Option<&RawField> {
        self.fields.iter().find(|field| field.key == key)
    }
}

/// Consumes the front matter block from the top of a post. The opening
/// delimiter has to be the first non-blank line. Returns the raw fields and
/// the iterator positioned at the first body line.
pub fn scan_front_matter<'a>(
    file_name: &Path,
    mut lines: Lines<'a>,
) -> io::Result<(RawFrontMatter, Lines<'a>)> {
    let mut line_no: usize = 0;

    let found_open = loop {
        match lines.next() {
            Some(line) => {
                line_no += 1;
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                break line == DELIMITER;
            }
            None => break false,
        }
    };

    if !found_open {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            format!("Post has no front matter block: {}", file_name.display()),
        ));
    }

    let mut fields = vec![];
    loop {
        let Some(line) = lines.next() else {
            return Err(io::Error::new(
                ErrorKind::InvalidData,
                format!(
                    "Front matter closing delimiter not found: {}",
                    file_name.display()
                ),
            ));
        };
        line_no += 1;
        let trimmed = line.trim();
        if trimmed == DELIMITER {
            break;
        }
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match split_field(trimmed) {
            Some((key, value)) => fields.push(RawField {
                key: key.to_string(),
                value: value.to_string(),
                line: line_no,
            }),
            None => {
                return Err(io::Error::new(
                    ErrorKind::InvalidData,
                    format!(
                        "Malformed front matter at line {} of {}: {}",
                        line_no,
                        file_name.display(),
                        trimmed
                    ),
                ));
            }
        }
    }

    Ok((
        RawFrontMatter {
            fields,
            line_count: line_no,
        },
        lines,
    ))
}

fn split_field(line: &str) -> Option<(&str, &str)> {
    lazy_static! {
        static ref FIELD_RE: Regex =
            Regex::new(r"^(?P<key>[A-Za-z][\w-]*)\s*:\s?(?P<value>.*)$").unwrap();
    }
    let captures = FIELD_RE.captures(line)?;
    let key = captures.name("key")?.as_str();
    let value = captures.name("value")?.as_str().trim();
    Some((key, value))
}

impl FrontMatter {
    /// Validates the raw fields into typed metadata. Title, date and author
    /// are required. Unknown keys are ignored here - the checker reports them.
    pub fn from_raw(file_name: &Path, raw: &RawFrontMatter) -> io::Result<FrontMatter> {
        let title = required_field(file_name, raw, "title")?;
        let author = required_field(file_name, raw, "author")?;

        let date_field = raw.get("date").ok_or_else(|| missing_field(file_name, "date"))?;
        let date = parse_offset_date(&date_field.value).map_err(|e| {
            io::Error::new(
                ErrorKind::InvalidData,
                format!("{}: {}", file_name.display(), e),
            )
        })?;

        let categories = raw
            .get("categories")
            .map(|field| split_categories(&field.value))
            .unwrap_or_default();

        let layout = raw
            .get("layout")
            .map(|field| strip_quotes(&field.value).to_string())
            .filter(|layout| !layout.is_empty())
            .unwrap_or_else(|| DEFAULT_LAYOUT.to_string());

        Ok(FrontMatter {
            layout,
            title,
            date,
            categories,
            author,
        })
    }

    /// Scans and validates in one go, handing back the body lines.
    pub fn parse<'a>(
        file_name: &Path,
        lines: Lines<'a>,
    ) -> io::Result<(FrontMatter, Lines<'a>)> {
        let (raw, rest) = scan_front_matter(file_name, lines)?;
        let front_matter = FrontMatter::from_raw(file_name, &raw)?;
        Ok((front_matter, rest))
    }
}

fn missing_field(file_name: &Path, field: &str) -> io::Error {
    io::Error::new(
        ErrorKind::InvalidData,
        format!(
            "Front matter is missing the {} field: {}",
            field,
            file_name.display()
        ),
    )
}

/// A present but blank field is reported separately from a missing one.
fn required_field(file_name: &Path, raw: &RawFrontMatter, field: &str) -> io::Result<String> {
    let raw_field = raw
        .get(field)
        .ok_or_else(|| missing_field(file_name, field))?;
    let value = strip_quotes(&raw_field.value);
    if value.is_empty() {
        return Err(io::Error::new(
            ErrorKind::InvalidData,
            format!(
                "Front matter field {} is empty: {}",
                field,
                file_name.display()
            ),
        ));
    }
    Ok(value.to_string())
}

/// Dates must carry an explicit UTC offset. A bare local time would render
/// differently depending on where the site is built, so it is rejected.
pub fn parse_offset_date(buf: &str) -> Result<DateTime<FixedOffset>, String> {
    let buf = buf.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = DateTime::parse_from_str(buf, format) {
            return Ok(date);
        }
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(buf) {
        return Ok(date);
    }
    Err(format!(
        "Unable to parse date {:?}. Expected e.g. \"2024-04-22 10:05:00 -0300\" or RFC 3339 with an offset",
        buf
    ))
}

pub fn split_categories(value: &str) -> Vec<String> {
    value.split_whitespace().map(str::to_string).collect()
}

pub fn strip_quotes(value: &str) -> &str {
    let stripped = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')));
    stripped.unwrap_or(value)
}

/// Writes metadata back as a front matter block, canonical field order.
/// Parsing the result yields the same FrontMatter.
pub fn render_front_matter(front_matter: &FrontMatter) -> String {
    let mut buf = String::new();
    let _ = writeln!(buf, "{}", DELIMITER);
    let _ = writeln!(buf, "layout: {}", front_matter.layout);
    let _ = writeln!(buf, "title: {}", front_matter.title);
    let _ = writeln!(buf, "date: {}", front_matter.date.format(CANONICAL_DATE_FORMAT));
    if !front_matter.categories.is_empty() {
        let _ = writeln!(buf, "categories: {}", front_matter.categories.join(" "));
    }
    let _ = writeln!(buf, "author: {}", front_matter.author);
    let _ = writeln!(buf, "{}", DELIMITER);
    buf
}
