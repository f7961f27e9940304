use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use markdown::mdast::Node;
use markdown::ParseOptions;
use regex::Regex;

use crate::content::front_matter::{parse_offset_date, scan_front_matter, strip_quotes, RawFrontMatter, DEFAULT_LAYOUT};
use crate::post_processor::list_post_files;

const KNOWN_KEYS: &[&str] = &["layout", "title", "date", "categories", "author"];

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Issue {
    pub severity: Severity,
    /// 1-based line in the post source, when the issue points at one.
    pub line: Option<usize>,
    pub message: String,
}

impl Issue {
    fn error(line: Option<usize>, message: String) -> Issue {
        Issue {
            severity: Severity::Error,
            line,
            message,
        }
    }

    fn warning(line: Option<usize>, message: String) -> Issue {
        Issue {
            severity: Severity::Warning,
            line,
            message,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{} line {}: {}", self.severity, line, self.message),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

pub struct FileReport {
    pub file: PathBuf,
    pub issues: Vec<Issue>,
}

impl FileReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.severity == Severity::Error)
            .count()
    }
}

pub fn has_errors(reports: &[FileReport]) -> bool {
    reports.iter().any(|report| report.error_count() > 0)
}

/// Checks every post under the posts directory. When a template directory
/// is given, layouts are verified against the templates on disk too.
pub fn check_posts(
    posts_dir: &Path,
    index_base: &str,
    template_dir: Option<&Path>,
) -> anyhow::Result<Vec<FileReport>> {
    let posts = list_post_files(posts_dir, index_base)?;

    let mut reports = vec![];
    for post in posts {
        let issues = match fs::read_to_string(&post.path) {
            Ok(source) => check_post_source(&post.path, &source, template_dir),
            Err(e) => vec![Issue::error(None, format!("Could not read file: {}", e))],
        };
        reports.push(FileReport {
            file: post.path,
            issues,
        });
    }
    reports.sort_by(|a, b| a.file.cmp(&b.file));

    Ok(reports)
}

pub fn check_post_source(
    file: &Path,
    source: &str,
    template_dir: Option<&Path>,
) -> Vec<Issue> {
    let mut issues = vec![];

    let (raw, body_lines) = match scan_front_matter(file, source.lines()) {
        Ok(x) => x,
        Err(e) => {
            issues.push(Issue::error(None, e.to_string()));
            return issues;
        }
    };

    check_fields(&raw, template_dir, &mut issues);

    let body_lines: Vec<&str> = body_lines.collect();
    let body = body_lines.join("\n");
    check_body(&body, &body_lines, raw.line_count, &mut issues);

    issues
}

fn check_fields(raw: &RawFrontMatter, template_dir: Option<&Path>, issues: &mut Vec<Issue>) {
    for required in ["title", "date", "author"] {
        match raw.get(required) {
            None => issues.push(Issue::error(
                None,
                format!("Missing required front matter field: {}", required),
            )),
            Some(field) if strip_quotes(&field.value).is_empty() => issues.push(Issue::error(
                Some(field.line),
                format!("Front matter field {} is empty", required),
            )),
            Some(_) => {}
        }
    }

    if let Some(field) = raw.get("date") {
        if let Err(reason) = parse_offset_date(&field.value) {
            issues.push(Issue::error(Some(field.line), reason));
        }
    }

    if let Some(field) = raw.get("categories") {
        let mut seen = HashSet::new();
        for token in field.value.split_whitespace() {
            if !token
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            {
                issues.push(Issue::error(
                    Some(field.line),
                    format!("Category {:?} is not a lowercase alphanumeric token", token),
                ));
            }
            if !seen.insert(token) {
                issues.push(Issue::error(
                    Some(field.line),
                    format!("Duplicate category {:?}", token),
                ));
            }
        }
    }

    let mut seen_keys = HashSet::new();
    for field in &raw.fields {
        if !seen_keys.insert(field.key.as_str()) {
            issues.push(Issue::warning(
                Some(field.line),
                format!("Duplicate front matter key {:?}, the first one wins", field.key),
            ));
        }
        if !KNOWN_KEYS.contains(&field.key.as_str()) {
            issues.push(Issue::warning(
                Some(field.line),
                format!("Unknown front matter key {:?}", field.key),
            ));
        }
    }

    if let Some(template_dir) = template_dir {
        let layout_field = raw.get("layout");
        let layout = layout_field
            .map(|field| strip_quotes(&field.value))
            .filter(|layout| !layout.is_empty())
            .unwrap_or(DEFAULT_LAYOUT);
        let template = template_dir.join(format!("{}.tpl", layout));
        if !template.is_file() {
            issues.push(Issue::warning(
                layout_field.map(|field| field.line),
                format!("Layout template {}.tpl not found", layout),
            ));
        }
    }
}

fn check_body(body: &str, body_lines: &[&str], line_offset: usize, issues: &mut Vec<Issue>) {
    let tree = match markdown::to_mdast(body, &ParseOptions::gfm()) {
        Ok(tree) => tree,
        Err(e) => {
            issues.push(Issue::error(None, format!("Markdown parse error: {}", e.reason)));
            return;
        }
    };
    walk(&tree, body_lines, line_offset, issues);
}

fn walk(node: &Node, body_lines: &[&str], line_offset: usize, issues: &mut Vec<Issue>) {
    // Positions are relative to the body, the offset maps them back to the
    // source file.
    let source_line = |position: &Option<markdown::unist::Position>| {
        position.as_ref().map(|p| p.start.line + line_offset)
    };

    match node {
        Node::Code(code) => {
            let fenced = code
                .position
                .as_ref()
                .and_then(|p| body_lines.get(p.start.line - 1))
                .map(|line| is_fence_line(line))
                .unwrap_or(false);
            if fenced && code.lang.as_deref().unwrap_or("").is_empty() {
                issues.push(Issue::error(
                    source_line(&code.position),
                    "Fenced code block has no language tag".to_string(),
                ));
            }
        }
        Node::Link(link) => {
            if let Some(reason) = check_url(&link.url) {
                issues.push(Issue::error(
                    source_line(&link.position),
                    format!("Invalid link target {:?}: {}", link.url, reason),
                ));
            }
        }
        Node::Image(image) => {
            if let Some(reason) = check_url(&image.url) {
                issues.push(Issue::error(
                    source_line(&image.position),
                    format!("Invalid image target {:?}: {}", image.url, reason),
                ));
            }
        }
        Node::Definition(definition) => {
            if let Some(reason) = check_url(&definition.url) {
                issues.push(Issue::error(
                    source_line(&definition.position),
                    format!(
                        "Invalid link definition target {:?}: {}",
                        definition.url, reason
                    ),
                ));
            }
        }
        _ => {}
    }

    if let Some(children) = node.children() {
        for child in children {
            walk(child, body_lines, line_offset, issues);
        }
    }
}

fn is_fence_line(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("```") || trimmed.starts_with("~~~")
}

/// A target is fine when it is either an absolute URL with a scheme and a
/// non-empty remainder, or a relative reference. Whitespace, control
/// characters and angle brackets are rejected outright.
fn check_url(url: &str) -> Option<String> {
    if url.is_empty() {
        return Some("empty target".to_string());
    }
    if url.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Some("contains whitespace or control characters".to_string());
    }
    if url.contains('<') || url.contains('>') {
        return Some("contains angle brackets".to_string());
    }

    lazy_static! {
        static ref SCHEME_RE: Regex =
            Regex::new(r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*):(?P<rest>.*)$").unwrap();
    }
    if let Some(captures) = SCHEME_RE.captures(url) {
        let rest = &captures["rest"];
        if rest.is_empty() {
            return Some("nothing after the scheme".to_string());
        }
        if let Some(authority) = rest.strip_prefix("//") {
            let host_end = authority
                .find(|c| c == '/' || c == '?' || c == '#')
                .unwrap_or(authority.len());
            if host_end == 0 {
                return Some("empty host".to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::Write;

    use tempfile::tempdir;

    use super::*;

    fn check(source: &str) -> Vec<Issue> {
        check_post_source(Path::new("posts/test/index.md"), source, None)
    }

    fn errors(issues: &[Issue]) -> usize {
        issues.iter().filter(|i| i.severity == Severity::Error).count()
    }

    #[test]
    fn test_clean_post() {
        let source = "---\ntitle: T\ndate: 2024-01-02 03:04:05 +0000\nauthor: A\ncategories: rust cooking\n---\n\nA paragraph with a [link](https://example.com/x).\n\n```rust\nlet x = 1;\n```\n";
        let issues = check(source);
        println!("{:?}", issues);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_missing_fields() {
        let source = "---\ntitle: T\n---\nBody";
        let issues = check(source);
        assert_eq!(errors(&issues), 2);
        assert!(issues.iter().any(|i| i.message.contains("date")));
        assert!(issues.iter().any(|i| i.message.contains("author")));
    }

    #[test]
    fn test_date_without_offset() {
        let source = "---\ntitle: T\ndate: 2024-01-02 03:04:05\nauthor: A\n---\nBody";
        let issues = check(source);
        assert_eq!(errors(&issues), 1);
        assert_eq!(issues[0].line, Some(3));
    }

    #[test]
    fn test_category_tokens() {
        let source = "---\ntitle: T\ndate: 2024-01-02 03:04:05 +0000\nauthor: A\ncategories: Rust rust rust\n---\nBody";
        let issues = check(source);
        // "Rust" is not lowercase, "rust" appears twice
        assert_eq!(errors(&issues), 2);
        assert!(issues.iter().any(|i| i.message.contains("not a lowercase")));
        assert!(issues.iter().any(|i| i.message.contains("Duplicate category")));
    }

    #[test]
    fn test_unknown_and_duplicate_keys_are_warnings() {
        let source =
            "---\ntitle: T\ntitle: Again\ndate: 2024-01-02 03:04:05 +0000\nauthor: A\nsummary: hand written\n---\nBody";
        let issues = check(source);
        assert_eq!(errors(&issues), 0);
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.severity == Severity::Warning));
        assert_eq!(issues[0].line, Some(3));
        assert_eq!(issues[1].line, Some(6));
    }

    #[test]
    fn test_fenced_code_without_language() {
        let source =
            "---\ntitle: T\ndate: 2024-01-02 03:04:05 +0000\nauthor: A\n---\n\n```\nlet x = 1;\n```\n";
        let issues = check(source);
        assert_eq!(errors(&issues), 1);
        assert!(issues[0].message.contains("language tag"));
        // fence opens on line 7 of the file
        assert_eq!(issues[0].line, Some(7));
    }

    #[test]
    fn test_indented_code_is_not_flagged() {
        let source =
            "---\ntitle: T\ndate: 2024-01-02 03:04:05 +0000\nauthor: A\n---\n\nSome text:\n\n    indented code\n";
        let issues = check(source);
        assert!(issues.is_empty());
    }

    #[test]
    fn test_link_targets() {
        let source = "---\ntitle: T\ndate: 2024-01-02 03:04:05 +0000\nauthor: A\n---\n\n[a](<foo bar>) and [b]() and [c](http:) and [d](http://)\n\n[ok1](docs/intro.md) [ok2](#top) [ok3](mailto:a@b.c)\n\n[ref]: https://example.com/fine\n";
        let issues = check(source);
        for issue in &issues {
            println!("{}", issue);
        }
        assert_eq!(errors(&issues), 4);
        assert!(issues.iter().all(|i| i.line == Some(7)));
    }

    #[test]
    fn test_bad_definition_target() {
        let source =
            "---\ntitle: T\ndate: 2024-01-02 03:04:05 +0000\nauthor: A\n---\n\nSee [the ref][r].\n\n[r]: <not a url>\n";
        let issues = check(source);
        assert_eq!(errors(&issues), 1);
        assert!(issues[0].message.contains("definition"));
    }

    #[test]
    fn test_unterminated_front_matter() {
        let source = "---\ntitle: T\nno closing delimiter";
        let issues = check(source);
        assert_eq!(errors(&issues), 1);
    }

    #[test]
    fn test_layout_template_lookup() {
        let tpl_dir = tempdir().unwrap();
        File::create(tpl_dir.path().join("post.tpl")).unwrap();

        let with_default = "---\ntitle: T\ndate: 2024-01-02 03:04:05 +0000\nauthor: A\n---\nBody";
        let issues =
            check_post_source(Path::new("p.md"), with_default, Some(tpl_dir.path()));
        assert!(issues.is_empty());

        let with_missing =
            "---\nlayout: recipe\ntitle: T\ndate: 2024-01-02 03:04:05 +0000\nauthor: A\n---\nBody";
        let issues =
            check_post_source(Path::new("p.md"), with_missing, Some(tpl_dir.path()));
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].severity, Severity::Warning);
        assert!(issues[0].message.contains("recipe.tpl"));
        assert_eq!(issues[0].line, Some(2));
    }

    #[test]
    fn test_check_posts_dir() {
        let root = tempdir().unwrap();
        let good = root.path().join("20240101_good");
        fs::create_dir(&good).unwrap();
        let mut file = File::create(good.join("index.md")).unwrap();
        file.write_all(b"---\ntitle: G\ndate: 2024-01-01 00:00:00 +0000\nauthor: A\n---\nFine.\n")
            .unwrap();

        let mut file = File::create(root.path().join("bad.md")).unwrap();
        file.write_all(b"---\ntitle: B\nauthor: A\n---\nNo date.\n").unwrap();

        let reports = check_posts(root.path(), "index", None).unwrap();
        assert_eq!(reports.len(), 2);
        assert!(has_errors(&reports));
        let clean: Vec<_> = reports.iter().filter(|r| r.is_clean()).collect();
        assert_eq!(clean.len(), 1);
        assert!(clean[0].file.ends_with("20240101_good/index.md"));
    }

    #[test]
    fn test_check_url_rules() {
        assert!(check_url("https://example.com/a?b=c#d").is_none());
        assert!(check_url("relative/path.md").is_none());
        assert!(check_url("#fragment").is_none());
        assert!(check_url("mailto:someone@example.com").is_none());
        assert!(check_url("//example.com/protocol-relative").is_none());

        assert!(check_url("").is_some());
        assert!(check_url("has space").is_some());
        assert!(check_url("has<bracket").is_some());
        assert!(check_url("http:").is_some());
        assert!(check_url("http://").is_some());
        assert!(check_url("http:///path-no-host").is_some());
    }
}
