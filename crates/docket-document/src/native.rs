//! Fast path: embedded PDF text layers and text-based formats

use crate::backend::{Conversion, ConversionBackend};
use crate::config::{DocumentConfig, TableMode};
use crate::error::DocumentError;
use lopdf::Document;
use regex::{Captures, Regex};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Extensions the native backend converts
pub const SUPPORTED_TYPES: [&str; 6] = ["pdf", "txt", "md", "html", "htm", "eml"];

static SCRIPT_STYLE_RE: OnceLock<Regex> = OnceLock::new();
static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static TABLE_RE: OnceLock<Regex> = OnceLock::new();
static ROW_RE: OnceLock<Regex> = OnceLock::new();
static CELL_RE: OnceLock<Regex> = OnceLock::new();
static BREAK_RE: OnceLock<Regex> = OnceLock::new();
static BLOCK_END_RE: OnceLock<Regex> = OnceLock::new();
static LIST_ITEM_RE: OnceLock<Regex> = OnceLock::new();
static HTML_TAG_RE: OnceLock<Regex> = OnceLock::new();
static BLANK_LINES_RE: OnceLock<Regex> = OnceLock::new();
static MD_HEADING_RE: OnceLock<Regex> = OnceLock::new();

fn script_style_regex() -> &'static Regex {
    SCRIPT_STYLE_RE.get_or_init(|| {
        Regex::new(r"(?is)<script[^>]*>.*?</script>|<style[^>]*>.*?</style>|<!--.*?-->").unwrap()
    })
}

fn heading_regex() -> &'static Regex {
    HEADING_RE.get_or_init(|| Regex::new(r"(?is)<h([1-6])[^>]*>(.*?)</h[1-6]\s*>").unwrap())
}

fn table_regex() -> &'static Regex {
    TABLE_RE.get_or_init(|| Regex::new(r"(?is)<table[^>]*>(.*?)</table\s*>").unwrap())
}

fn row_regex() -> &'static Regex {
    ROW_RE.get_or_init(|| Regex::new(r"(?is)<tr[^>]*>(.*?)</tr\s*>").unwrap())
}

fn cell_regex() -> &'static Regex {
    CELL_RE.get_or_init(|| Regex::new(r"(?is)<t[dh][^>]*>(.*?)</t[dh]\s*>").unwrap())
}

fn break_regex() -> &'static Regex {
    BREAK_RE.get_or_init(|| Regex::new(r"(?i)<br\s*/?>").unwrap())
}

fn block_end_regex() -> &'static Regex {
    BLOCK_END_RE.get_or_init(|| {
        Regex::new(r"(?i)</(p|div|section|article|blockquote|ul|ol|pre)\s*>").unwrap()
    })
}

fn list_item_regex() -> &'static Regex {
    LIST_ITEM_RE.get_or_init(|| Regex::new(r"(?i)<li[^>]*>").unwrap())
}

fn html_tag_regex() -> &'static Regex {
    HTML_TAG_RE.get_or_init(|| Regex::new(r"<[^>]+>").unwrap())
}

fn blank_lines_regex() -> &'static Regex {
    BLANK_LINES_RE.get_or_init(|| Regex::new(r"\n{3,}").unwrap())
}

fn md_heading_regex() -> &'static Regex {
    MD_HEADING_RE.get_or_init(|| Regex::new(r"(?m)^#{1,6}\s+").unwrap())
}

/// Converts files without OCR
#[derive(Debug, Clone)]
pub struct NativeBackend {
    table_mode: TableMode,
}

impl NativeBackend {
    /// Create a backend honoring the configured table mode
    pub fn new(config: &DocumentConfig) -> Self {
        Self {
            table_mode: config.table_mode,
        }
    }
}

impl ConversionBackend for NativeBackend {
    fn name(&self) -> &'static str {
        "native"
    }

    fn ocr_enabled(&self) -> bool {
        false
    }

    fn convert(&self, path: &Path) -> Result<Conversion, DocumentError> {
        let file_type = file_type(path);
        debug!("Converting {} as {}", path.display(), file_type);

        match file_type.as_str() {
            "pdf" => convert_pdf(path),
            "txt" => {
                let text = read_lossy(path)?;
                Ok(Conversion {
                    markdown: text.clone(),
                    plain_text: text,
                    page_count: None,
                })
            }
            "md" => {
                let markdown = read_lossy(path)?;
                let plain_text = markdown_to_plain(&markdown);
                Ok(Conversion {
                    markdown,
                    plain_text,
                    page_count: None,
                })
            }
            "html" | "htm" => {
                let markdown = html_to_markdown(&read_lossy(path)?, self.table_mode);
                let plain_text = markdown_to_plain(&markdown);
                Ok(Conversion {
                    markdown,
                    plain_text,
                    page_count: None,
                })
            }
            "eml" => convert_eml(&std::fs::read(path)?, self.table_mode),
            other => Err(DocumentError::UnsupportedType(other.to_string())),
        }
    }
}

/// Lowercased extension of `path`
pub fn file_type(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn read_lossy(path: &Path) -> Result<String, DocumentError> {
    let bytes = std::fs::read(path)?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Text layer of the first `max_pages` pages (all pages when `None`) and the page count
pub(crate) fn pdf_page_texts(
    path: &Path,
    max_pages: Option<usize>,
) -> Result<(Vec<String>, usize), DocumentError> {
    let document = Document::load(path)?;
    if document.is_encrypted() {
        return Err(DocumentError::Pdf("document is encrypted".to_string()));
    }

    let pages = document.get_pages();
    let page_count = pages.len();
    let take = max_pages.unwrap_or(page_count);

    let texts = pages
        .keys()
        .take(take)
        .map(|&number| {
            document.extract_text(&[number]).unwrap_or_else(|e| {
                warn!("No text layer on page {} of {}: {}", number, path.display(), e);
                String::new()
            })
        })
        .collect();
    Ok((texts, page_count))
}

fn convert_pdf(path: &Path) -> Result<Conversion, DocumentError> {
    let (pages, page_count) = pdf_page_texts(path, None)?;
    let pages: Vec<String> = pages.iter().map(|p| p.trim().to_string()).collect();

    Ok(Conversion {
        markdown: pages.join("\n\n---\n\n"),
        plain_text: pages.join("\n\n"),
        page_count: Some(page_count),
    })
}

fn convert_eml(data: &[u8], table_mode: TableMode) -> Result<Conversion, DocumentError> {
    let message = mail_parser::MessageParser::default()
        .parse(data)
        .ok_or_else(|| DocumentError::UnsupportedType("eml: invalid email format".to_string()))?;

    let mut header = Vec::new();
    if let Some(subject) = message.subject() {
        header.push(format!("Subject: {}", subject));
    }
    if let Some(from) = message
        .from()
        .and_then(|from| from.first())
        .and_then(|addr| addr.address())
    {
        header.push(format!("From: {}", from));
    }
    if let Some(date) = message.date() {
        header.push(format!("Date: {}", date.to_rfc3339()));
    }

    let body = if let Some(text) = message.body_text(0) {
        text.into_owned()
    } else if let Some(html) = message.body_html(0) {
        markdown_to_plain(&html_to_markdown(&html, table_mode))
    } else {
        String::new()
    };

    let head = header.join("\n");
    let markdown = match message.subject() {
        Some(subject) => format!("# {}\n\n{}\n\n{}", subject, head, body.trim()),
        None => format!("{}\n\n{}", head, body.trim()),
    };
    Ok(Conversion {
        markdown,
        plain_text: format!("{}\n\n{}", head, body.trim()).trim().to_string(),
        page_count: None,
    })
}

/// Render HTML as lightweight markdown
pub fn html_to_markdown(html: &str, table_mode: TableMode) -> String {
    let text = script_style_regex().replace_all(html, "");

    let text = table_regex().replace_all(&text, |caps: &Captures| {
        format!("\n\n{}\n\n", render_table(&caps[1], table_mode))
    });

    let text = heading_regex().replace_all(&text, |caps: &Captures| {
        let level = caps[1].parse::<usize>().unwrap_or(1);
        let title = collapse_spaces(&html_tag_regex().replace_all(&caps[2], ""));
        format!("\n\n{} {}\n\n", "#".repeat(level), title)
    });

    let text = break_regex().replace_all(&text, "\n");
    let text = list_item_regex().replace_all(&text, "\n- ");
    let text = block_end_regex().replace_all(&text, "\n\n");
    let text = html_tag_regex().replace_all(&text, "");
    let text = decode_entities(&text);

    let lines: Vec<String> = text.lines().map(collapse_spaces).collect();
    blank_lines_regex()
        .replace_all(&lines.join("\n"), "\n\n")
        .trim()
        .to_string()
}

fn render_table(inner: &str, table_mode: TableMode) -> String {
    let rows: Vec<Vec<String>> = row_regex()
        .captures_iter(inner)
        .map(|row| {
            cell_regex()
                .captures_iter(&row[1])
                .map(|cell| collapse_spaces(&decode_entities(&html_tag_regex().replace_all(&cell[1], ""))))
                .collect()
        })
        .filter(|cells: &Vec<String>| !cells.is_empty())
        .collect();

    match table_mode {
        TableMode::Fast => rows
            .iter()
            .map(|cells| cells.join("\t"))
            .collect::<Vec<_>>()
            .join("\n"),
        TableMode::Accurate => {
            let mut lines = Vec::with_capacity(rows.len() + 1);
            for (idx, cells) in rows.iter().enumerate() {
                lines.push(format!("| {} |", cells.join(" | ")));
                if idx == 0 {
                    lines.push(format!("|{}", " --- |".repeat(cells.len())));
                }
            }
            lines.join("\n")
        }
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&sect;", "§")
        .replace("&amp;", "&")
}

fn collapse_spaces(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip markdown heading markers and emphasis for the plain rendering
pub fn markdown_to_plain(markdown: &str) -> String {
    md_heading_regex()
        .replace_all(markdown, "")
        .replace("**", "")
        .replace("__", "")
}
