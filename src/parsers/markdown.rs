//! Markdown document summary built from the pulldown-cmark event stream

use super::ArtifactParser;
use crate::error::Result as SnapResult;
use lazy_static::lazy_static;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd, html};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

const MARKDOWN_EXTENSIONS: [&str; 2] = [".md", ".markdown"];
const WORDS_PER_MINUTE: usize = 225;
const FRONT_MATTER_FENCE: &str = "---";

lazy_static! {
    static ref SLUG_STRIP: Regex = Regex::new(r"[^\w\s-]").expect("slug pattern is valid");
    static ref SLUG_SPACES: Regex = Regex::new(r"\s+").expect("slug spacing pattern is valid");
    static ref FENCED_CODE: Regex = Regex::new(r"(?s)```.*?```").expect("fence pattern is valid");
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").expect("tag pattern is valid");
    static ref MARKUP_SYMBOLS: Regex =
        Regex::new(r"[#*_~`\[\](){}|]+").expect("symbol pattern is valid");
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkdownHeading {
    pub level: usize,
    pub text: String,
    pub id: String,
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkdownLink {
    pub text: String,
    pub url: String,
    pub title: Option<String>,
    /// Points at an anchor in the same document
    pub internal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownImage {
    pub alt_text: String,
    pub url: String,
    pub title: Option<String>,
    pub local: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkdownCodeBlock {
    pub content: String,
    pub language: Option<String>,
    pub fenced: bool,
    pub position: usize,
}

/// Summary of one Markdown document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkdownContent {
    pub title: Option<String>,
    pub headings: Vec<MarkdownHeading>,
    pub links: Vec<MarkdownLink>,
    pub images: Vec<MarkdownImage>,
    pub code_blocks: Vec<MarkdownCodeBlock>,
    pub front_matter: BTreeMap<String, Value>,
    pub word_count: usize,
    pub reading_time_minutes: usize,
}

/// Element whose text is still being collected
enum Open {
    Heading(usize),
    Link { url: String, title: Option<String> },
    Image { url: String, title: Option<String> },
    Code { language: Option<String>, fenced: bool },
    FrontMatter,
}

#[derive(Default)]
struct Collector {
    open: Vec<(Open, String)>,
    position: usize,
    headings: Vec<MarkdownHeading>,
    links: Vec<MarkdownLink>,
    images: Vec<MarkdownImage>,
    code_blocks: Vec<MarkdownCodeBlock>,
    front_matter: BTreeMap<String, Value>,
}

impl Collector {
    fn start(&mut self, tag: Tag<'_>) {
        let open = match tag {
            Tag::Heading { level, .. } => Open::Heading(level as usize),
            Tag::Link {
                dest_url, title, ..
            } => Open::Link {
                url: dest_url.into_string(),
                title: non_empty(&title),
            },
            Tag::Image {
                dest_url, title, ..
            } => Open::Image {
                url: dest_url.into_string(),
                title: non_empty(&title),
            },
            Tag::CodeBlock(kind) => match kind {
                CodeBlockKind::Fenced(info) => Open::Code {
                    language: info.split_whitespace().next().map(str::to_string),
                    fenced: true,
                },
                CodeBlockKind::Indented => Open::Code {
                    language: None,
                    fenced: false,
                },
            },
            Tag::MetadataBlock(_) => Open::FrontMatter,
            _ => return,
        };
        self.open.push((open, String::new()));
    }

    fn end(&mut self, tag: TagEnd) {
        let closes = matches!(
            tag,
            TagEnd::Heading(_)
                | TagEnd::Link
                | TagEnd::Image
                | TagEnd::CodeBlock
                | TagEnd::MetadataBlock(_)
        );
        if !closes {
            return;
        }
        let Some((open, text)) = self.open.pop() else {
            return;
        };

        match open {
            Open::Heading(level) => {
                let text = text.trim().to_string();
                let position = self.next_position();
                self.headings.push(MarkdownHeading {
                    level,
                    id: slug(&text),
                    text,
                    position,
                });
            }
            Open::Link { url, title } => self.links.push(MarkdownLink {
                text: text.trim().to_string(),
                internal: url.starts_with('#'),
                url,
                title,
            }),
            Open::Image { url, title } => self.images.push(MarkdownImage {
                alt_text: text.trim().to_string(),
                local: !url.starts_with("http"),
                url,
                title,
            }),
            Open::Code { language, fenced } => {
                let position = self.next_position();
                self.code_blocks.push(MarkdownCodeBlock {
                    content: text,
                    language,
                    fenced,
                    position,
                });
            }
            Open::FrontMatter => self.front_matter = parse_front_matter(&text),
        }
    }

    /// Append text to every element still open, so link text inside a
    /// heading counts for both
    fn text(&mut self, text: &str) {
        for (_, buffer) in &mut self.open {
            buffer.push_str(text);
        }
    }

    fn next_position(&mut self) -> usize {
        let position = self.position;
        self.position += 1;
        position
    }
}

fn non_empty(text: &str) -> Option<String> {
    (!text.is_empty()).then(|| text.to_string())
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
}

/// Anchor id derived from heading text
pub fn slug(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = SLUG_STRIP.replace_all(&lowered, "");
    SLUG_SPACES.replace_all(stripped.trim(), "-").into_owned()
}

/// Flat `key: value` pairs, with `- item` lines under an empty key
/// collected into a list
fn parse_front_matter(text: &str) -> BTreeMap<String, Value> {
    let mut entries = BTreeMap::new();
    let mut list_key: Option<String> = None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        if let (Some(key), Some(item)) = (&list_key, trimmed.strip_prefix("- ")) {
            if let Some(Value::Array(items)) = entries.get_mut(key) {
                items.push(Value::String(unquote(item).to_string()));
            }
            continue;
        }
        let Some((key, value)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim();
        if value.is_empty() {
            entries.insert(key.clone(), Value::Array(Vec::new()));
            list_key = Some(key);
        } else {
            entries.insert(key, Value::String(unquote(value).to_string()));
            list_key = None;
        }
    }

    entries
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
        .unwrap_or(value)
}

/// Words of prose, ignoring front matter, fenced code, tags and markup
pub fn count_words(markdown: &str) -> usize {
    let mut body = markdown;
    if let Some(rest) = markdown.strip_prefix(FRONT_MATTER_FENCE) {
        if let Some(end) = rest.find(FRONT_MATTER_FENCE) {
            body = &rest[end + FRONT_MATTER_FENCE.len()..];
        }
    }
    let body = FENCED_CODE.replace_all(body, " ");
    let body = HTML_TAG.replace_all(&body, " ");
    let body = MARKUP_SYMBOLS.replace_all(&body, " ");
    body.split_whitespace().count()
}

pub fn reading_time_minutes(word_count: usize) -> usize {
    word_count.div_ceil(WORDS_PER_MINUTE).max(1)
}

/// Render Markdown to HTML with the same extensions used for parsing
pub fn markdown_to_html(markdown: &str) -> String {
    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, Parser::new_ext(markdown, parser_options()));
    output
}

/// Parser for Markdown documents
pub struct MarkdownParser;

impl MarkdownParser {
    pub fn parse_content(markdown: &str) -> MarkdownContent {
        let mut collector = Collector::default();
        for event in Parser::new_ext(markdown, parser_options()) {
            match event {
                Event::Start(tag) => collector.start(tag),
                Event::End(tag) => collector.end(tag),
                Event::Text(text) | Event::Code(text) => collector.text(&text),
                Event::SoftBreak | Event::HardBreak => collector.text("\n"),
                _ => {}
            }
        }

        let word_count = count_words(markdown);
        MarkdownContent {
            title: collector.headings.first().map(|h| h.text.clone()),
            headings: collector.headings,
            links: collector.links,
            images: collector.images,
            code_blocks: collector.code_blocks,
            front_matter: collector.front_matter,
            word_count,
            reading_time_minutes: reading_time_minutes(word_count),
        }
    }
}

impl ArtifactParser for MarkdownParser {
    type Output = MarkdownContent;

    const KIND: &'static str = "markdown";

    fn matches(path: &Path) -> bool {
        let name = super::lower_file_name(path);
        MARKDOWN_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
    }

    fn parse(_file_name: &str, content: &str) -> SnapResult<MarkdownContent> {
        Ok(Self::parse_content(content))
    }
}
