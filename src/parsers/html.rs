//! HTML page summary

use super::ArtifactParser;
use crate::error::Result as SnapResult;
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

const HTML_EXTENSIONS: [&str; 2] = [".html", ".htm"];
const TITLE_KEY: &str = "title";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlHeading {
    pub level: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlLink {
    pub text: String,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HtmlImage {
    pub alt: String,
    pub src: String,
}

/// Summary of one HTML page
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HtmlDocument {
    pub title: Option<String>,
    /// Page title plus every `<meta>` name or property with its content
    pub metadata: BTreeMap<String, String>,
    pub headings: Vec<HtmlHeading>,
    pub links: Vec<HtmlLink>,
    pub images: Vec<HtmlImage>,
    pub scripts: Vec<String>,
    pub stylesheets: Vec<String>,
}

lazy_static! {
    static ref TITLE: Selector = Selector::parse("title").expect("title selector is valid");
    static ref META: Selector = Selector::parse("meta[content]").expect("meta selector is valid");
    static ref HEADINGS: Selector =
        Selector::parse("h1, h2, h3, h4, h5, h6").expect("heading selector is valid");
    static ref LINKS: Selector = Selector::parse("a[href]").expect("link selector is valid");
    static ref IMAGES: Selector = Selector::parse("img[src]").expect("image selector is valid");
    static ref SCRIPTS: Selector = Selector::parse("script[src]").expect("script selector is valid");
    static ref STYLESHEETS: Selector =
        Selector::parse("link[rel][href]").expect("stylesheet selector is valid");
}

fn heading_level(name: &str) -> Option<usize> {
    let level = name.strip_prefix('h')?.parse().ok()?;
    (1..=6).contains(&level).then_some(level)
}

/// Text of an element and its descendants with whitespace runs collapsed
fn element_text(element: ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Trimmed, non-blank attribute value
fn attr<'a>(element: ElementRef<'a>, key: &str) -> Option<&'a str> {
    element
        .value()
        .attr(key)
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn is_stylesheet(element: ElementRef) -> bool {
    attr(element, "rel").is_some_and(|rel| {
        rel.split_whitespace()
            .any(|r| r.eq_ignore_ascii_case("stylesheet"))
    })
}

impl HtmlDocument {
    fn from_html(html: &Html) -> Self {
        let mut document = HtmlDocument {
            title: html.select(&TITLE).next().map(element_text),
            ..HtmlDocument::default()
        };
        if let Some(title) = &document.title {
            document.metadata.insert(TITLE_KEY.to_string(), title.clone());
        }

        for meta in html.select(&META) {
            if let (Some(key), Some(content)) = (
                attr(meta, "name").or_else(|| attr(meta, "property")),
                meta.value().attr("content"),
            ) {
                document.metadata.insert(key.to_string(), content.to_string());
            }
        }

        document.headings = html
            .select(&HEADINGS)
            .filter_map(|heading| {
                heading_level(heading.value().name()).map(|level| HtmlHeading {
                    level,
                    text: element_text(heading),
                })
            })
            .collect();

        document.links = html
            .select(&LINKS)
            .filter_map(|link| {
                attr(link, "href").map(|href| HtmlLink {
                    text: element_text(link),
                    href: href.to_string(),
                })
            })
            .collect();

        document.images = html
            .select(&IMAGES)
            .filter_map(|image| {
                attr(image, "src").map(|src| HtmlImage {
                    alt: attr(image, "alt").unwrap_or_default().to_string(),
                    src: src.to_string(),
                })
            })
            .collect();

        document.scripts = html
            .select(&SCRIPTS)
            .filter_map(|script| attr(script, "src").map(str::to_string))
            .collect();

        document.stylesheets = html
            .select(&STYLESHEETS)
            .filter(|link| is_stylesheet(*link))
            .filter_map(|link| attr(link, "href").map(str::to_string))
            .collect();

        document
    }
}

/// Parser for HTML pages
///
/// Pages go through a browser-grade parser, so malformed markup is
/// recovered from rather than rejected.
pub struct HtmlParser;

impl ArtifactParser for HtmlParser {
    type Output = HtmlDocument;

    const KIND: &'static str = "html";

    fn matches(path: &Path) -> bool {
        let name = super::lower_file_name(path);
        HTML_EXTENSIONS.iter().any(|ext| name.ends_with(ext))
    }

    fn parse(_file_name: &str, content: &str) -> SnapResult<HtmlDocument> {
        let html = Html::parse_document(content);
        Ok(HtmlDocument::from_html(&html))
    }
}
