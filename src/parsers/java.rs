//! Java source summary
//!
//! Declarations are located with regular expressions run over a masked copy
//! of the source in which comments and string literals are blanked out.
//! The mask keeps byte offsets identical, so every match maps straight back
//! onto the original text.

use super::ArtifactParser;
use crate::error::Result as SnapResult;
use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use std::path::Path;

const DEFAULT_PACKAGE: &str = "default";
const DEFAULT_CLASS_TYPE: &str = "class";
const JAVA_EXTENSION: &str = ".java";

/// Bytes scanned for comments before and after a class declaration
const CLASS_COMMENT_WINDOW: (usize, usize) = (200, 200);
/// Bytes scanned for comments before and after a method declaration
const METHOD_COMMENT_WINDOW: (usize, usize) = (200, 100);

/// Words that look like a return type or method name to the declaration
/// pattern but only ever start statements or expressions
const STATEMENT_KEYWORDS: [&str; 16] = [
    "return",
    "new",
    "else",
    "throw",
    "case",
    "if",
    "for",
    "while",
    "switch",
    "catch",
    "synchronized",
    "try",
    "do",
    "yield",
    "assert",
    "record",
];

lazy_static! {
    static ref PACKAGE: Regex =
        Regex::new(r"\bpackage\s+([\w.]+)\s*;").expect("package pattern is valid");
    static ref CLASS: Regex = Regex::new(
        r"(?:\b(public|private|protected)\s+)?(?:(?:abstract|final|sealed|non-sealed|strictfp)\s+)*(?:\b(static)\s+)?(?:(?:abstract|final|sealed|strictfp)\s+)*\b(class|interface|enum)\s+(\w+)"
    )
    .expect("class pattern is valid");
    static ref METHOD: Regex = Regex::new(
        r"(?:\b(public|private|protected)\s+)?(?:(?:abstract|final|synchronized|native|default|strictfp)\s+)*(?:\b(static)\s+)?(?:(?:abstract|final|synchronized|native|default|strictfp)\s+)*\b(\w+(?:<[^(){};]*>)?(?:\[\])*)\s+(\w+)\s*\(([^)]*)\)"
    )
    .expect("method pattern is valid");
    static ref BODY_START: Regex =
        Regex::new(r"^\s*(?:throws\s+[\w,\s.]+?)?\s*([{;])").expect("body pattern is valid");
    static ref DECLARATION_PREFIX: Regex = Regex::new(
        r"^(?:\s+|@[\w.]+(?:\([^)]*\))?|\b(?:public|private|protected|static|final|abstract|sealed|strictfp|synchronized|native|default)\b)*$"
    )
    .expect("declaration prefix pattern is valid");
    static ref ANNOTATION: Regex =
        Regex::new(r"@[\w.]+(?:\([^)]*\))?").expect("annotation pattern is valid");
    static ref JAVADOC_LEAD: Regex = Regex::new(r"^\s*\*\s*").expect("javadoc lead pattern is valid");
    static ref JAVADOC_LINE: Regex =
        Regex::new(r"\n\s*\*\s*").expect("javadoc line pattern is valid");
    static ref JAVADOC_TAG: Regex =
        Regex::new(r"(?:^|\s)@(\w+)(?:\s+|$)").expect("javadoc tag pattern is valid");
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JavadocTag {
    pub name: String,
    pub value: String,
}

/// Cleaned text of a `/** ... */` block split into description and tags
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JavadocStructure {
    pub description: String,
    pub tags: Vec<JavadocTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    #[serde(rename = "type")]
    pub param_type: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodStructure {
    /// `public`, `private`, `protected` or empty for package access
    pub access_modifier: String,
    pub is_static: bool,
    pub return_type: String,
    pub method_name: String,
    pub parameters: Vec<Parameter>,
    /// Body including braces, empty for abstract and interface methods
    pub body: String,
    pub javadoc: Option<JavadocStructure>,
    pub comments: Vec<String>,
}

/// Summary of one `.java` file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStructure {
    pub file_name: String,
    pub package_name: String,
    pub class_name: String,
    /// `class`, `interface` or `enum`
    pub class_type: String,
    pub methods: Vec<MethodStructure>,
    pub javadoc: Option<JavadocStructure>,
    pub comments: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CommentKind {
    Doc,
    Block,
    Line,
}

#[derive(Debug, Clone, Copy)]
struct CommentSpan {
    kind: CommentKind,
    start: usize,
    end: usize,
}

/// Source text alongside its masked copy and comment locations
struct JavaSource<'a> {
    content: &'a str,
    masked: String,
    comments: Vec<CommentSpan>,
}

impl<'a> JavaSource<'a> {
    fn scan(content: &'a str) -> Self {
        let len = content.len();
        let mut masked = String::with_capacity(len);
        let mut comments = Vec::new();
        let mut code_start = 0;
        let mut pos = 0;

        while pos < len {
            let rest = &content[pos..];
            let (kind, end) = if rest.starts_with("//") {
                let end = rest.find('\n').map_or(len, |n| pos + n);
                (Some(CommentKind::Line), end)
            } else if rest.starts_with("/*") {
                let end = rest[2..].find("*/").map_or(len, |n| pos + 2 + n + 2);
                let kind = if rest.starts_with("/**") && !rest.starts_with("/**/") {
                    CommentKind::Doc
                } else {
                    CommentKind::Block
                };
                (Some(kind), end)
            } else if rest.starts_with("\"\"\"") {
                (None, rest[3..].find("\"\"\"").map_or(len, |n| pos + 3 + n + 3))
            } else if rest.starts_with('"') || rest.starts_with('\'') {
                (None, literal_end(content, pos))
            } else {
                pos += rest.chars().next().map_or(1, char::len_utf8);
                continue;
            };

            masked.push_str(&content[code_start..pos]);
            blank_into(&mut masked, &content[pos..end]);
            if let Some(kind) = kind {
                comments.push(CommentSpan { kind, start: pos, end });
            }
            pos = end;
            code_start = end;
        }
        masked.push_str(&content[code_start..]);

        Self {
            content,
            masked,
            comments,
        }
    }

    fn comment_text(&self, span: &CommentSpan) -> &'a str {
        let raw = &self.content[span.start..span.end];
        let inner = match span.kind {
            CommentKind::Line => &raw[2..],
            CommentKind::Block => raw[2..].strip_suffix("*/").unwrap_or(&raw[2..]),
            CommentKind::Doc => raw[3..].strip_suffix("*/").unwrap_or(&raw[3..]),
        };
        inner.trim()
    }

    /// Javadoc directly preceding a declaration, allowing only annotations
    /// and modifiers in between
    fn javadoc_before(&self, declaration: usize) -> Option<JavadocStructure> {
        self.comments
            .iter()
            .filter(|span| span.kind == CommentKind::Doc && span.end <= declaration)
            .last()
            .filter(|span| DECLARATION_PREFIX.is_match(&self.masked[span.end..declaration]))
            .map(|span| parse_javadoc(self.comment_text(span)))
    }

    /// Plain comments lying entirely within a window around `position`
    fn comments_near(&self, position: usize, (before, after): (usize, usize)) -> Vec<String> {
        let from = position.saturating_sub(before);
        let to = (position + after).min(self.content.len());
        self.comments
            .iter()
            .filter(|span| span.kind != CommentKind::Doc)
            .filter(|span| span.start >= from && span.end <= to)
            .map(|span| self.comment_text(span).to_string())
            .collect()
    }

    fn package_name(&self) -> String {
        PACKAGE
            .captures(&self.masked)
            .map_or_else(|| DEFAULT_PACKAGE.to_string(), |caps| caps[1].to_string())
    }

    fn methods(&self) -> Vec<MethodStructure> {
        let mut methods = Vec::new();
        let mut pos = 0;

        while let Some(caps) = METHOD.captures_at(&self.masked, pos) {
            let Some(whole) = caps.get(0) else { break };
            pos = whole.end();

            let return_type = &caps[3];
            let method_name = &caps[4];
            if STATEMENT_KEYWORDS.contains(&return_type) || STATEMENT_KEYWORDS.contains(&method_name) {
                continue;
            }
            // A declaration is followed by a body or, when abstract, a semicolon
            let Some(terminator) = BODY_START
                .captures(&self.masked[whole.end()..])
                .and_then(|body| body.get(1))
            else {
                continue;
            };

            let mut body = String::new();
            let open = whole.end() + terminator.start();
            pos = open + 1;
            if terminator.as_str() == "{" {
                if let Some(close) = matching_brace(&self.masked, open) {
                    body = self.content[open..=close].to_string();
                    pos = close + 1;
                }
            }

            let start = whole.start();
            let parameters_text = caps.get(5).map_or("", |m| &self.content[m.range()]);
            methods.push(MethodStructure {
                access_modifier: caps.get(1).map_or_else(String::new, |m| m.as_str().to_string()),
                is_static: caps.get(2).is_some(),
                return_type: return_type.to_string(),
                method_name: method_name.to_string(),
                parameters: parse_parameters(parameters_text),
                body,
                javadoc: self.javadoc_before(start),
                comments: self.comments_near(start, METHOD_COMMENT_WINDOW),
            });
        }

        methods
    }
}

/// End of a string or character literal starting at `start`; a literal
/// runs to the end of its line at most
fn literal_end(content: &str, start: usize) -> usize {
    let bytes = content.as_bytes();
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'\n' => return i,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

fn blank_into(masked: &mut String, text: &str) {
    for c in text.chars() {
        if c == '\n' {
            masked.push('\n');
        } else {
            masked.extend(std::iter::repeat(' ').take(c.len_utf8()));
        }
    }
}

fn matching_brace(masked: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &byte) in masked.as_bytes()[open..].iter().enumerate() {
        match byte {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split a Javadoc body into description and `@tag value` pairs
pub fn parse_javadoc(text: &str) -> JavadocStructure {
    let cleaned = JAVADOC_LEAD.replace(text.trim(), "");
    let cleaned = JAVADOC_LINE.replace_all(&cleaned, "\n");
    let cleaned = cleaned.trim();

    let matches: Vec<_> = JAVADOC_TAG.captures_iter(cleaned).collect();
    let description = match matches.first().and_then(|caps| caps.get(0)) {
        Some(first) => cleaned[..first.start()].trim(),
        None => cleaned,
    };

    let tags = matches
        .iter()
        .enumerate()
        .filter_map(|(i, caps)| {
            let whole = caps.get(0)?;
            let value_end = matches
                .get(i + 1)
                .and_then(|next| next.get(0))
                .map_or(cleaned.len(), |next| next.start());
            Some(JavadocTag {
                name: caps[1].to_string(),
                value: cleaned[whole.end()..value_end].trim().to_string(),
            })
        })
        .collect();

    JavadocStructure {
        description: description.to_string(),
        tags,
    }
}

/// Parameters of a declaration, split on commas outside generic brackets
fn parse_parameters(text: &str) -> Vec<Parameter> {
    let text = ANNOTATION.replace_all(text, "");
    let mut parameters = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;

    for (index, c) in text.char_indices() {
        match c {
            '<' => depth += 1,
            '>' => depth -= 1,
            ',' if depth == 0 => {
                parameters.extend(parse_parameter(&text[start..index]));
                start = index + 1;
            }
            _ => {}
        }
    }
    parameters.extend(parse_parameter(&text[start..]));
    parameters
}

fn parse_parameter(text: &str) -> Option<Parameter> {
    let parts: Vec<&str> = text
        .split_whitespace()
        .filter(|part| *part != "final")
        .collect();
    let (name, type_parts) = parts.split_last()?;
    if type_parts.is_empty() {
        return None;
    }
    Some(Parameter {
        param_type: type_parts.join(" "),
        name: (*name).to_string(),
    })
}

/// Parser for Java source files
pub struct JavaParser;

impl ArtifactParser for JavaParser {
    type Output = ClassStructure;

    const KIND: &'static str = "java";

    fn matches(path: &Path) -> bool {
        super::lower_file_name(path).ends_with(JAVA_EXTENSION)
    }

    fn parse(file_name: &str, content: &str) -> SnapResult<ClassStructure> {
        let source = JavaSource::scan(content);

        let declaration = CLASS.captures(&source.masked);
        let (class_name, class_type) = match &declaration {
            Some(caps) => (caps[4].to_string(), caps[3].to_string()),
            None => (
                file_name
                    .strip_suffix(JAVA_EXTENSION)
                    .unwrap_or(file_name)
                    .to_string(),
                DEFAULT_CLASS_TYPE.to_string(),
            ),
        };
        let (javadoc, comments) = match declaration.as_ref().and_then(|caps| caps.get(0)) {
            Some(whole) => (
                source.javadoc_before(whole.start()),
                source.comments_near(whole.start(), CLASS_COMMENT_WINDOW),
            ),
            None => (None, Vec::new()),
        };

        Ok(ClassStructure {
            file_name: file_name.to_string(),
            package_name: source.package_name(),
            class_name,
            class_type,
            methods: source.methods(),
            javadoc,
            comments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"package com.example.shapes;

import java.util.List;

// Shapes used by the renderer
/**
 * Computes areas.
 * @author Ada
 * @since 1.2
 */
@Deprecated
public final class AreaCalculator {

    private static final String NOTE = "class Fake { void trap() {} }";

    /**
     * Area of a rectangle.
     * @param width the width
     * @param height the height
     * @return the area
     */
    public static double rectangle(double width, final double height) {
        if (width < 0) {
            return 0;
        }
        return width * height;
    }

    // Sums every area
    protected double total(List<Double> areas, Map<String, Integer> weights) throws IllegalStateException {
        String braces = "}}}";
        return areas.stream().mapToDouble(Double::doubleValue).sum();
    }

    /* void commented(int x) {} */
    abstract int sides();
}
"#;

    fn parse() -> ClassStructure {
        JavaParser::parse("AreaCalculator.java", SOURCE).unwrap()
    }

    #[test]
    fn class_declaration() {
        let class = parse();
        assert_eq!(class.package_name, "com.example.shapes");
        assert_eq!(class.class_name, "AreaCalculator");
        assert_eq!(class.class_type, "class");
        assert_eq!(class.comments, vec!["Shapes used by the renderer"]);

        let javadoc = class.javadoc.expect("class javadoc");
        assert_eq!(javadoc.description, "Computes areas.");
        assert_eq!(
            javadoc.tags,
            vec![
                JavadocTag {
                    name: "author".to_string(),
                    value: "Ada".to_string()
                },
                JavadocTag {
                    name: "since".to_string(),
                    value: "1.2".to_string()
                },
            ]
        );
    }

    #[test]
    fn methods_skip_strings_and_comments() {
        let class = parse();
        let names: Vec<_> = class.methods.iter().map(|m| m.method_name.as_str()).collect();
        assert_eq!(names, vec!["rectangle", "total", "sides"]);
    }

    #[test]
    fn method_details() {
        let class = parse();
        let rectangle = &class.methods[0];
        assert_eq!(rectangle.access_modifier, "public");
        assert!(rectangle.is_static);
        assert_eq!(rectangle.return_type, "double");
        assert_eq!(rectangle.parameters.len(), 2);
        assert_eq!(rectangle.parameters[1].name, "height");
        assert_eq!(rectangle.parameters[1].param_type, "double");
        assert!(rectangle.body.starts_with('{'));
        assert!(rectangle.body.trim_end().ends_with("return width * height;\n    }"));

        let javadoc = rectangle.javadoc.as_ref().expect("method javadoc");
        assert_eq!(javadoc.description, "Area of a rectangle.");
        assert_eq!(javadoc.tags.len(), 3);
        assert_eq!(javadoc.tags[2].value, "the area");

        let total = &class.methods[1];
        assert_eq!(total.access_modifier, "protected");
        assert!(!total.is_static);
        assert!(total.javadoc.is_none());
        assert!(total.comments.contains(&"Sums every area".to_string()));
        assert_eq!(total.parameters[1].param_type, "Map<String, Integer>");
        assert!(total.body.contains("\"}}}\""));

        let sides = &class.methods[2];
        assert_eq!(sides.access_modifier, "");
        assert_eq!(sides.return_type, "int");
        assert!(sides.body.is_empty());
    }

    #[test]
    fn file_without_declaration_falls_back_to_file_name() {
        let class = JavaParser::parse("Empty.java", "// nothing here\n").unwrap();
        assert_eq!(class.class_name, "Empty");
        assert_eq!(class.class_type, "class");
        assert_eq!(class.package_name, "default");
        assert!(class.methods.is_empty());
    }

    #[test]
    fn detached_javadoc_is_not_attached() {
        let source = "/** File header. */\nimport a.B;\n\ninterface Shape { int sides(); }\n";
        let class = JavaParser::parse("Shape.java", source).unwrap();
        assert_eq!(class.class_type, "interface");
        assert!(class.javadoc.is_none());
        assert_eq!(class.methods[0].method_name, "sides");
    }

    #[test]
    fn javadoc_without_tags() {
        let doc = parse_javadoc("\n * First line.\n * Second line.\n ");
        assert_eq!(doc.description, "First line.\nSecond line.");
        assert!(doc.tags.is_empty());
    }
}
