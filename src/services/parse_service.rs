use crate::config::SnapshotConfig;
use crate::error::{Result as SnapResult, SnapshotError};
use crate::files;
use crate::git_ops::GitOperations;
use crate::git_ops::repository::RepositoryOperations;
use crate::parsers::{ArtifactParser, HtmlParser, JavaParser, MarkdownParser, PomParser};
use serde_json::{Map, Value, json};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info, warn};

const ERROR_KEY: &str = "error";
const GIT_REPOSITORY_KEY: &str = "gitRepository";

/// What a parse run extracts from a directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseKind {
    Git,
    All,
    Java,
    Pom,
    Html,
    Markdown,
}

impl ParseKind {
    pub const ALL: [ParseKind; 6] = [
        ParseKind::Git,
        ParseKind::All,
        ParseKind::Java,
        ParseKind::Pom,
        ParseKind::Html,
        ParseKind::Markdown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ParseKind::Git => "git",
            ParseKind::All => "all",
            ParseKind::Java => JavaParser::KIND,
            ParseKind::Pom => PomParser::KIND,
            ParseKind::Html => HtmlParser::KIND,
            ParseKind::Markdown => MarkdownParser::KIND,
        }
    }
}

impl fmt::Display for ParseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParseKind {
    type Err = SnapshotError;

    fn from_str(s: &str) -> SnapResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| SnapshotError::InvalidArgument(format!("unknown parse kind '{s}'")))
    }
}

/// Whether a result document reports a failure
pub fn is_error(result: &Value) -> bool {
    result.get(ERROR_KEY).is_some()
}

/// Parse service, turns a directory into JSON result documents
#[derive(Debug, Clone)]
pub struct ParseService {
    config: SnapshotConfig,
}

impl ParseService {
    pub fn new(config: SnapshotConfig) -> Self {
        ParseService { config }
    }

    pub fn config(&self) -> &SnapshotConfig {
        &self.config
    }

    /// Run one kind of parse over `dir`
    ///
    /// Never fails: problems are reported under an `error` key, and files
    /// that cannot be parsed become `{path, error}` entries.
    pub fn run(&self, kind: ParseKind, dir: &Path) -> Value {
        info!(%kind, dir = %dir.display(), "running parse");

        if !dir.is_dir() {
            return error_document(SnapshotError::DirectoryNotFound(dir.to_path_buf()));
        }
        let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());

        let result = match kind {
            ParseKind::Git => self.git(&dir),
            ParseKind::All => self.all(&dir),
            ParseKind::Java => self.artifact_document::<JavaParser>(&dir),
            ParseKind::Pom => self.artifact_document::<PomParser>(&dir),
            ParseKind::Html => self.artifact_document::<HtmlParser>(&dir),
            ParseKind::Markdown => self.artifact_document::<MarkdownParser>(&dir),
        };

        result.unwrap_or_else(error_document)
    }

    /// Write `result` as pretty JSON to `<output_dir>/parser_<kind>.json`
    pub fn save(&self, kind: ParseKind, result: &Value) -> SnapResult<PathBuf> {
        let path = self.config.output_file(kind.as_str());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut content = serde_json::to_string_pretty(result)?;
        content.push('\n');
        fs::write(&path, content)?;

        info!(path = %path.display(), "saved parse result");
        Ok(path)
    }

    fn git(&self, dir: &Path) -> SnapResult<Value> {
        let snapshot = GitOperations::open(dir)?.parse_repository(self.config.top_contributors)?;
        let mut result = Map::new();
        result.insert(GIT_REPOSITORY_KEY.to_string(), serde_json::to_value(snapshot)?);
        Ok(Value::Object(result))
    }

    fn all(&self, dir: &Path) -> SnapResult<Value> {
        let mut result = Map::new();

        if RepositoryOperations::is_valid_repository(dir) {
            match GitOperations::open(dir)
                .and_then(|git| git.parse_repository(self.config.top_contributors))
            {
                Ok(snapshot) => {
                    result.insert(GIT_REPOSITORY_KEY.to_string(), serde_json::to_value(snapshot)?);
                }
                Err(e) => warn!(dir = %dir.display(), error = %e, "skipping repository snapshot"),
            }
        }

        let files = files::list_all_files(dir, self.config.respect_gitignore)?;
        let mut statistics = Map::new();
        statistics.insert("totalFiles".to_string(), json!(files.len()));

        self.section::<PomParser>(&files, &mut result, &mut statistics);
        self.section::<JavaParser>(&files, &mut result, &mut statistics);
        self.section::<HtmlParser>(&files, &mut result, &mut statistics);
        self.section::<MarkdownParser>(&files, &mut result, &mut statistics);

        result.insert("fileStatistics".to_string(), Value::Object(statistics));
        Ok(Value::Object(result))
    }

    /// Add the `<kind>Files` list when any file matched, and always its count
    fn section<P: ArtifactParser>(
        &self,
        files: &[PathBuf],
        result: &mut Map<String, Value>,
        statistics: &mut Map<String, Value>,
    ) {
        let entries = parse_matching::<P>(files);
        statistics.insert(files_key::<P>(), json!(entries.len()));
        if !entries.is_empty() {
            result.insert(files_key::<P>(), Value::Array(entries));
        }
    }

    fn artifact_document<P: ArtifactParser>(&self, dir: &Path) -> SnapResult<Value> {
        let files = files::list_all_files(dir, self.config.respect_gitignore)?;
        let entries = parse_matching::<P>(&files);

        let mut result = Map::new();
        result.insert("directory".to_string(), json!(dir.display().to_string()));
        result.insert("count".to_string(), json!(entries.len()));
        result.insert(files_key::<P>(), Value::Array(entries));
        Ok(Value::Object(result))
    }
}

fn files_key<P: ArtifactParser>() -> String {
    format!("{}Files", P::KIND)
}

fn error_document(error: SnapshotError) -> Value {
    json!({ ERROR_KEY: error.to_string() })
}

/// Parse every file `P` accepts into a `{path, ...}` entry
fn parse_matching<P: ArtifactParser>(files: &[PathBuf]) -> Vec<Value> {
    files
        .iter()
        .filter(|path| P::matches(path))
        .map(|path| parse_entry::<P>(path))
        .collect()
}

fn parse_entry<P: ArtifactParser>(path: &Path) -> Value {
    let mut entry = Map::new();
    entry.insert("path".to_string(), json!(path.display().to_string()));

    let parsed = P::parse_file(path)
        .and_then(|output| serde_json::to_value(output).map_err(SnapshotError::from));
    match parsed {
        Ok(Value::Object(fields)) => entry.extend(fields),
        Ok(other) => {
            entry.insert("result".to_string(), other);
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to parse {} file", P::KIND);
            entry.insert(ERROR_KEY.to_string(), json!(e.to_string()));
        }
    }

    debug!(path = %path.display(), kind = P::KIND, "parsed artifact");
    Value::Object(entry)
}
