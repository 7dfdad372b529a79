//! Artifact file listing
//!
//! Listing honors a deliberately small subset of `.gitignore`: only the file
//! at the listing root is read, and each pattern is a glob translated to an
//! anchored regular expression over the `/`-separated relative path. A
//! negated pattern (`!foo`) therefore excludes every path that does NOT
//! match `foo`.

use crate::error::{Result as SnapResult, SnapshotError};
use crate::git_ops::repository::GIT_DIR_NAME;
use regex::Regex;
use std::fs::{self, File};
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

const GITIGNORE_FILE: &str = ".gitignore";

/// Files above this size are never treated as text
const MAX_TEXT_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Files above this size are sampled rather than read whole
const SAMPLE_SIZE: u64 = 8192;

/// One translated ignore rule
#[derive(Debug, Clone)]
struct IgnorePattern {
    regex: Regex,
    negate: bool,
}

impl IgnorePattern {
    /// Translate a `.gitignore` line
    ///
    /// `!` is stripped first, then a trailing `/`; `.` becomes `\.`, `*`
    /// becomes `.*` and `?` becomes `.`.
    fn parse(line: &str) -> SnapResult<Self> {
        let (negate, glob) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let glob = glob.strip_suffix('/').unwrap_or(glob);
        let translated = glob
            .replace('.', "\\.")
            .replace('*', ".*")
            .replace('?', ".");
        let regex = Regex::new(&format!("^(?:{translated})$"))?;
        Ok(Self { regex, negate })
    }

    fn excludes(&self, relative_path: &str) -> bool {
        self.regex.is_match(relative_path) != self.negate
    }
}

/// Ignore rules read from a directory's root `.gitignore`
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    patterns: Vec<IgnorePattern>,
}

impl IgnoreRules {
    /// Build rules from `.gitignore` text
    ///
    /// Blank lines and `#` comments are skipped. Lines that do not translate
    /// into a valid expression are logged and skipped.
    pub fn parse(content: &str) -> Self {
        let patterns = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter_map(|line| match IgnorePattern::parse(line) {
                Ok(pattern) => Some(pattern),
                Err(e) => {
                    warn!(pattern = line, error = %e, "skipping invalid ignore pattern");
                    None
                }
            })
            .collect();
        Self { patterns }
    }

    /// Rules of `dir/.gitignore`; none when the file is absent or unreadable
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(GITIGNORE_FILE);
        if !path.is_file() {
            return Self::default();
        }
        match fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read ignore file");
                Self::default()
            }
        }
    }

    /// A path is ignored when any rule excludes it
    pub fn is_ignored(&self, relative_path: &str) -> bool {
        self.patterns
            .iter()
            .any(|pattern| pattern.excludes(relative_path))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// Regular files under `dir` not excluded by its root `.gitignore`
///
/// # Errors
/// Returns SnapshotError::DirectoryNotFound when `dir` is not a directory
pub fn list_files<P: AsRef<Path>>(dir: P) -> SnapResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    ensure_directory(dir)?;

    let rules = IgnoreRules::load(dir);
    debug!(dir = %dir.display(), patterns = rules.len(), "listing files");

    let files = walk_files(dir)?;
    if rules.is_empty() {
        return Ok(files);
    }
    Ok(files
        .into_iter()
        .filter(|path| !rules.is_ignored(&relative_slash_path(dir, path)))
        .collect())
}

/// Regular files under `dir`, optionally filtered by its `.gitignore`
pub fn list_all_files<P: AsRef<Path>>(dir: P, respect_gitignore: bool) -> SnapResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    if respect_gitignore {
        list_files(dir)
    } else {
        ensure_directory(dir)?;
        walk_files(dir)
    }
}

/// Regular files whose name ends with one of `extensions`
///
/// Extensions may be given with or without the leading dot and match
/// case-insensitively. The `.gitignore` is not consulted.
pub fn list_files_by_extension<P: AsRef<Path>>(
    dir: P,
    extensions: &[&str],
) -> SnapResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    ensure_directory(dir)?;

    let suffixes: Vec<String> = extensions
        .iter()
        .map(|ext| format!(".{}", ext.trim_start_matches('.').to_lowercase()))
        .collect();

    Ok(walk_files(dir)?
        .into_iter()
        .filter(|path| {
            let name = path
                .file_name()
                .map(|name| name.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
        })
        .collect())
}

/// Text files under `dir` according to [`is_text_file`]
pub fn list_text_files<P: AsRef<Path>>(dir: P, respect_gitignore: bool) -> SnapResult<Vec<PathBuf>> {
    Ok(list_all_files(dir, respect_gitignore)?
        .into_iter()
        .filter(|path| is_text_file(path))
        .collect())
}

/// Guess whether a file holds text
///
/// Empty files are text, files over 50 MiB never are. Files over 8 KiB are
/// judged by a sample of their start, middle and end. Any NUL byte means
/// binary; otherwise the sample is decoded (UTF-8, else Latin-1) and counts
/// as text when at most 5% of its characters are control characters other
/// than tab, newline and carriage return.
pub fn is_text_file<P: AsRef<Path>>(path: P) -> bool {
    let path = path.as_ref();
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    let size = metadata.len();
    if size == 0 {
        return true;
    }
    if size > MAX_TEXT_FILE_SIZE {
        return false;
    }

    let data = if size > SAMPLE_SIZE {
        sample_file(path, size)
    } else {
        fs::read(path)
    };
    match data {
        Ok(data) => looks_like_text(&data),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "could not read file sample");
            false
        }
    }
}

fn looks_like_text(data: &[u8]) -> bool {
    if data.contains(&0) {
        return false;
    }
    let is_control = |c: char| (c as u32) < 32 && !matches!(c, '\t' | '\n' | '\r');

    let (total, control) = match std::str::from_utf8(data) {
        Ok(text) => text
            .chars()
            .fold((0usize, 0usize), |(t, c), ch| (t + 1, c + is_control(ch) as usize)),
        Err(_) => data
            .iter()
            .fold((0usize, 0usize), |(t, c), b| (t + 1, c + is_control(*b as char) as usize)),
    };
    total == 0 || (control as f64 / total as f64) <= 0.05
}

/// Read 3 KiB from the start, 2 KiB from the middle and 3 KiB from the end
fn sample_file(path: &Path, size: u64) -> std::io::Result<Vec<u8>> {
    let mut file = File::open(path)?;
    let mut sample = Vec::with_capacity(SAMPLE_SIZE as usize);

    for (offset, len) in [
        (0, 3072),
        (size / 2 - 1024, 2048),
        (size.saturating_sub(3072), 3072),
    ] {
        file.seek(SeekFrom::Start(offset))?;
        file.by_ref().take(len).read_to_end(&mut sample)?;
    }

    Ok(sample)
}

fn ensure_directory(dir: &Path) -> SnapResult<()> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(SnapshotError::DirectoryNotFound(dir.to_path_buf()))
    }
}

/// Every regular file below `dir`, never entering `.git`, sorted
fn walk_files(dir: &Path) -> SnapResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_entry(|entry| !is_git_dir(entry))
    {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 => return Err(e.into()),
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}

fn is_git_dir(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name() == GIT_DIR_NAME
}

fn relative_slash_path(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
