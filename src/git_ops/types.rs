//! Shared types and constants for git operations
//!
//! This module contains the data model produced by repository introspection.
//! Every value is built fresh per call and serialized with camelCase keys so
//! the JSON output matches what downstream tooling expects.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Length of the abbreviated commit id
pub const SHORT_ID_LEN: usize = 7;

/// Bucket used by the extension census for paths without an extension
pub const NO_EXTENSION: &str = "(no extension)";

/// Path reported for the missing side of an add/delete
pub const NULL_DEVICE: &str = "/dev/null";

/// Day names in the order the day-of-week histogram is emitted
pub const DAYS_OF_WEEK: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Month names in the order the month histogram is emitted
pub const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Convert a libgit2 timestamp into a UTC date
pub fn git_time_to_utc(time: git2::Time) -> DateTime<Utc> {
    DateTime::from_timestamp(time.seconds(), 0).unwrap_or_default()
}

/// Kind of change a diff reports for one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Add,
    Modify,
    Delete,
    Rename,
    Copy,
}

impl ChangeType {
    /// Map a libgit2 delta status; anything without a direct counterpart is a modification
    pub fn from_delta(status: git2::Delta) -> Self {
        match status {
            git2::Delta::Added => ChangeType::Add,
            git2::Delta::Modified => ChangeType::Modify,
            git2::Delta::Deleted => ChangeType::Delete,
            git2::Delta::Renamed => ChangeType::Rename,
            git2::Delta::Copied => ChangeType::Copy,
            _ => ChangeType::Modify,
        }
    }

    /// Single-letter code used in textual logs
    pub fn code(&self) -> char {
        match self {
            ChangeType::Add => 'A',
            ChangeType::Modify => 'M',
            ChangeType::Delete => 'D',
            ChangeType::Rename => 'R',
            ChangeType::Copy => 'C',
        }
    }
}

/// Information about a single file change
///
/// Line counts are best effort: binary content or a failed patch leaves
/// them at zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    pub change_type: ChangeType,
    /// Path after the change
    pub path: String,
    /// Path before the change, equal to `path` unless renamed or copied
    pub old_path: String,
    pub lines_added: i32,
    pub lines_deleted: i32,
    /// File mode bits of the new side (0 for deletions)
    pub mode: u32,
}

/// Information about a Git commit
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInfo {
    pub id: String,
    pub short_id: String,
    pub message: String,
    pub author_name: String,
    pub author_email: String,
    pub author_date: DateTime<Utc>,
    pub committer_name: String,
    pub committer_email: String,
    pub commit_date: DateTime<Utc>,
    pub parent_ids: Vec<String>,
    /// Changes against the first parent; empty for root commits
    pub changed_files: Vec<FileChange>,
}

impl CommitInfo {
    /// First line of the commit message
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn is_root(&self) -> bool {
        self.parent_ids.is_empty()
    }
}

/// Information about a local or remote branch
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BranchInfo {
    /// Short name, without `refs/heads/` or the remote prefix
    pub name: String,
    pub current: bool,
    pub remote: bool,
    pub remote_name: Option<String>,
    pub commit_id: String,
    pub tracking_branch: Option<String>,
    /// Tip is the current branch tip or one of its ancestors
    pub merged: bool,
}

/// Information about a tag
///
/// Tagger fields and message are only present for annotated tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagInfo {
    pub name: String,
    /// Commit the tag resolves to, through the tag object when annotated
    pub commit_id: String,
    pub annotated: bool,
    pub message: Option<String>,
    pub tagger_name: Option<String>,
    pub tagger_email: Option<String>,
    pub tagger_date: Option<DateTime<Utc>>,
}

/// Information about a repository contributor, keyed by email
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContributorInfo {
    pub name: String,
    pub email: String,
    pub commit_count: i32,
    pub lines_added: i32,
    pub lines_deleted: i32,
    pub first_commit_date: DateTime<Utc>,
    pub last_commit_date: DateTime<Utc>,
}

/// Fixed-key counter that keeps its keys in insertion order
///
/// Histograms are seeded with every bucket up front, so the output always
/// carries the complete distribution. Serializes as a JSON object.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderedCounts(Vec<(String, usize)>);

impl OrderedCounts {
    /// Create a counter with every key present and set to zero
    pub fn seeded<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self(keys.into_iter().map(|k| (k.into(), 0)).collect())
    }

    /// Increment an existing bucket; unknown keys are ignored
    pub fn increment(&mut self, key: &str) -> bool {
        match self.0.iter_mut().find(|(k, _)| k == key) {
            Some((_, count)) => {
                *count += 1;
                true
            }
            None => false,
        }
    }

    /// Increment a bucket by position
    pub fn increment_at(&mut self, index: usize) {
        if let Some((_, count)) = self.0.get_mut(index) {
            *count += 1;
        }
    }

    pub fn get(&self, key: &str) -> Option<usize> {
        self.0.iter().find(|(k, _)| k == key).map(|(_, c)| *c)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sum of all buckets
    pub fn total(&self) -> usize {
        self.0.iter().map(|(_, c)| c).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.0.iter().map(|(k, c)| (k.as_str(), *c))
    }
}

impl From<Vec<(String, usize)>> for OrderedCounts {
    fn from(entries: Vec<(String, usize)>) -> Self {
        Self(entries)
    }
}

impl Serialize for OrderedCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, count) in &self.0 {
            map.serialize_entry(key, count)?;
        }
        map.end()
    }
}

/// Activity statistics over all reachable commits
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryStatistics {
    pub total_commits: usize,
    pub commits_per_day_of_week: OrderedCounts,
    pub commits_per_hour: OrderedCounts,
    pub commits_per_month: OrderedCounts,
    pub average_changed_files_per_commit: f64,
}

/// Point-in-time structural summary of a repository
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySnapshot {
    pub name: String,
    pub path: String,
    pub current_branch: String,
    pub remote_url: Option<String>,
    pub latest_commit: Option<CommitInfo>,
    pub branches: Vec<BranchInfo>,
    pub tags: Vec<TagInfo>,
    pub has_uncommitted_changes: bool,
    pub commit_count: usize,
    pub statistics: RepositoryStatistics,
    pub top_contributors: Vec<ContributorInfo>,
    pub creation_date: Option<DateTime<Utc>>,
    pub last_updated_date: Option<DateTime<Utc>>,
    pub file_extension_counts: BTreeMap<String, usize>,
}

/// Statistics about file differences
///
/// Contains aggregated information about the changes of one commit,
/// including file counts and line change statistics.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DiffStats {
    /// Total number of files changed
    pub total_files: usize,
    /// Number of lines added across all files
    pub additions: i32,
    /// Number of lines deleted across all files
    pub deletions: i32,
}

impl DiffStats {
    /// Sum up a list of file changes
    pub fn from_changes(changes: &[FileChange]) -> Self {
        changes.iter().fold(
            Self {
                total_files: changes.len(),
                ..Self::default()
            },
            |mut stats, change| {
                stats.additions += change.lines_added;
                stats.deletions += change.lines_deleted;
                stats
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_delta_kinds_map_to_modify() {
        assert_eq!(ChangeType::from_delta(git2::Delta::Added), ChangeType::Add);
        assert_eq!(ChangeType::from_delta(git2::Delta::Copied), ChangeType::Copy);
        assert_eq!(
            ChangeType::from_delta(git2::Delta::Typechange),
            ChangeType::Modify
        );
        assert_eq!(
            ChangeType::from_delta(git2::Delta::Unmodified),
            ChangeType::Modify
        );
    }

    #[test]
    fn change_type_serializes_upper_case() {
        let json = serde_json::to_string(&ChangeType::Rename).unwrap();
        assert_eq!(json, "\"RENAME\"");
    }

    #[test]
    fn ordered_counts_keep_seed_order() {
        let mut counts = OrderedCounts::seeded(DAYS_OF_WEEK);
        assert!(counts.increment("Friday"));
        assert!(!counts.increment("Caturday"));
        counts.increment_at(0);

        let json = serde_json::to_string(&counts).unwrap();
        assert!(json.starts_with("{\"Monday\":1,\"Tuesday\":0"));
        assert_eq!(counts.total(), 2);
        assert_eq!(counts.get("Friday"), Some(1));
        assert_eq!(counts.len(), 7);
    }

    #[test]
    fn diff_stats_sum_line_counts() {
        let change = |added, deleted| FileChange {
            change_type: ChangeType::Modify,
            path: "a".into(),
            old_path: "a".into(),
            lines_added: added,
            lines_deleted: deleted,
            mode: 0o100644,
        };
        let stats = DiffStats::from_changes(&[change(3, 1), change(2, 0)]);
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.additions, 5);
        assert_eq!(stats.deletions, 1);
    }
}
