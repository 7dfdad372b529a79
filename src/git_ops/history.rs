//! History aggregation
//!
//! Everything here walks the commit graph and folds it into statistics:
//! contributor rankings, activity histograms, change hot spots and the
//! extension census of the latest tree. Per-commit failures never abort an
//! aggregation; an unreadable commit or diff simply contributes nothing.

use super::commit::CommitOperations;
use super::types::{
    ContributorInfo, DAYS_OF_WEEK, MONTHS, NO_EXTENSION, NULL_DEVICE, OrderedCounts,
    RepositoryStatistics, ChangeType, git_time_to_utc,
};
use crate::error::{Result as SnapResult, SnapshotError};
use chrono::{DateTime, Datelike, Local, NaiveDate, Timelike, Utc};
use git2::{ObjectType, Repository, StatusOptions, TreeWalkMode, TreeWalkResult};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Result of a single pass over the full history
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryAnalysis {
    pub statistics: RepositoryStatistics,
    pub top_contributors: Vec<ContributorInfo>,
    pub creation_date: Option<DateTime<Utc>>,
}

/// Running totals for one contributor during a walk
struct ContributorTally {
    info: ContributorInfo,
    /// Position of first appearance, used to keep ties stable
    order: usize,
}

/// Accumulates per-commit facts into the aggregate views
struct HistoryFold {
    total_commits: usize,
    changed_files: usize,
    per_day: OrderedCounts,
    per_hour: OrderedCounts,
    per_month: OrderedCounts,
    contributors: HashMap<String, ContributorTally>,
    creation_date: Option<DateTime<Utc>>,
}

impl HistoryFold {
    fn new() -> Self {
        Self {
            total_commits: 0,
            changed_files: 0,
            per_day: day_of_week_buckets(),
            per_hour: hour_buckets(),
            per_month: month_buckets(),
            contributors: HashMap::new(),
            creation_date: None,
        }
    }

    fn add(&mut self, name: &str, email: &str, date: DateTime<Utc>, lines: Option<(i32, i32, usize)>) {
        self.total_commits += 1;

        let local = date.with_timezone(&Local);
        self.per_day
            .increment_at(local.weekday().num_days_from_monday() as usize);
        self.per_hour.increment_at(local.hour() as usize);
        self.per_month.increment_at(local.month0() as usize);

        self.creation_date = Some(self.creation_date.map_or(date, |earliest| earliest.min(date)));

        let order = self.contributors.len();
        let tally = self
            .contributors
            .entry(email.to_string())
            .or_insert_with(|| ContributorTally {
                info: ContributorInfo {
                    name: name.to_string(),
                    email: email.to_string(),
                    commit_count: 0,
                    lines_added: 0,
                    lines_deleted: 0,
                    first_commit_date: date,
                    last_commit_date: date,
                },
                order,
            });
        let info = &mut tally.info;
        info.commit_count += 1;
        info.first_commit_date = info.first_commit_date.min(date);
        info.last_commit_date = info.last_commit_date.max(date);

        if let Some((added, deleted, files)) = lines {
            info.lines_added += added;
            info.lines_deleted += deleted;
            self.changed_files += files;
        }
    }

    fn finish(self, top_n: usize) -> HistoryAnalysis {
        let average = if self.total_commits == 0 {
            0.0
        } else {
            self.changed_files as f64 / self.total_commits as f64
        };

        HistoryAnalysis {
            statistics: RepositoryStatistics {
                total_commits: self.total_commits,
                commits_per_day_of_week: self.per_day,
                commits_per_hour: self.per_hour,
                commits_per_month: self.per_month,
                average_changed_files_per_commit: average,
            },
            top_contributors: rank_contributors(self.contributors, top_n),
            creation_date: self.creation_date,
        }
    }
}

/// Operations that aggregate over the commit history
pub struct HistoryOperations<'a> {
    repo: &'a Repository,
    commits: CommitOperations<'a>,
}

impl<'a> HistoryOperations<'a> {
    /// Create a new HistoryOperations instance
    pub fn new(repo: &'a Repository) -> Self {
        Self {
            repo,
            commits: CommitOperations::new(repo),
        }
    }

    /// Number of commits reachable from HEAD
    pub fn commit_count(&self) -> SnapResult<usize> {
        self.commits.commit_count()
    }

    /// Check if the working tree or index differs from HEAD
    ///
    /// Untracked files count as changes, ignored files do not.
    pub fn has_uncommitted_changes(&self) -> SnapResult<bool> {
        let mut opts = StatusOptions::new();
        opts.include_untracked(true);
        opts.include_ignored(false);
        opts.exclude_submodules(true);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(SnapshotError::GitOperationFailed)?;
        Ok(!statuses.is_empty())
    }

    /// Walk every reachable commit once and compute statistics, the top
    /// `top_n` contributors and the creation date together
    pub fn analyze(&self, top_n: usize) -> SnapResult<HistoryAnalysis> {
        let mut fold = HistoryFold::new();

        for oid in self.commits.walk_all()? {
            let commit = match self.repo.find_commit(oid) {
                Ok(commit) => commit,
                Err(e) => {
                    debug!(commit = %oid, error = %e, "skipping unreadable commit");
                    continue;
                }
            };
            let author = commit.author();
            let lines = (commit.parent_count() > 0).then(|| {
                let changes = self.commits.changed_files(&commit);
                let added = changes.iter().map(|c| c.lines_added).sum();
                let deleted = changes.iter().map(|c| c.lines_deleted).sum();
                (added, deleted, changes.len())
            });

            fold.add(
                &String::from_utf8_lossy(author.name_bytes()),
                &String::from_utf8_lossy(author.email_bytes()),
                git_time_to_utc(author.when()),
                lines,
            );
        }

        Ok(fold.finish(top_n))
    }

    /// The `max_count` contributors with the most commits
    ///
    /// Contributors are identified by author email; the first name seen for
    /// an email is kept. Ties keep the order of first appearance.
    pub fn top_contributors(&self, max_count: usize) -> SnapResult<Vec<ContributorInfo>> {
        Ok(self.analyze(max_count)?.top_contributors)
    }

    /// Commits per day of week, Monday first, in local time
    pub fn commits_per_day_of_week(&self) -> SnapResult<OrderedCounts> {
        let mut counts = day_of_week_buckets();
        for date in self.author_dates()? {
            let local = date.with_timezone(&Local);
            counts.increment_at(local.weekday().num_days_from_monday() as usize);
        }
        Ok(counts)
    }

    /// Commits per hour of day (0-23), in local time
    pub fn commits_per_hour(&self) -> SnapResult<OrderedCounts> {
        let mut counts = hour_buckets();
        for date in self.author_dates()? {
            counts.increment_at(date.with_timezone(&Local).hour() as usize);
        }
        Ok(counts)
    }

    /// Commits per calendar day of `year`, every day present
    ///
    /// Keys are `YYYY-MM-DD` in local time; the year runs from Jan 1
    /// 00:00:00 to Dec 31 23:59:59 inclusive.
    pub fn heat_map(&self, year: i32) -> SnapResult<OrderedCounts> {
        let mut counts = year_buckets(year)?;
        for date in self.author_dates()? {
            let local = date.with_timezone(&Local);
            if local.year() == year {
                counts.increment_at(local.ordinal0() as usize);
            }
        }
        Ok(counts)
    }

    /// Paths changed most often across all non-root commits
    ///
    /// Renames count toward the new path; deletions are not counted.
    /// Ordered by change count, then path.
    pub fn most_active_files(&self, limit: usize) -> SnapResult<OrderedCounts> {
        let mut counts: HashMap<String, usize> = HashMap::new();

        for oid in self.commits.walk_all()? {
            let Ok(commit) = self.repo.find_commit(oid) else {
                continue;
            };
            if commit.parent_count() == 0 {
                continue;
            }
            for change in self.commits.changed_files(&commit) {
                if change.change_type == ChangeType::Delete || change.path == NULL_DEVICE {
                    continue;
                }
                *counts.entry(change.path).or_insert(0) += 1;
            }
        }

        let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked.truncate(limit);
        Ok(OrderedCounts::from(ranked))
    }

    /// Count the files of HEAD's tree by the lower-cased extension of their path
    pub fn file_extension_counts(&self) -> SnapResult<BTreeMap<String, usize>> {
        let mut counts = BTreeMap::new();
        let Some(head) = self.commits.get_head_commit()? else {
            return Ok(counts);
        };

        head.tree()?.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob) {
                let path = format!("{root}{}", String::from_utf8_lossy(entry.name_bytes()));
                *counts.entry(extension_of(&path)).or_insert(0) += 1;
            }
            TreeWalkResult::Ok
        })?;

        Ok(counts)
    }

    /// Author date of the earliest commit reachable from any reference
    pub fn creation_date(&self) -> SnapResult<Option<DateTime<Utc>>> {
        Ok(self.author_dates()?.into_iter().min())
    }

    fn author_dates(&self) -> SnapResult<Vec<DateTime<Utc>>> {
        Ok(self
            .commits
            .walk_all()?
            .into_iter()
            .filter_map(|oid| self.repo.find_commit(oid).ok())
            .map(|commit| git_time_to_utc(commit.author().when()))
            .collect())
    }
}

/// Lower-cased text after the last `.` of a tree path
///
/// The dot must not be the first character of the path, so a root dot file
/// such as `.gitignore` has no extension. A dotted directory counts too:
/// `conf.d/Makefile` yields `d/makefile`.
pub fn extension_of(path: &str) -> String {
    match path.rfind('.') {
        Some(index) if index > 0 => path[index + 1..].to_lowercase(),
        _ => NO_EXTENSION.to_string(),
    }
}

fn rank_contributors(
    contributors: HashMap<String, ContributorTally>,
    top_n: usize,
) -> Vec<ContributorInfo> {
    let mut tallies: Vec<ContributorTally> = contributors.into_values().collect();
    tallies.sort_by_key(|tally| tally.order);
    // Stable sort keeps first-appearance order among equal counts
    tallies.sort_by(|a, b| b.info.commit_count.cmp(&a.info.commit_count));
    tallies.truncate(top_n);
    tallies.into_iter().map(|tally| tally.info).collect()
}

fn day_of_week_buckets() -> OrderedCounts {
    OrderedCounts::seeded(DAYS_OF_WEEK)
}

fn hour_buckets() -> OrderedCounts {
    OrderedCounts::seeded((0..24).map(|hour| hour.to_string()))
}

fn month_buckets() -> OrderedCounts {
    OrderedCounts::seeded(MONTHS)
}

fn year_buckets(year: i32) -> SnapResult<OrderedCounts> {
    let start = NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| SnapshotError::InvalidArgument(format!("year out of range: {year}")))?;
    Ok(OrderedCounts::seeded(
        start
            .iter_days()
            .take_while(|day| day.year() == year)
            .map(|day| day.format("%Y-%m-%d").to_string()),
    ))
}
