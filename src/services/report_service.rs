use crate::error::{Result as SnapResult, SnapshotError};
use crate::git_ops::repository::RepositoryOperations;
use crate::git_ops::{CommitInfo, GitOperations, MONTHS, SHORT_ID_LEN};
use console::{Color, style};
use std::path::Path;

/// Which commits the log view lists
#[derive(Debug, Clone, Default)]
pub struct LogFilter {
    pub max_count: usize,
    /// Substring of the author name or email
    pub author: Option<String>,
    /// Only commits that touched this path
    pub path: Option<String>,
    /// Full messages and changed files instead of one line per commit
    pub long: bool,
}

/// Report service, prints human readable views of a repository
#[derive(Debug, Clone, Default)]
pub struct ReportService;

impl ReportService {
    pub fn new() -> Self {
        ReportService
    }

    /// List every repository root below `root`
    pub fn repositories(&self, root: &Path) -> SnapResult<Vec<String>> {
        let repositories: Vec<String> = RepositoryOperations::find_repositories(root)?
            .iter()
            .map(|path| path.display().to_string())
            .collect();

        if repositories.is_empty() {
            println!("{}", style("📭 No repositories found.").fg(Color::Yellow));
        } else {
            println!(
                "{} {}",
                style("📂 Repositories:").fg(Color::Green).bold(),
                style(repositories.len()).fg(Color::Cyan).bold()
            );
            println!();
            for repository in &repositories {
                println!("  {} {}", style("●").fg(Color::Green), repository);
            }
        }

        Ok(repositories)
    }

    /// Print the commit log of HEAD
    pub fn log(&self, dir: &Path, filter: &LogFilter) -> SnapResult<()> {
        let git = GitOperations::open(dir)?;
        let commits = git.commits();

        if filter.long && filter.author.is_none() && filter.path.is_none() {
            print!("{}", commits.formatted_commit_log(filter.max_count)?);
            return Ok(());
        }

        let mut selected: Vec<CommitInfo> = match (&filter.author, &filter.path) {
            (_, Some(path)) => commits.file_history(path)?,
            (Some(author), None) => commits.commits_by_author(author)?,
            (None, None) => commits.recent_commits(filter.max_count)?,
        };
        if let (Some(author), Some(_)) = (&filter.author, &filter.path) {
            selected.retain(|commit| {
                commit.author_name.contains(author.as_str())
                    || commit.author_email.contains(author.as_str())
            });
        }
        selected.truncate(filter.max_count);

        if selected.is_empty() {
            println!("{}", style("📭 No commits found.").fg(Color::Yellow));
            return Ok(());
        }

        println!("{}", style("📋 Recent commits:").fg(Color::Green).bold());
        println!();
        for (i, commit) in selected.iter().enumerate() {
            let prefix = if i == 0 {
                style("  ●").fg(Color::Green).bold()
            } else {
                style("  ○").fg(Color::Blue)
            };
            println!(
                "{prefix} {} {} {} {}",
                style(&commit.short_id).fg(Color::Yellow).bold(),
                style(commit.author_date.format("%Y-%m-%d %H:%M")).fg(Color::Green),
                style(&commit.author_name).fg(Color::Cyan),
                commit.summary()
            );
            if filter.long {
                for change in &commit.changed_files {
                    println!("        {} {}", change.change_type.code(), change.path);
                }
            }
        }

        Ok(())
    }

    /// Print one commit with its changed files
    pub fn show(&self, dir: &Path, spec: &str) -> SnapResult<()> {
        let git = GitOperations::open(dir)?;
        let details = git.commit_details(spec)?;

        println!(
            "{} {} {}",
            style("📋").fg(Color::Blue),
            style("Commit details for").fg(Color::White),
            style(spec).fg(Color::Yellow).bold()
        );
        println!();
        println!("{details}");
        Ok(())
    }

    /// Print the textual diff between two revisions
    pub fn diff(&self, dir: &Path, old_spec: &str, new_spec: &str) -> SnapResult<()> {
        let git = GitOperations::open(dir)?;
        let diff = git.diffs().diff_between_commits(old_spec, new_spec)?;

        println!(
            "{} {} {} {} {}",
            style("🔍").fg(Color::Blue),
            style("Differences between").fg(Color::White),
            style(shorten(old_spec)).fg(Color::Yellow).bold(),
            style("and").fg(Color::White),
            style(shorten(new_spec)).fg(Color::Yellow).bold()
        );
        println!();
        if diff.is_empty() {
            println!("{}", style("No differences.").fg(Color::Yellow));
        } else {
            println!("{diff}");
        }
        Ok(())
    }

    /// Print commits per month of `year` plus its busiest day
    pub fn heat_map(&self, dir: &Path, year: i32) -> SnapResult<()> {
        let git = GitOperations::open(dir)?;
        let days = git.history().heat_map(year)?;

        let mut months = [0usize; 12];
        for (day, count) in days.iter() {
            // Keys are YYYY-MM-DD
            if let Some(month) = day.get(5..7).and_then(|m| m.parse::<usize>().ok()) {
                if let Some(slot) = month.checked_sub(1).and_then(|i| months.get_mut(i)) {
                    *slot += count;
                }
            }
        }
        let peak = months.iter().copied().max().unwrap_or(0);

        println!(
            "{} {} {}",
            style("🗓️").fg(Color::Blue),
            style("Commit activity in").fg(Color::White),
            style(year).fg(Color::Yellow).bold()
        );
        println!();
        for (name, count) in MONTHS.iter().zip(months) {
            println!(
                "  {:<10} {:>5} {}",
                name,
                count,
                style(bar(count, peak)).fg(Color::Green)
            );
        }
        println!();

        let busiest = days
            .iter()
            .filter(|(_, count)| *count > 0)
            .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)));
        println!(
            "{} {}",
            style("Total:").fg(Color::White).bold(),
            style(days.total()).fg(Color::Cyan).bold()
        );
        if let Some((day, count)) = busiest {
            println!(
                "{} {} ({count})",
                style("Busiest day:").fg(Color::White).bold(),
                style(day).fg(Color::Yellow)
            );
        }
        Ok(())
    }

    /// Print the most frequently changed paths
    pub fn most_active_files(&self, dir: &Path, limit: usize) -> SnapResult<()> {
        let git = GitOperations::open(dir)?;
        let files = git.history().most_active_files(limit)?;

        if files.is_empty() {
            println!("{}", style("📭 No file changes found.").fg(Color::Yellow));
            return Ok(());
        }

        println!("{}", style("🔥 Most active files:").fg(Color::Green).bold());
        println!();
        for (rank, (path, count)) in files.iter().enumerate() {
            println!(
                "  {:>3}. {:>5}  {}",
                rank + 1,
                style(count).fg(Color::Cyan).bold(),
                path
            );
        }
        Ok(())
    }

    /// Print line-by-line attribution of `path` at HEAD
    pub fn blame(&self, dir: &Path, path: &str) -> SnapResult<()> {
        let git = GitOperations::open(dir)?;
        let blame = git.commits().file_blame(path).map_err(|e| match e {
            SnapshotError::GitOperationFailed(inner) if inner.code() == git2::ErrorCode::NotFound => {
                SnapshotError::InvalidArgument(format!("'{path}' is not tracked at HEAD"))
            }
            other => other,
        })?;

        print!("{blame}");
        Ok(())
    }
}

fn shorten(spec: &str) -> &str {
    let is_hash = spec.len() > SHORT_ID_LEN && spec.chars().all(|c| c.is_ascii_hexdigit());
    if is_hash { &spec[..SHORT_ID_LEN] } else { spec }
}

/// Horizontal bar scaled to at most 40 cells
fn bar(count: usize, peak: usize) -> String {
    const WIDTH: usize = 40;
    if peak == 0 || count == 0 {
        return String::new();
    }
    "█".repeat((count * WIDTH).div_ceil(peak))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortens_full_hashes_only() {
        assert_eq!(shorten("0123456789abcdef0123456789abcdef01234567"), "0123456");
        assert_eq!(shorten("HEAD~1"), "HEAD~1");
        assert_eq!(shorten("v1.0.0-beta"), "v1.0.0-beta");
    }

    #[test]
    fn bars_scale_to_the_peak() {
        assert_eq!(bar(0, 10), "");
        assert_eq!(bar(10, 10).chars().count(), 40);
        assert_eq!(bar(1, 10).chars().count(), 4);
    }
}
