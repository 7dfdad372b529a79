mod common;

use common::{AUTHOR, DAY, JUNE_2024, TestRepo, init_at, two_commit_repo};
use projscan::GitOperations;
use projscan::git_ops::repository::RepositoryOperations;
use projscan::git_ops::{ChangeType, NO_EXTENSION};
use tempfile::TempDir;

#[test]
fn commit_count_matches_head_walk() {
    let (repo, _, _) = two_commit_repo();
    repo.commit_file("y.txt", "y\n", "C", JUNE_2024 + 2 * DAY);

    let git = GitOperations::open(repo.path()).unwrap();
    let walked = git.commits().walk_head(None).unwrap();
    assert_eq!(walked.len(), 3);
    assert_eq!(git.history().commit_count().unwrap(), walked.len());
}

#[test]
fn root_commit_has_no_changes() {
    let (repo, a, _) = two_commit_repo();
    let git = GitOperations::open(repo.path()).unwrap();

    let root = git.commits().find_commit(&a.to_string()).unwrap();
    assert!(root.is_root());
    assert!(root.changed_files.is_empty());
}

#[test]
fn modification_counts_lines_against_first_parent() {
    let (repo, a, b) = two_commit_repo();
    let git = GitOperations::open(repo.path()).unwrap();

    let commit = git.commits().find_commit(&b.to_string()).unwrap();
    assert_eq!(commit.parent_ids, vec![a.to_string()]);
    assert_eq!(commit.short_id, &b.to_string()[..7]);
    assert_eq!(commit.changed_files.len(), 1);

    let change = &commit.changed_files[0];
    assert_eq!(change.path, "x.txt");
    assert_eq!(change.old_path, "x.txt");
    assert_eq!(change.change_type, ChangeType::Modify);
    assert_eq!(change.lines_added, 3);
    assert_eq!(change.lines_deleted, 1);
}

#[test]
fn annotated_and_lightweight_tags() {
    let (repo, a, b) = two_commit_repo();
    repo.annotated_tag("v1", b, "release");
    repo.lightweight_tag("v0", a);

    let git = GitOperations::open(repo.path()).unwrap();
    let tags = git.tags().list_tags().unwrap();
    assert_eq!(tags.len(), 2);

    let v1 = tags.iter().find(|t| t.name == "v1").unwrap();
    assert_eq!(v1.commit_id, b.to_string());
    assert!(v1.annotated);
    assert_eq!(v1.message.as_deref(), Some("release"));
    assert_eq!(v1.tagger_name.as_deref(), Some(AUTHOR.0));
    assert_eq!(v1.tagger_email.as_deref(), Some(AUTHOR.1));
    assert!(v1.tagger_date.is_some());

    let v0 = tags.iter().find(|t| t.name == "v0").unwrap();
    assert_eq!(v0.commit_id, a.to_string());
    assert!(!v0.annotated);
    assert!(v0.message.is_none());
    assert!(v0.tagger_name.is_none());
    assert!(v0.tagger_email.is_none());
    assert!(v0.tagger_date.is_none());
}

#[test]
fn ancestor_branch_is_merged() {
    let (repo, a, b) = two_commit_repo();
    repo.branch("feature", a);

    let git = GitOperations::open(repo.path()).unwrap();
    let branches = git.branches().list_branches().unwrap();
    assert_eq!(branches.len(), 2);

    let main = branches.iter().find(|br| br.name == "main").unwrap();
    assert!(main.current);
    assert!(main.merged);
    assert_eq!(main.commit_id, b.to_string());

    let feature = branches.iter().find(|br| br.name == "feature").unwrap();
    assert!(!feature.current);
    assert!(!feature.remote);
    assert!(feature.merged);
    assert_eq!(branches.iter().filter(|br| br.current).count(), 1);
}

#[test]
fn diverged_branch_is_not_merged() {
    let (repo, _, b) = two_commit_repo();
    repo.branch("topic", b);
    repo.repo.set_head("refs/heads/topic").unwrap();
    repo.commit_file("t.txt", "t\n", "topic work", JUNE_2024 + 3 * DAY);
    repo.repo.set_head("refs/heads/main").unwrap();

    let git = GitOperations::open(repo.path()).unwrap();
    let branches = git.branches().list_branches().unwrap();
    let topic = branches.iter().find(|br| br.name == "topic").unwrap();
    assert!(!topic.merged);
}

#[test]
fn histograms_are_complete_and_sum_to_commit_count() {
    let (repo, _, _) = two_commit_repo();
    let git = GitOperations::open(repo.path()).unwrap();
    let history = git.history();

    let days = history.commits_per_day_of_week().unwrap();
    let hours = history.commits_per_hour().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(hours.len(), 24);
    assert_eq!(days.total(), 2);
    assert_eq!(hours.total(), 2);
}

#[test]
fn heat_map_seeds_every_day_of_the_year() {
    let repo = TestRepo::init();
    repo.commit_file("a.txt", "1\n", "first", JUNE_2024);
    repo.commit_file("a.txt", "2\n", "second", JUNE_2024 + DAY);
    // Mid-2023, outside the requested year
    repo.commit_file("a.txt", "3\n", "third", JUNE_2024 - 366 * DAY);

    let git = GitOperations::open(repo.path()).unwrap();
    let map = git.history().heat_map(2024).unwrap();
    assert_eq!(map.len(), 366);
    assert_eq!(map.total(), 2);
    assert!(map.get("2024-01-01").is_some());
    assert!(map.get("2024-12-31").is_some());

    assert_eq!(git.history().heat_map(2023).unwrap().len(), 365);
}

#[test]
fn contributors_aggregate_by_email() {
    let repo = TestRepo::init();
    repo.commit_file_as(("Ada", "ada@example.com"), "a.txt", "1\n", "one", JUNE_2024);
    repo.commit_file_as(("Ada L.", "ada@example.com"), "a.txt", "1\n2\n", "two", JUNE_2024 + DAY);
    repo.commit_file_as(("Bob", "bob@example.com"), "b.txt", "b\n", "three", JUNE_2024 + 2 * DAY);

    let git = GitOperations::open(repo.path()).unwrap();
    let contributors = git.history().top_contributors(5).unwrap();
    assert_eq!(contributors.len(), 2);

    let ada = &contributors[0];
    assert_eq!(ada.email, "ada@example.com");
    assert_eq!(ada.commit_count, 2);
    // Root commit lines are not counted
    assert_eq!(ada.lines_added, 1);
    assert!(ada.first_commit_date < ada.last_commit_date);

    assert_eq!(git.history().top_contributors(1).unwrap().len(), 1);
}

#[test]
fn most_active_files_rank_by_change_count() {
    let repo = TestRepo::init();
    repo.commit_file("a.txt", "1\n", "root", JUNE_2024);
    repo.commit_file("a.txt", "2\n", "a again", JUNE_2024 + DAY);
    repo.commit_file("b.txt", "b\n", "b", JUNE_2024 + 2 * DAY);
    repo.commit_file("a.txt", "3\n", "a once more", JUNE_2024 + 3 * DAY);

    let git = GitOperations::open(repo.path()).unwrap();
    let active = git.history().most_active_files(10).unwrap();
    let ranked: Vec<(&str, usize)> = active.iter().collect();
    assert_eq!(ranked, vec![("a.txt", 2), ("b.txt", 1)]);

    assert_eq!(git.history().most_active_files(1).unwrap().len(), 1);
}

#[test]
fn snapshot_of_populated_repository() {
    let (repo, a, b) = two_commit_repo();
    repo.commit_file("docs/README", "readme\n", "docs", JUNE_2024 + 2 * DAY);
    repo.annotated_tag("v1", b, "release");

    let git = GitOperations::open(repo.path()).unwrap();
    let snapshot = git.parse_repository(5).unwrap();

    assert_eq!(snapshot.current_branch, "main");
    assert_eq!(snapshot.commit_count, 3);
    assert_eq!(snapshot.statistics.total_commits, 3);
    assert!(!snapshot.has_uncommitted_changes);
    assert!(snapshot.remote_url.is_none());
    assert_eq!(snapshot.tags.len(), 1);
    assert_eq!(snapshot.top_contributors.len(), 1);

    let created = git
        .commits()
        .find_commit(&a.to_string())
        .map(|commit| commit.author_date);
    assert_eq!(snapshot.creation_date, created);
    assert_eq!(
        snapshot.last_updated_date,
        snapshot.latest_commit.as_ref().map(|c| c.author_date)
    );
    assert_eq!(snapshot.file_extension_counts.get("txt"), Some(&1));
    assert_eq!(snapshot.file_extension_counts.get(NO_EXTENSION), Some(&1));
}

#[test]
fn dirty_working_tree_is_reported() {
    let (repo, _, _) = two_commit_repo();
    repo.write("x.txt", "changed\n");

    let git = GitOperations::open(repo.path()).unwrap();
    assert!(git.history().has_uncommitted_changes().unwrap());
}

#[test]
fn empty_repository_snapshot() {
    let repo = TestRepo::init();
    let snapshot = projscan::parse_repository(repo.path(), 5).unwrap();

    assert_eq!(snapshot.commit_count, 0);
    assert!(snapshot.latest_commit.is_none());
    assert!(!snapshot.has_uncommitted_changes);
    assert!(snapshot.creation_date.is_none());
    assert!(snapshot.last_updated_date.is_none());
    assert!(snapshot.branches.is_empty());
    assert!(snapshot.tags.is_empty());
    assert!(snapshot.top_contributors.is_empty());
    assert!(snapshot.file_extension_counts.is_empty());
    assert_eq!(snapshot.statistics.commits_per_day_of_week.len(), 7);
    assert_eq!(snapshot.statistics.commits_per_hour.total(), 0);
}

#[test]
fn parsing_twice_yields_equal_snapshots() {
    let (repo, a, b) = two_commit_repo();
    repo.branch("feature", a);
    repo.annotated_tag("v1", b, "release");

    let first = projscan::parse_repository(repo.path(), 5).unwrap();
    let second = projscan::parse_repository(repo.path(), 5).unwrap();
    assert_eq!(first, second);
}

#[test]
fn unknown_revision_is_not_found() {
    let (repo, _, b) = two_commit_repo();
    let git = GitOperations::open(repo.path()).unwrap();

    assert!(git.commits().find_commit("nope").is_none());
    assert_eq!(
        git.commits().find_commit("HEAD").map(|commit| commit.id),
        Some(b.to_string())
    );
}

#[test]
fn single_repository_is_found_and_valid() {
    let root = TempDir::new().unwrap();
    let sub = root.path().join("sub");
    std::fs::create_dir(&sub).unwrap();
    init_at(&sub);
    std::fs::create_dir(root.path().join("plain")).unwrap();

    let found = RepositoryOperations::find_repositories(root.path()).unwrap();
    assert_eq!(found.len(), 1);
    assert!(found[0].ends_with("sub"));
    assert!(RepositoryOperations::is_valid_repository(&found[0]));
}

#[test]
fn opening_a_plain_directory_fails() {
    let dir = TempDir::new().unwrap();
    assert!(GitOperations::open(dir.path()).is_err());
    assert!(projscan::parse_repository(dir.path().join("missing"), 5).is_err());
}

#[test]
fn lookups_by_author_date_and_path() {
    let repo = TestRepo::init();
    repo.commit_file_as(("Ada", "ada@example.com"), "a.txt", "1\n", "one", JUNE_2024);
    repo.commit_file_as(("Bob", "bob@example.com"), "b.txt", "b\n", "two", JUNE_2024 + DAY);
    repo.commit_file_as(("Ada", "ada@example.com"), "a.txt", "2\n", "three", JUNE_2024 + 2 * DAY);

    let git = GitOperations::open(repo.path()).unwrap();
    let commits = git.commits();

    assert_eq!(commits.all_commits().unwrap().len(), 3);
    assert_eq!(commits.recent_commits(2).unwrap().len(), 2);

    let by_bob = commits.commits_by_author("bob@").unwrap();
    assert_eq!(by_bob.len(), 1);
    assert_eq!(by_bob[0].summary(), "two");

    let since = chrono::DateTime::from_timestamp(JUNE_2024 + DAY, 0).unwrap();
    let until = chrono::DateTime::from_timestamp(JUNE_2024 + 2 * DAY, 0).unwrap();
    let in_range = commits.commits_by_date_range(since, until).unwrap();
    assert_eq!(in_range.len(), 2);

    let history: Vec<String> = commits
        .file_history("a.txt")
        .unwrap()
        .into_iter()
        .map(|commit| commit.summary().to_string())
        .collect();
    assert_eq!(history, vec!["three", "one"]);
}

#[test]
fn textual_log_patch_and_blame() {
    let (repo, a, b) = two_commit_repo();
    let git = GitOperations::open(repo.path()).unwrap();

    let log = git.commits().formatted_commit_log(5).unwrap();
    assert!(log.contains(&format!("Commit: {b}")));
    assert!(log.contains("M x.txt"));

    let patch = git
        .diffs()
        .diff_between_commits(&a.to_string(), "HEAD")
        .unwrap();
    assert!(patch.contains("-b\n"));
    assert!(patch.contains("+B\n"));
    assert!(git.diffs().diff_between_commits("nope", "HEAD").is_err());

    let blame = git.commits().file_blame("x.txt").unwrap();
    assert_eq!(blame.lines().count(), 5);
    assert!(blame.lines().next().unwrap().contains("(Ada - 2024-06-14): a"));
}

#[test]
fn last_updated_date_is_the_author_date() {
    let repo = TestRepo::init();
    repo.commit_with_dates("x.txt", "x\n", "amended later", JUNE_2024, JUNE_2024 + 30 * DAY);

    let snapshot = projscan::parse_repository(repo.path(), 5).unwrap();
    let authored = chrono::DateTime::from_timestamp(JUNE_2024, 0);
    assert_eq!(snapshot.last_updated_date, authored);
    assert_eq!(snapshot.creation_date, authored);

    let latest = snapshot.latest_commit.unwrap();
    assert_eq!(
        Some(latest.commit_date),
        chrono::DateTime::from_timestamp(JUNE_2024 + 30 * DAY, 0)
    );
}

#[test]
fn detached_head_marks_no_branch_merged() {
    let (repo, a, _) = two_commit_repo();
    repo.branch("feature", a);
    repo.repo.set_head_detached(a).unwrap();

    let git = GitOperations::open(repo.path()).unwrap();
    assert_eq!(git.branches().get_current_branch_name().unwrap(), "HEAD");

    let branches = git.branches().list_branches().unwrap();
    assert_eq!(branches.len(), 2);
    assert!(branches.iter().all(|br| !br.merged && !br.current));
}

#[test]
fn merge_commit_diffs_against_first_parent_only() {
    let repo = TestRepo::init();
    let a = repo.commit_file("x.txt", "x\n", "A", JUNE_2024);
    let side_file = [("side.txt", "side\n")];
    let side = repo.commit_onto("refs/heads/side", &[a], &side_file, "side", JUNE_2024 + DAY);
    let main = repo.commit_file("main.txt", "main\n", "main work", JUNE_2024 + 2 * DAY);
    let merge = repo.commit_onto("HEAD", &[main, side], &side_file, "merge", JUNE_2024 + 3 * DAY);

    let git = GitOperations::open(repo.path()).unwrap();
    let commit = git.commits().find_commit(&merge.to_string()).unwrap();
    assert_eq!(commit.parent_ids, vec![main.to_string(), side.to_string()]);

    let changes: Vec<(&str, ChangeType)> = commit
        .changed_files
        .iter()
        .map(|change| (change.path.as_str(), change.change_type))
        .collect();
    assert_eq!(changes, vec![("side.txt", ChangeType::Add)]);
    assert_eq!(commit.changed_files[0].lines_added, 1);
}

#[test]
fn binary_file_counts_no_lines() {
    let repo = TestRepo::init();
    repo.commit_file("README", "readme\n", "root", JUNE_2024);
    let bytes: [u8; 7] = [0, 159, 146, 150, 0, 10, 0];
    let binary = repo.commit_bytes("blob.bin", &bytes, "binary", JUNE_2024 + DAY);

    let git = GitOperations::open(repo.path()).unwrap();
    let commit = git.commits().find_commit(&binary.to_string()).unwrap();
    assert_eq!(commit.changed_files.len(), 1);

    let change = &commit.changed_files[0];
    assert_eq!(change.change_type, ChangeType::Add);
    assert_eq!((change.lines_added, change.lines_deleted), (0, 0));
}

#[test]
fn regular_file_mode_bits() {
    let (repo, _, b) = two_commit_repo();
    let git = GitOperations::open(repo.path()).unwrap();

    let commit = git.commits().find_commit(&b.to_string()).unwrap();
    assert_eq!(commit.changed_files[0].mode, 0o100644);
}

#[cfg(unix)]
#[test]
fn executable_file_mode_bits() {
    let (repo, _, _) = two_commit_repo();
    let script = "#!/bin/sh\necho hi\n";
    let script = repo.commit_executable("run.sh", script, "script", JUNE_2024 + 2 * DAY);

    let git = GitOperations::open(repo.path()).unwrap();
    let commit = git.commits().find_commit(&script.to_string()).unwrap();
    assert_eq!(commit.changed_files.len(), 1);
    assert_eq!(commit.changed_files[0].path, "run.sh");
    assert_eq!(commit.changed_files[0].mode, 0o100755);
}

#[test]
fn remote_branches_are_listed_without_symbolic_head() {
    let (repo, a, _) = two_commit_repo();
    repo.remote_branch("origin", "main", a);

    let git = GitOperations::open(repo.path()).unwrap();
    let branches = git.branches().list_branches().unwrap();
    assert_eq!(branches.len(), 2);
    assert!(branches.iter().all(|br| br.name != "HEAD"));

    let remote = branches.iter().find(|br| br.remote).unwrap();
    assert_eq!(remote.name, "main");
    assert_eq!(remote.remote_name.as_deref(), Some("origin"));
    assert_eq!(remote.commit_id, a.to_string());
    assert!(!remote.current);
    assert!(remote.merged);
    assert!(remote.tracking_branch.is_none());
}

#[test]
fn renamed_file_keeps_its_old_path() {
    let repo = TestRepo::init();
    repo.commit_file("old.txt", "one\ntwo\nthree\nfour\n", "add", JUNE_2024);
    let moved = repo.rename_file("old.txt", "docs/new.txt", "move", JUNE_2024 + DAY);

    let git = GitOperations::open(repo.path()).unwrap();
    let commit = git.commits().find_commit(&moved.to_string()).unwrap();
    assert_eq!(commit.changed_files.len(), 1);

    let change = &commit.changed_files[0];
    assert_eq!(change.change_type, ChangeType::Rename);
    assert_eq!(change.path, "docs/new.txt");
    assert_eq!(change.old_path, "old.txt");
    assert_ne!(change.old_path, change.path);
}

#[test]
fn extension_census_uses_the_tree_path() {
    let repo = TestRepo::init();
    repo.commit_file("conf.d/Makefile", "all:\n", "make", JUNE_2024);
    repo.commit_file(".gitignore", "*.log\n", "ignore", JUNE_2024 + DAY);
    repo.commit_file("src/Main.JAVA", "class Main {}\n", "java", JUNE_2024 + 2 * DAY);

    let git = GitOperations::open(repo.path()).unwrap();
    let counts = git.history().file_extension_counts().unwrap();
    assert_eq!(counts.get("d/makefile"), Some(&1));
    assert_eq!(counts.get(NO_EXTENSION), Some(&1));
    assert_eq!(counts.get("java"), Some(&1));
    assert_eq!(counts.len(), 3);
}
