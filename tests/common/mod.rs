#![allow(dead_code)]

use git2::{Commit, Oid, Repository, RepositoryInitOptions, Signature, Time};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

pub const AUTHOR: (&str, &str) = ("Ada", "ada@example.com");

/// 2024-06-14 12:00:00 UTC
pub const JUNE_2024: i64 = 1_718_366_400;
pub const DAY: i64 = 86_400;

/// Scratch repository with `main` as its initial branch
pub struct TestRepo {
    pub dir: TempDir,
    pub repo: Repository,
}

impl TestRepo {
    pub fn init() -> Self {
        let dir = TempDir::new().unwrap();
        let repo = init_at(dir.path());
        TestRepo { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    /// Write `relative` and commit it on HEAD as the default author
    pub fn commit_file(&self, relative: &str, content: &str, message: &str, time: i64) -> Oid {
        self.commit_file_as(AUTHOR, relative, content, message, time)
    }

    pub fn commit_file_as(
        &self,
        author: (&str, &str),
        relative: &str,
        content: &str,
        message: &str,
        time: i64,
    ) -> Oid {
        self.write(relative, content);
        self.commit_staged(author, &[relative], &[], message, time, time)
    }

    /// Commit `relative` with distinct author and committer timestamps
    pub fn commit_with_dates(
        &self,
        relative: &str,
        content: &str,
        message: &str,
        author_time: i64,
        commit_time: i64,
    ) -> Oid {
        self.write(relative, content);
        self.commit_staged(AUTHOR, &[relative], &[], message, author_time, commit_time)
    }

    /// Write raw bytes to `relative` and commit them
    pub fn commit_bytes(&self, relative: &str, bytes: &[u8], message: &str, time: i64) -> Oid {
        let path = self.path().join(relative);
        fs::write(path, bytes).unwrap();
        self.commit_staged(AUTHOR, &[relative], &[], message, time, time)
    }

    /// Commit `relative` with the executable bit set
    #[cfg(unix)]
    pub fn commit_executable(&self, relative: &str, content: &str, message: &str, time: i64) -> Oid {
        use std::os::unix::fs::PermissionsExt;

        self.write(relative, content);
        let path = self.path().join(relative);
        fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
        self.commit_staged(AUTHOR, &[relative], &[], message, time, time)
    }

    /// Move `from` to `to` unchanged in one commit
    pub fn rename_file(&self, from: &str, to: &str, message: &str, time: i64) -> Oid {
        let target = self.path().join(to);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::rename(self.path().join(from), target).unwrap();
        self.commit_staged(AUTHOR, &[to], &[from], message, time, time)
    }

    fn commit_staged(
        &self,
        author: (&str, &str),
        added: &[&str],
        removed: &[&str],
        message: &str,
        author_time: i64,
        commit_time: i64,
    ) -> Oid {
        let mut index = self.repo.index().unwrap();
        for relative in removed {
            index.remove_path(Path::new(relative)).unwrap();
        }
        for relative in added {
            index.add_path(Path::new(relative)).unwrap();
        }
        index.write().unwrap();
        let tree = self.repo.find_tree(index.write_tree().unwrap()).unwrap();

        let author_sig = Signature::new(author.0, author.1, &Time::new(author_time, 0)).unwrap();
        let committer = Signature::new(author.0, author.1, &Time::new(commit_time, 0)).unwrap();
        let parents: Vec<Commit> = self
            .repo
            .head()
            .ok()
            .and_then(|head| head.peel_to_commit().ok())
            .into_iter()
            .collect();
        let parents: Vec<&Commit> = parents.iter().collect();

        self.repo
            .commit(Some("HEAD"), &author_sig, &committer, message, &tree, &parents)
            .unwrap()
    }

    /// Commit top-level `files` on top of the first parent's tree
    ///
    /// Moves `update_ref` to the new commit without touching the index or
    /// the working tree, so side branches and merges can be built directly.
    pub fn commit_onto(
        &self,
        update_ref: &str,
        parents: &[Oid],
        files: &[(&str, &str)],
        message: &str,
        time: i64,
    ) -> Oid {
        let parents: Vec<Commit> = parents
            .iter()
            .map(|oid| self.repo.find_commit(*oid).unwrap())
            .collect();
        let base = parents.first().map(|parent| parent.tree().unwrap());
        let mut builder = self.repo.treebuilder(base.as_ref()).unwrap();
        for (name, content) in files {
            let blob = self.repo.blob(content.as_bytes()).unwrap();
            builder.insert(*name, blob, 0o100644).unwrap();
        }
        let tree = self.repo.find_tree(builder.write().unwrap()).unwrap();

        let signature = Signature::new(AUTHOR.0, AUTHOR.1, &Time::new(time, 0)).unwrap();
        let parents: Vec<&Commit> = parents.iter().collect();
        self.repo
            .commit(Some(update_ref), &signature, &signature, message, &tree, &parents)
            .unwrap()
    }

    /// Create `refs/remotes/<remote>/<name>` and a symbolic `<remote>/HEAD` to it
    pub fn remote_branch(&self, remote: &str, name: &str, target: Oid) {
        let full_name = format!("refs/remotes/{remote}/{name}");
        self.repo.reference(&full_name, target, true, "fetch").unwrap();
        self.repo
            .reference_symbolic(&format!("refs/remotes/{remote}/HEAD"), &full_name, true, "clone")
            .unwrap();
    }

    pub fn annotated_tag(&self, name: &str, target: Oid, message: &str) {
        let object = self.repo.find_object(target, None).unwrap();
        let tagger = Signature::new(AUTHOR.0, AUTHOR.1, &Time::new(JUNE_2024, 0)).unwrap();
        self.repo.tag(name, &object, &tagger, message, false).unwrap();
    }

    pub fn lightweight_tag(&self, name: &str, target: Oid) {
        let object = self.repo.find_object(target, None).unwrap();
        self.repo.tag_lightweight(name, &object, false).unwrap();
    }

    pub fn branch(&self, name: &str, target: Oid) {
        let commit = self.repo.find_commit(target).unwrap();
        self.repo.branch(name, &commit, false).unwrap();
    }
}

pub fn init_at(path: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    Repository::init_opts(path, &opts).unwrap()
}

/// A (root) then B, where B rewrites `x.txt` for +3/-1 lines
pub fn two_commit_repo() -> (TestRepo, Oid, Oid) {
    let repo = TestRepo::init();
    let a = repo.commit_file("x.txt", "a\nb\nc\n", "A", JUNE_2024);
    let b = repo.commit_file("x.txt", "a\nB\nc\nd\ne\n", "B", JUNE_2024 + DAY);
    (repo, a, b)
}
