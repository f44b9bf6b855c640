use super::{ChangeStatus, FileStat, NameStatus, VcsQuery};
use crate::error::GitError;
use git2::{Delta, DiffFindOptions, DiffFormat, DiffOptions, ErrorCode, Repository, Sort};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Map a git2 failure onto the query that raised it
fn query_err(operation: &'static str) -> impl Fn(git2::Error) -> GitError {
    move |e| GitError::query(operation, e.message())
}

/// git2-backed repository access
///
/// `Repository` is not `Sync`, so queries are serialized behind a mutex.
pub struct GitWalker {
    repo: Mutex<Repository>,
    repo_path: PathBuf,
}

impl GitWalker {
    /// Discover and open a git repository from any path within it
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self, GitError> {
        let path = path.as_ref();

        let repo = Repository::discover(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitError::RepoNotFound(path.display().to_string()),
            _ => GitError::OpenFailed(e.message().to_string()),
        })?;

        // Bare repositories have no working directory
        let repo_path = repo
            .workdir()
            .unwrap_or_else(|| repo.path())
            .to_path_buf();

        tracing::info!("Opened git repository at: {}", repo_path.display());

        Ok(Self {
            repo: Mutex::new(repo),
            repo_path,
        })
    }

    /// Open the repository at exactly `path` without walking up
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, GitError> {
        let path = path.as_ref();
        let repo = Repository::open(path).map_err(|e| match e.code() {
            ErrorCode::NotFound => GitError::RepoNotFound(path.display().to_string()),
            _ => GitError::OpenFailed(e.message().to_string()),
        })?;
        Ok(Self {
            repo: Mutex::new(repo),
            repo_path: path.to_path_buf(),
        })
    }

    /// Get the repository root path
    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    fn lock(&self) -> Result<MutexGuard<'_, Repository>, GitError> {
        self.repo
            .lock()
            .map_err(|_| GitError::query("lock", "repository handle poisoned"))
    }

    fn find_commit<'r>(
        repo: &'r Repository,
        spec: &str,
    ) -> Result<git2::Commit<'r>, GitError> {
        let object = repo.revparse_single(spec).map_err(|e| match e.code() {
            ErrorCode::NotFound | ErrorCode::InvalidSpec | ErrorCode::Ambiguous => {
                GitError::RefNotFound(spec.to_string())
            }
            _ => GitError::query("rev-parse", e.message()),
        })?;
        object
            .peel_to_commit()
            .map_err(query_err("rev-parse"))
    }

    /// Diff of a commit against its first parent, or the empty tree for a root commit
    ///
    /// Merge commits are compared with their first parent only.
    fn commit_diff<'r>(
        repo: &'r Repository,
        sha: &str,
        opts: &mut DiffOptions,
    ) -> Result<git2::Diff<'r>, GitError> {
        let commit = Self::find_commit(repo, sha)?;
        let tree = commit.tree().map_err(query_err("diff"))?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(
                commit
                    .parent(0)
                    .and_then(|p| p.tree())
                    .map_err(query_err("diff"))?,
            )
        } else {
            None
        };

        let mut diff = repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(opts))
            .map_err(query_err("diff"))?;

        let mut find = DiffFindOptions::new();
        find.renames(true).copies(true);
        diff.find_similar(Some(&mut find))
            .map_err(query_err("diff"))?;
        Ok(diff)
    }

    /// Creation time of a tag: tagger date when annotated, commit date otherwise
    fn tag_time(repo: &Repository, name: &str) -> Result<i64, GitError> {
        let object = repo
            .revparse_single(&format!("refs/tags/{}", name))
            .map_err(query_err("tag listing"))?;
        if let Some(tagger) = object.as_tag().and_then(|t| t.tagger()) {
            return Ok(tagger.when().seconds());
        }
        let commit = object.peel_to_commit().map_err(query_err("tag listing"))?;
        Ok(commit.time().seconds())
    }
}

fn delta_path(delta: &git2::DiffDelta<'_>) -> String {
    delta
        .new_file()
        .path()
        .or_else(|| delta.old_file().path())
        .map(|p| p.display().to_string())
        .unwrap_or_default()
}

impl VcsQuery for GitWalker {
    fn list_tags(&self) -> Result<Vec<String>, GitError> {
        let repo = self.lock()?;
        let names = repo.tag_names(None).map_err(query_err("tag listing"))?;

        let mut dated = Vec::with_capacity(names.len());
        for name in names.iter().flatten() {
            match Self::tag_time(&repo, name) {
                Ok(time) => dated.push((name.to_string(), time)),
                // Tags pointing at trees or blobs cannot be release tags
                Err(e) => tracing::debug!("Skipping tag {}: {}", name, e),
            }
        }

        // Stable: equal times keep the backend's order
        dated.sort_by(|a, b| b.1.cmp(&a.1));
        Ok(dated.into_iter().map(|(name, _)| name).collect())
    }

    fn ref_exists(&self, name: &str) -> Result<bool, GitError> {
        let repo = self.lock()?;
        match Self::find_commit(&repo, name) {
            Ok(_) => Ok(true),
            Err(GitError::RefNotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn commit_range(
        &self,
        previous: Option<&str>,
        current: &str,
    ) -> Result<Vec<String>, GitError> {
        let repo = self.lock()?;
        let head = Self::find_commit(&repo, current)?.id();

        let mut revwalk = repo.revwalk().map_err(query_err("rev-list"))?;
        // Same order as `git rev-list --reverse`: oldest first across merged branches
        revwalk
            .set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)
            .map_err(query_err("rev-list"))?;
        revwalk.push(head).map_err(query_err("rev-list"))?;
        if let Some(prev) = previous {
            let base = Self::find_commit(&repo, prev)?.id();
            revwalk.hide(base).map_err(query_err("rev-list"))?;
        }

        let mut shas = Vec::new();
        for oid in revwalk {
            shas.push(oid.map_err(query_err("rev-list"))?.to_string());
        }
        Ok(shas)
    }

    fn commit_message(&self, sha: &str) -> Result<String, GitError> {
        let repo = self.lock()?;
        let commit = Self::find_commit(&repo, sha)?;
        Ok(String::from_utf8_lossy(commit.message_bytes()).into_owned())
    }

    fn file_stats(&self, sha: &str) -> Result<Vec<FileStat>, GitError> {
        let repo = self.lock()?;
        let mut opts = DiffOptions::new();
        let diff = Self::commit_diff(&repo, sha, &mut opts)?;

        let mut stats = Vec::with_capacity(diff.deltas().len());
        for idx in 0..diff.deltas().len() {
            let Some(delta) = diff.get_delta(idx) else {
                continue;
            };
            let path = match delta.status() {
                Delta::Renamed | Delta::Copied => format!(
                    "{} => {}",
                    delta
                        .old_file()
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default(),
                    delta_path(&delta)
                ),
                _ => delta_path(&delta),
            };

            let patch = git2::Patch::from_diff(&diff, idx).map_err(query_err("numstat"))?;
            let stat = match patch {
                Some(patch) if !patch.delta().flags().is_binary() => {
                    let (_, additions, deletions) =
                        patch.line_stats().map_err(query_err("numstat"))?;
                    FileStat::text(path, additions, deletions)
                }
                _ => FileStat::binary(path),
            };
            stats.push(stat);
        }
        Ok(stats)
    }

    fn unified_diff(&self, sha: &str, paths: &[String]) -> Result<String, GitError> {
        if paths.is_empty() {
            return Ok(String::new());
        }
        let repo = self.lock()?;
        let mut opts = DiffOptions::new();
        opts.context_lines(0)
            .interhunk_lines(0)
            .disable_pathspec_match(true);
        for path in paths {
            opts.pathspec(path);
        }
        let diff = Self::commit_diff(&repo, sha, &mut opts)?;

        let mut out = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            let content = String::from_utf8_lossy(line.content());
            match line.origin() {
                '+' | '-' | ' ' => {
                    out.push(line.origin());
                    out.push_str(&content);
                }
                // File and hunk headers arrive fully formatted
                'F' | 'H' => out.push_str(&content),
                _ => return true,
            }
            if !out.ends_with('\n') {
                out.push('\n');
            }
            true
        })
        .map_err(query_err("diff"))?;

        Ok(out)
    }

    fn name_status(&self, sha: &str) -> Result<Vec<NameStatus>, GitError> {
        let repo = self.lock()?;
        let mut opts = DiffOptions::new();
        let diff = Self::commit_diff(&repo, sha, &mut opts)?;

        Ok(diff
            .deltas()
            .filter_map(|delta| {
                let status = match delta.status() {
                    Delta::Added => ChangeStatus::Added,
                    Delta::Deleted => ChangeStatus::Deleted,
                    Delta::Modified | Delta::Typechange => ChangeStatus::Modified,
                    Delta::Renamed => ChangeStatus::Renamed,
                    Delta::Copied => ChangeStatus::Copied,
                    _ => return None,
                };
                Some(NameStatus::new(delta_path(&delta), status))
            })
            .collect())
    }

    fn is_shallow(&self) -> Result<bool, GitError> {
        Ok(self.lock()?.is_shallow())
    }
}
