use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use git2::{Commit, Oid, Repository, Sort};

use crate::error::{AutorelError, Result};
use crate::history::{extract_trailers, HistoryEntry};
use crate::history::visitor::{Visitor, VisitorResult};
use crate::specfile::{EpochVersion, PackageMetadata};
use crate::visitors::changelog::ChangelogEntry;
use crate::visitors::release::ReleaseInfo;

/// Output of one history walk: every visitor's result keyed by name,
/// plus the epoch/version declared at the starting commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    epoch_version: Option<EpochVersion>,
    results: BTreeMap<&'static str, VisitorResult>,
}

impl RunResult {
    pub(crate) fn new(
        epoch_version: Option<EpochVersion>,
        results: BTreeMap<&'static str, VisitorResult>,
    ) -> Self {
        RunResult {
            epoch_version,
            results,
        }
    }

    /// The epoch/version declared at the starting commit.
    ///
    /// `None` exactly when the spec file there was absent or
    /// unparseable; consumers use this to detect a non-authoritative
    /// run without an error path.
    pub fn epoch_version(&self) -> Option<&EpochVersion> {
        self.epoch_version.as_ref()
    }

    pub fn get(&self, name: &str) -> Option<&VisitorResult> {
        self.results.get(name)
    }

    /// The release-number result, when that visitor was registered.
    pub fn release(&self) -> Option<&ReleaseInfo> {
        self.results.values().find_map(|result| match result {
            VisitorResult::ReleaseNumber(info) => Some(info),
            _ => None,
        })
    }

    /// The changelog entries, newest boundary first; empty when the
    /// changelog visitor was not registered.
    pub fn changelog(&self) -> &[ChangelogEntry] {
        self.results
            .values()
            .find_map(|result| match result {
                VisitorResult::Changelog(entries) => Some(entries.as_slice()),
                _ => None,
            })
            .unwrap_or(&[])
    }
}

/// Single-pass traversal engine over a package's commit graph.
///
/// Owns the repository handle and the name of the spec file whose
/// per-commit snapshots are handed to visitors. All traversal state
/// lives inside one [HistoryWalker::run] call and is discarded on
/// return, so repeated runs over the same on-disk history are
/// independent.
pub struct HistoryWalker {
    repo: Repository,
    spec_name: String,
}

impl HistoryWalker {
    /// Open a walker for a package worktree or a spec file within one.
    ///
    /// A directory argument looks for `<dirname>.spec` first, then for a
    /// single `*.spec` file.
    pub fn open(spec_or_path: impl AsRef<Path>) -> Result<Self> {
        let path = spec_or_path.as_ref();
        let (workdir, spec_name) = if path.is_file() {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(str::to_string)
                .ok_or_else(|| {
                    AutorelError::spec_parse(format!("invalid spec path {}", path.display()))
                })?;
            let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
            (parent.unwrap_or(Path::new(".")).to_path_buf(), name)
        } else {
            (path.to_path_buf(), find_spec_name(path)?)
        };

        let repo = Repository::discover(&workdir).map_err(|e| {
            AutorelError::history_resolution(format!(
                "cannot open a repository at {}: {}",
                workdir.display(),
                e
            ))
        })?;

        Ok(HistoryWalker { repo, spec_name })
    }

    /// Name of the spec file whose snapshots feed the visitors.
    pub fn spec_name(&self) -> &str {
        &self.spec_name
    }

    /// Walk all ancestors of `root_ref` once, newest first, feeding
    /// every commit to each registered visitor.
    ///
    /// `visitors` must be non-empty. Merge commits are followed down
    /// every parent; the visited set is shared across the whole walk so
    /// no commit is observed twice. The walk ends at the root of
    /// history or as soon as every visitor reports it is finished.
    pub fn run(
        &self,
        root_ref: &str,
        mut visitors: Vec<Box<dyn Visitor>>,
    ) -> Result<RunResult> {
        let head = self
            .repo
            .revparse_single(root_ref)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| {
                AutorelError::history_resolution(format!("cannot resolve '{}': {}", root_ref, e))
            })?;

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head.id())?;

        // Two commits often share one spec blob; parse each blob once.
        let mut snapshots: HashMap<Oid, Option<Rc<PackageMetadata>>> = HashMap::new();
        let mut epoch_version = None;
        let mut first_commit = true;

        for oid in revwalk {
            if visitors.iter().all(|visitor| visitor.finished()) {
                break;
            }

            let oid = oid.map_err(|e| AutorelError::history_corrupt(e.to_string()))?;
            let commit = self.repo.find_commit(oid).map_err(|e| {
                AutorelError::history_corrupt(format!("unreadable commit {}: {}", oid, e))
            })?;
            let snapshot = self.snapshot(&commit, &mut snapshots)?;
            if first_commit {
                epoch_version = snapshot.as_ref().map(|metadata| metadata.epoch_version());
                first_commit = false;
            }

            let entry = entry_from_commit(&commit);
            for visitor in visitors.iter_mut().filter(|visitor| !visitor.finished()) {
                visitor.observe(&entry, snapshot.as_deref());
            }
        }

        let results = visitors
            .into_iter()
            .map(|visitor| (visitor.name(), visitor.finish()))
            .collect();

        Ok(RunResult::new(epoch_version, results))
    }

    /// The parsed spec snapshot at one commit, memoized by blob id.
    fn snapshot(
        &self,
        commit: &Commit<'_>,
        cache: &mut HashMap<Oid, Option<Rc<PackageMetadata>>>,
    ) -> Result<Option<Rc<PackageMetadata>>> {
        let tree = commit.tree().map_err(|e| {
            AutorelError::history_corrupt(format!("unreadable tree for {}: {}", commit.id(), e))
        })?;
        let Some(tree_entry) = tree.get_name(&self.spec_name) else {
            return Ok(None);
        };

        let blob_id = tree_entry.id();
        if let Some(cached) = cache.get(&blob_id) {
            return Ok(cached.clone());
        }

        let object = tree_entry.to_object(&self.repo).map_err(|e| {
            AutorelError::history_corrupt(format!("unreadable object {}: {}", blob_id, e))
        })?;
        let parsed = object
            .as_blob()
            .and_then(|blob| PackageMetadata::parse_bytes(blob.content()))
            .map(Rc::new);
        cache.insert(blob_id, parsed.clone());
        Ok(parsed)
    }
}

fn entry_from_commit(commit: &Commit<'_>) -> HistoryEntry {
    let author = commit.author();
    let name = String::from_utf8_lossy(author.name_bytes());
    let email = String::from_utf8_lossy(author.email_bytes());
    let message = String::from_utf8_lossy(commit.message_bytes());

    HistoryEntry {
        hash: commit.id().to_string(),
        parents: commit.parent_ids().map(|id| id.to_string()).collect(),
        seconds: author.when().seconds(),
        offset_minutes: author.when().offset_minutes(),
        author: format!("{} <{}>", name, email),
        summary: commit.summary_bytes().unwrap_or_default().to_vec(),
        trailers: extract_trailers(&message),
    }
}

fn find_spec_name(dir: &Path) -> Result<String> {
    let resolved: PathBuf = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());

    if let Some(stem) = resolved.file_name().and_then(|name| name.to_str()) {
        let candidate = format!("{}.spec", stem);
        if resolved.join(&candidate).is_file() {
            return Ok(candidate);
        }
    }

    let mut specs: Vec<String> = fs::read_dir(&resolved)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .filter(|name| name.ends_with(".spec"))
        .collect();
    specs.sort();

    match specs.len() {
        1 => Ok(specs.remove(0)),
        0 => Err(AutorelError::spec_parse(format!(
            "no spec file found in {}",
            resolved.display()
        ))),
        _ => Err(AutorelError::spec_parse(format!(
            "multiple spec files found in {}",
            resolved.display()
        ))),
    }
}
