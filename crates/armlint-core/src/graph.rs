//! Multi-file reference graph.
//!
//! Specifications are split across many files that `$ref` each other, often
//! cyclically. [`ReferenceGraph`] owns one parsed [`Document`] per normalized
//! path and the "file A references file B" edges between them.

use crate::document::{Document, LoadError};
use crate::utils::paths::{is_remote, normalize_path};

use rayon::prelude::*;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use tracing::{debug, info, warn};

/// Arena of loaded documents plus their file-level dependency edges.
///
/// All state is behind locks: loading is memoized and idempotent, so the graph
/// can be shared by concurrent readers (rules running in parallel) while
/// documents are still being loaded on demand.
#[derive(Debug, Default)]
pub struct ReferenceGraph {
    documents: RwLock<HashMap<PathBuf, Arc<Document>>>,
    failures: RwLock<HashMap<PathBuf, LoadError>>,
    edges: RwLock<BTreeMap<PathBuf, BTreeSet<PathBuf>>>,
    scanned: Mutex<HashSet<PathBuf>>,
    loading: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    parses: AtomicUsize,
}

impl ReferenceGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an already-parsed document (e.g. content supplied by a host
    /// process instead of the filesystem). An existing entry wins.
    pub fn insert(&self, document: Document) -> Arc<Document> {
        let path = document.path().to_path_buf();
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(
            documents
                .entry(path)
                .or_insert_with(|| Arc::new(document)),
        )
    }

    /// Returns the document for `path`, loading and memoizing it on first use.
    ///
    /// Failures are memoized too, so a broken file is read at most once.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] if the file cannot be read or parsed.
    pub fn get(&self, path: &Path) -> Result<Arc<Document>, LoadError> {
        let path = if is_remote(&path.to_string_lossy()) {
            path.to_path_buf()
        } else {
            normalize_path(path)
        };

        if let Some(memoized) = self.memoized(&path) {
            return memoized;
        }

        // One loader per path: concurrent callers wait here and then find
        // the memoized result.
        let lock = self.path_lock(&path);
        let _loading = lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(memoized) = self.memoized(&path) {
            return memoized;
        }

        let loaded = if is_remote(&path.to_string_lossy()) {
            Err(LoadError::Io {
                path: path.clone(),
                message: "remote references are not fetched".to_string(),
            })
        } else {
            self.parses.fetch_add(1, Ordering::Relaxed);
            Document::load(&path)
        };

        match loaded {
            Ok(doc) => Ok(self.insert(doc)),
            Err(err) => {
                warn!("{err}");
                self.failures
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(path)
                    .or_insert_with(|| err.clone());
                Err(err)
            }
        }
    }

    /// Returns the document for `path` only if it is already loaded.
    #[must_use]
    pub fn cached(&self, path: &Path) -> Option<Arc<Document>> {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .cloned()
    }

    /// Loads `entry` and, transitively, every file it references.
    ///
    /// Files are loaded breadth-first; each frontier is loaded in parallel.
    /// A shared visited set guarantees every file is parsed once and file
    /// cycles terminate. Failures of referenced files are recorded (see
    /// [`failures`](Self::failures)) rather than returned.
    ///
    /// # Errors
    ///
    /// Returns the [`LoadError`] if the entry file itself cannot be loaded.
    pub fn scan(&self, entry: &Path) -> Result<Arc<Document>, LoadError> {
        let entry = normalize_path(entry);
        let root = self.get(&entry)?;

        if !self.mark_scanned(&entry) {
            debug!("Already scanned: {}", entry.display());
            return Ok(root);
        }

        let mut frontier = vec![entry];
        while !frontier.is_empty() {
            let mut next = BTreeSet::new();
            for file in &frontier {
                let Some(doc) = self.cached(file) else {
                    continue;
                };
                let targets = doc.referenced_files();
                if targets.is_empty() {
                    continue;
                }
                self.edges
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .entry(file.clone())
                    .or_default()
                    .extend(targets.iter().cloned());
                for target in targets {
                    if self.mark_scanned(&target) {
                        next.insert(target);
                    }
                }
            }

            let next: Vec<PathBuf> = next.into_iter().collect();
            next.par_iter().for_each(|file| {
                // Failures are memoized inside `get`.
                let _ = self.get(file);
            });
            frontier = next;
        }

        info!(
            "Scanned {}: {} document(s) reachable, {} parsed so far",
            root.path().display(),
            self.references_of(root.path()).len(),
            self.parses.load(Ordering::Relaxed)
        );
        Ok(root)
    }

    /// Every loaded document transitively reachable from `file`, excluding
    /// `file` itself, in breadth-first order.
    #[must_use]
    pub fn references_of(&self, file: &Path) -> Vec<Arc<Document>> {
        self.reachable_files(file)
            .into_iter()
            .filter_map(|f| self.cached(&f))
            .collect()
    }

    /// Every file path transitively reachable from `file` (loaded or not),
    /// excluding `file` itself.
    #[must_use]
    pub fn reachable_files(&self, file: &Path) -> Vec<PathBuf> {
        let start = normalize_path(file);
        let edges = self.edges.read().unwrap_or_else(PoisonError::into_inner);

        let mut visited: HashSet<PathBuf> = HashSet::new();
        visited.insert(start.clone());
        let mut queue: VecDeque<PathBuf> = VecDeque::from([start]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            let Some(targets) = edges.get(&current) else {
                continue;
            };
            for target in targets {
                if visited.insert(target.clone()) {
                    out.push(target.clone());
                    queue.push_back(target.clone());
                }
            }
        }
        out
    }

    /// Direct dependencies of `file`.
    #[must_use]
    pub fn dependencies(&self, file: &Path) -> BTreeSet<PathBuf> {
        self.edges
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(file)
            .cloned()
            .unwrap_or_default()
    }

    /// Files with a direct edge to `file`.
    #[must_use]
    pub fn referrers(&self, file: &Path) -> Vec<PathBuf> {
        self.edges
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, targets)| targets.contains(file))
            .map(|(source, _)| source.clone())
            .collect()
    }

    /// Load failures recorded so far, ordered by path.
    #[must_use]
    pub fn failures(&self) -> Vec<LoadError> {
        let failures = self.failures.read().unwrap_or_else(PoisonError::into_inner);
        let mut out: Vec<LoadError> = failures.values().cloned().collect();
        out.sort_by(|a, b| a.path().cmp(b.path()));
        out
    }

    /// Number of loaded documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no document is loaded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The loaded document or recorded failure for `path`, if any.
    fn memoized(&self, path: &Path) -> Option<Result<Arc<Document>, LoadError>> {
        if let Some(doc) = self.cached(path) {
            return Some(Ok(doc));
        }
        self.failures
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(path)
            .map(|err| Err(err.clone()))
    }

    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut loading = self.loading.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(loading.entry(path.to_path_buf()).or_default())
    }

    fn mark_scanned(&self, file: &Path) -> bool {
        self.scanned
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(file.to_path_buf())
    }
}
