//! Durable delivery marks
//!
//! A mark is a persistent record meaning "this edition URL was already
//! delivered". Marks live in a flat directory, one file per URL, named by
//! the SHA-256 hex digest of the URL so arbitrary URLs map to valid
//! filenames. The file body holds the plaintext URL for auditability.
//!
//! The directory is the only persistent state in the system. At most one
//! invocation is assumed to touch it at a time (external scheduling
//! discipline); no locking is implemented.

use crate::error::Result;
use crate::feed::Candidate;
use sha2::{Digest, Sha256};
use std::fs;
use std::path::PathBuf;
use tracing::debug;

/// A set of already-delivered keys.
///
/// The directory-of-files [`MarkStore`] is the shipped implementation, but
/// the dedup selector only depends on this trait, so the representation can
/// be swapped (e.g. for an embedded key-value store) without touching it.
pub trait SeenSet {
    /// Whether `key` has been recorded as delivered.
    fn contains(&self, key: &str) -> Result<bool>;

    /// Record `key` as delivered. Must be idempotent.
    fn add(&self, key: &str) -> Result<()>;
}

/// Directory-of-files mark store.
///
/// Constructed with `None`, the store is disabled: nothing is ever
/// considered seen and [`SeenSet::add`] is a no-op. Marking is opt-in so
/// that ad-hoc runs without a configured state directory always pick the
/// newest edition.
pub struct MarkStore {
    dir: Option<PathBuf>,
}

impl MarkStore {
    /// Create a store over `dir`, or a disabled store for `None`.
    pub fn new(dir: Option<PathBuf>) -> Self {
        Self { dir }
    }

    /// Create the marks directory (and any missing parents).
    ///
    /// A directory that already exists is not an error. Disabled stores do
    /// nothing.
    pub fn ensure_dir(&self) -> Result<()> {
        if let Some(dir) = &self.dir {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    fn mark_path(&self, key: &str) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| dir.join(mark_file_name(key)))
    }
}

impl SeenSet for MarkStore {
    fn contains(&self, key: &str) -> Result<bool> {
        match self.mark_path(key) {
            Some(path) => Ok(path.try_exists()?),
            None => Ok(false),
        }
    }

    fn add(&self, key: &str) -> Result<()> {
        if let Some(path) = self.mark_path(key) {
            fs::write(&path, format!("{key}\n"))?;
        }
        Ok(())
    }
}

/// Map an arbitrary key to a fixed-length mark filename.
///
/// URLs contain `/` characters, so they are hashed rather than used
/// directly. The digest is one-way and deterministic; collisions between
/// distinct URLs are a theoretical risk accepted at this bit width.
fn mark_file_name(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Select the first candidate whose URL is not yet marked.
///
/// Candidates are examined in feed order and the scan stops at the first
/// unmarked one; later candidates are never evaluated. Exhausting the
/// sequence yields [`crate::Error::UpToDate`], the benign "nothing new"
/// outcome.
///
/// # Errors
///
/// Returns [`crate::Error::UpToDate`] when every candidate is marked, or
/// any error raised by the seen-set lookups.
pub fn first_unmarked<I>(candidates: I, seen: &dyn SeenSet) -> Result<Candidate>
where
    I: IntoIterator<Item = Candidate>,
{
    for candidate in candidates {
        if seen.contains(&candidate.url)? {
            debug!(url = %candidate.url, "skipping already delivered edition");
            continue;
        }
        return Ok(candidate);
    }
    Err(crate::Error::UpToDate)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::cell::Cell;
    use tempfile::TempDir;

    fn candidate(n: usize) -> Candidate {
        Candidate {
            url: format!("https://lwn.net/Articles/{n}/bigpage?format=printable"),
            title: format!("LWN: edition {n}"),
        }
    }

    #[test]
    fn mark_is_recorded_and_found() {
        let dir = TempDir::new().unwrap();
        let store = MarkStore::new(Some(dir.path().to_path_buf()));

        let key = "https://lwn.net/Articles/1/bigpage?format=printable";
        assert!(!store.contains(key).unwrap());
        store.add(key).unwrap();
        assert!(store.contains(key).unwrap());

        // The mark file is named by digest and holds the plaintext key.
        let content = std::fs::read_to_string(dir.path().join(mark_file_name(key))).unwrap();
        assert_eq!(content, format!("{key}\n"));
    }

    #[test]
    fn marking_twice_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let store = MarkStore::new(Some(dir.path().to_path_buf()));

        store.add("key").unwrap();
        store.add("key").unwrap();

        let entries: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1, "duplicate add must not create extra files");
        assert!(store.contains("key").unwrap());
    }

    #[test]
    fn disabled_store_never_sees_anything() {
        let store = MarkStore::new(None);
        store.add("key").unwrap();
        assert!(!store.contains("key").unwrap());
    }

    #[test]
    fn ensure_dir_tolerates_existing_directory() {
        let dir = TempDir::new().unwrap();
        let marks = dir.path().join("marks");
        let store = MarkStore::new(Some(marks.clone()));
        store.ensure_dir().unwrap();
        store.ensure_dir().unwrap();
        assert!(marks.is_dir());
    }

    #[test]
    fn mark_file_name_is_stable_hex() {
        let name = mark_file_name("https://lwn.net/Articles/1/bigpage?format=printable");
        assert_eq!(name.len(), 64);
        assert!(name.chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic across calls.
        assert_eq!(
            name,
            mark_file_name("https://lwn.net/Articles/1/bigpage?format=printable")
        );
    }

    #[test]
    fn first_unmarked_skips_marked_prefix() {
        let dir = TempDir::new().unwrap();
        let store = MarkStore::new(Some(dir.path().to_path_buf()));

        let candidates: Vec<_> = (0..4).map(candidate).collect();
        store.add(&candidates[0].url).unwrap();
        store.add(&candidates[1].url).unwrap();

        let selected = first_unmarked(candidates.clone(), &store).unwrap();
        assert_eq!(selected.url, candidates[2].url);
    }

    #[test]
    fn first_unmarked_short_circuits() {
        let store = MarkStore::new(None);
        let examined = Cell::new(0);

        let candidates = (0..10).map(|n| {
            examined.set(examined.get() + 1);
            candidate(n)
        });

        let selected = first_unmarked(candidates, &store).unwrap();
        assert_eq!(selected.url, candidate(0).url);
        assert_eq!(
            examined.get(),
            1,
            "candidates past the first unmarked one must not be evaluated"
        );
    }

    #[test]
    fn exhausted_candidates_yield_up_to_date() {
        let dir = TempDir::new().unwrap();
        let store = MarkStore::new(Some(dir.path().to_path_buf()));

        let candidates: Vec<_> = (0..3).map(candidate).collect();
        for c in &candidates {
            store.add(&c.url).unwrap();
        }

        let result = first_unmarked(candidates, &store);
        assert!(matches!(result, Err(Error::UpToDate)));
    }

    #[test]
    fn empty_candidate_sequence_yields_up_to_date() {
        let store = MarkStore::new(None);
        let result = first_unmarked(Vec::new(), &store);
        assert!(matches!(result, Err(Error::UpToDate)));
    }
}
