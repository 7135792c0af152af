//! File-backed review repository
//!
//! Each review is stored as `{id}.json` and its comment threads as
//! `{id}_threads.json` in a single reviews directory. Writes go through a
//! temporary file in the same directory followed by a rename, so readers never
//! observe a partially written record.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::models::{CommentThread, Review, ThreadsFile, REVIEW_ID_PREFIX};
use crate::{Error, Result};

const THREADS_SUFFIX: &str = "_threads";

/// Repository for review and thread records
#[derive(Debug, Clone)]
pub struct ReviewStore {
    dir: PathBuf,
}

impl ReviewStore {
    /// Create a store rooted at the given reviews directory
    ///
    /// The directory is created lazily on the first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory holding the record files
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn review_path(&self, review_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", review_id))
    }

    fn threads_path(&self, review_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}.json", review_id, THREADS_SUFFIX))
    }

    /// Get a review by ID
    ///
    /// Returns `Ok(None)` if no record exists and `Error::Corrupt` if the
    /// record cannot be parsed.
    pub fn get(&self, review_id: &str) -> Result<Option<Review>> {
        if !is_valid_id(review_id) {
            return Ok(None);
        }
        read_json(&self.review_path(review_id))
    }

    /// Insert or replace a review record
    pub fn save(&self, review: &Review) -> Result<()> {
        write_json(&self.review_path(&review.id), review)?;
        tracing::debug!(review_id = %review.id, "Review saved");
        Ok(())
    }

    /// List all reviews, newest first by creation time
    ///
    /// Unreadable records are skipped with a warning.
    pub fn list(&self) -> Result<Vec<Review>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reviews = Vec::new();
        for entry in entries {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(review_id) = file_name
                .to_str()
                .and_then(|name| name.strip_suffix(".json"))
                .filter(|stem| is_review_stem(stem))
            else {
                continue;
            };

            match self.get(review_id) {
                Ok(Some(review)) => reviews.push(review),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(review_id = %review_id, error = %e, "Skipping unreadable review");
                }
            }
        }

        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reviews)
    }

    /// Find the most recent review for a document path
    pub fn find_by_path(&self, document_path: &str) -> Result<Option<Review>> {
        Ok(self
            .list()?
            .into_iter()
            .find(|review| review.document_path == document_path))
    }

    /// Get the comment threads of a review, in creation order
    ///
    /// A review without a thread file has no threads.
    pub fn get_threads(&self, review_id: &str) -> Result<Vec<CommentThread>> {
        if !is_valid_id(review_id) {
            return Ok(Vec::new());
        }
        let file: Option<ThreadsFile> = read_json(&self.threads_path(review_id))?;
        Ok(file.map(|f| f.threads).unwrap_or_default())
    }

    /// Replace the comment threads of a review
    pub fn save_threads(&self, review_id: &str, threads: &[CommentThread]) -> Result<()> {
        let file = ThreadsFile {
            review_id: review_id.to_string(),
            threads: threads.to_vec(),
        };
        write_json(&self.threads_path(review_id), &file)?;
        tracing::debug!(review_id = %review_id, count = threads.len(), "Threads saved");
        Ok(())
    }
}

/// IDs become file names, so only `[A-Za-z0-9_-]` is accepted
fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn is_review_stem(stem: &str) -> bool {
    stem.starts_with(REVIEW_ID_PREFIX)
        && stem[REVIEW_ID_PREFIX.len()..].starts_with('_')
        && !stem.ends_with(THREADS_SUFFIX)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    serde_json::from_str(&contents)
        .map(Some)
        .map_err(|e| Error::Corrupt {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(value)?;

    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("record.json");
    let temp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let written = File::create(&temp_path).and_then(|mut file| {
        file.write_all(json.as_bytes())?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|()| fs::rename(&temp_path, path)) {
        let _ = fs::remove_file(&temp_path);
        return Err(e.into());
    }

    // Persist the directory entry too
    if let Some(parent) = path.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Author, CommentReply, ReviewStatus};
    use chrono::Duration;
    use tempfile::TempDir;

    fn setup_store() -> (TempDir, ReviewStore) {
        let temp_dir = TempDir::new().unwrap();
        let store = ReviewStore::new(temp_dir.path().join("reviews"));
        (temp_dir, store)
    }

    #[test]
    fn test_save_and_get_round_trip() {
        let (_temp, store) = setup_store();
        let review = Review::new("/tmp/doc.md", "sha256:abc", Some("first pass".into()));

        store.save(&review).unwrap();

        let loaded = store.get(&review.id).unwrap().unwrap();
        assert_eq!(loaded, review);
        assert!(store.dir().join(format!("{}.json", review.id)).exists());
    }

    #[test]
    fn test_get_missing_review() {
        let (_temp, store) = setup_store();
        assert!(store.get("rev_missing").unwrap().is_none());
    }

    #[test]
    fn test_ids_cannot_escape_directory() {
        let (temp, store) = setup_store();
        std::fs::write(temp.path().join("secret.json"), "{}").unwrap();

        assert!(store.get("../secret").unwrap().is_none());
        assert!(store.get("").unwrap().is_none());
        assert!(store.get_threads("../secret").unwrap().is_empty());
    }

    #[test]
    fn test_corrupt_review_is_distinguished_from_missing() {
        let (_temp, store) = setup_store();
        fs::create_dir_all(store.dir()).unwrap();
        fs::write(store.dir().join("rev_broken.json"), "{ not json").unwrap();

        let err = store.get("rev_broken").unwrap_err();
        assert!(err.is_corrupt());
    }

    #[test]
    fn test_list_sorted_newest_first_and_skips_other_files() {
        let (_temp, store) = setup_store();

        let mut older = Review::new("/tmp/a.md", "sha256:a", None);
        older.created_at = older.created_at - Duration::hours(1);
        let newer = Review::new("/tmp/b.md", "sha256:b", None);

        store.save(&older).unwrap();
        store.save(&newer).unwrap();
        store.save_threads(&newer.id, &[]).unwrap();
        fs::write(store.dir().join("notes.json"), "{}").unwrap();
        fs::write(store.dir().join("rev_bad.json"), "garbage").unwrap();

        let reviews = store.list().unwrap();
        let ids: Vec<_> = reviews.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![newer.id.as_str(), older.id.as_str()]);
    }

    #[test]
    fn test_list_without_directory() {
        let (_temp, store) = setup_store();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_find_by_path_returns_most_recent() {
        let (_temp, store) = setup_store();

        let mut first = Review::new("/tmp/doc.md", "sha256:a", None);
        first.created_at = first.created_at - Duration::minutes(5);
        first.status = ReviewStatus::Approved;
        let second = Review::new("/tmp/doc.md", "sha256:b", None);
        let other = Review::new("/tmp/other.md", "sha256:c", None);

        store.save(&first).unwrap();
        store.save(&second).unwrap();
        store.save(&other).unwrap();

        let found = store.find_by_path("/tmp/doc.md").unwrap().unwrap();
        assert_eq!(found.id, second.id);
        assert!(store.find_by_path("/tmp/none.md").unwrap().is_none());
    }

    #[test]
    fn test_threads_round_trip_preserves_order() {
        let (_temp, store) = setup_store();
        let review = Review::new("/tmp/doc.md", "sha256:abc", None);

        let mut threads: Vec<_> = (1..=4)
            .map(|line| CommentThread::new(&review.id, 1, line, line + 1, "note", Author::Human))
            .collect();
        let reply = CommentReply::new(&threads[2].id, "done", Author::Agent);
        threads[2].replies.push(reply);

        store.save_threads(&review.id, &threads).unwrap();

        let loaded = store.get_threads(&review.id).unwrap();
        assert_eq!(loaded, threads);
    }

    #[test]
    fn test_threads_default_to_empty() {
        let (_temp, store) = setup_store();
        assert!(store.get_threads("rev_none").unwrap().is_empty());
    }

    #[test]
    fn test_threads_file_layout() {
        let (_temp, store) = setup_store();
        store.save_threads("rev_abc", &[]).unwrap();

        let raw = fs::read_to_string(store.dir().join("rev_abc_threads.json")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["reviewId"], "rev_abc");
        assert!(json["threads"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_no_temp_files_left_behind() {
        let (_temp, store) = setup_store();
        let review = Review::new("/tmp/doc.md", "sha256:abc", None);
        store.save(&review).unwrap();
        store.save(&review).unwrap();

        let leftovers: Vec<_> = fs::read_dir(store.dir())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_save_replaces_existing_record() {
        let (_temp, store) = setup_store();
        let mut review = Review::new("/tmp/doc.md", "sha256:abc", None);
        store.save(&review).unwrap();

        review.message = Some("second pass".into());
        store.save(&review).unwrap();

        let raw = fs::read_to_string(store.dir().join(format!("{}.json", review.id))).unwrap();
        let on_disk: Review = serde_json::from_str(&raw).unwrap();
        assert_eq!(on_disk.message.as_deref(), Some("second pass"));
    }

    #[test]
    fn test_write_fails_cleanly_when_target_is_directory() {
        let (temp, _store) = setup_store();
        let target = temp.path().join("blocked.json");
        fs::create_dir(&target).unwrap();

        assert!(write_json(&target, &serde_json::json!({})).is_err());
        assert!(!temp.path().join(".blocked.json.tmp").exists());
    }
}
