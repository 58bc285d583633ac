//! Favorites store.
//!
//! A device-local set of bookmarked items, persisted as a JSON file. There
//! is no remote mirror and no cross-device sync. Every mutation rewrites
//! the whole file synchronously; the set is small enough that this is
//! cheaper than being clever.
//!
//! The stored blob carries no version field. A file that fails to parse -
//! corrupt, truncated, or written by an incompatible build - is treated as
//! an empty set, never as a fatal error.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use larkspur_core::{FavoriteEntry, ItemId};

/// Device-local favorites set.
pub struct FavoritesStore {
    path: PathBuf,
    entries: Mutex<Vec<FavoriteEntry>>,
}

impl FavoritesStore {
    /// Load the store from `path`.
    ///
    /// A missing file starts empty; an unreadable or unparsable file is
    /// logged and also starts empty.
    #[must_use]
    pub fn load(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %path.display(),
                        "favorites file corrupt, starting with an empty set"
                    );
                    Vec::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    path = %path.display(),
                    "favorites file unreadable, starting with an empty set"
                );
                Vec::new()
            }
        };

        Self {
            path: path.to_path_buf(),
            entries: Mutex::new(entries),
        }
    }

    /// Toggle membership of an item.
    ///
    /// Adds the entry if its `item_id` is absent, removes the existing
    /// entry otherwise. Returns whether the item is a favorite after the
    /// toggle. Persistence failures are logged and swallowed; the
    /// in-memory set stays authoritative for this process.
    pub fn toggle(&self, entry: FavoriteEntry) -> bool {
        let mut entries = self.lock();

        let now_favorite = if let Some(position) = entries
            .iter()
            .position(|existing| existing.item_id == entry.item_id)
        {
            entries.remove(position);
            false
        } else {
            entries.push(entry);
            true
        };

        self.persist(&entries);
        now_favorite
    }

    /// Membership test by item ID.
    #[must_use]
    pub fn is_favorite(&self, item_id: ItemId) -> bool {
        self.lock().iter().any(|entry| entry.item_id == item_id)
    }

    /// Snapshot of all favorites, oldest first.
    #[must_use]
    pub fn all(&self) -> Vec<FavoriteEntry> {
        self.lock().clone()
    }

    /// Number of favorited items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<FavoriteEntry>> {
        // A panic while holding this short-lived lock is already fatal for
        // the request; take the data as-is rather than poisoning forever.
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Serialize the whole set to disk via a temp file and rename.
    fn persist(&self, entries: &[FavoriteEntry]) {
        let json = match serde_json::to_string_pretty(entries) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "failed to serialize favorites");
                return;
            }
        };

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
            && let Err(e) = fs::create_dir_all(parent)
        {
            tracing::warn!(error = %e, "failed to create favorites directory");
            return;
        }

        let tmp = self.path.with_extension("json.tmp");
        let result = fs::write(&tmp, json).and_then(|()| fs::rename(&tmp, &self.path));
        if let Err(e) = result {
            tracing::warn!(
                error = %e,
                path = %self.path.display(),
                "failed to persist favorites"
            );
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn temp_path() -> PathBuf {
        std::env::temp_dir().join(format!("larkspur-favorites-{}.json", uuid::Uuid::new_v4()))
    }

    fn entry(id: i64, name: &str) -> FavoriteEntry {
        FavoriteEntry {
            item_id: ItemId::new(id),
            name: name.to_string(),
            category: "ceramics".to_string(),
            description: "Hand-made.".to_string(),
            image_url: None,
        }
    }

    #[test]
    fn test_toggle_adds_then_removes() {
        let path = temp_path();
        let store = FavoritesStore::load(&path);

        assert!(store.toggle(entry(1, "Mug")));
        assert!(store.is_favorite(ItemId::new(1)));

        assert!(!store.toggle(entry(1, "Mug")));
        assert!(!store.is_favorite(ItemId::new(1)));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_double_toggle_is_identity() {
        let path = temp_path();
        let store = FavoritesStore::load(&path);
        store.toggle(entry(1, "Mug"));

        let before = store.all();
        store.toggle(entry(2, "Scarf"));
        store.toggle(entry(2, "Scarf"));
        assert_eq!(store.all(), before);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_never_added_is_never_favorite() {
        let path = temp_path();
        let store = FavoritesStore::load(&path);
        store.toggle(entry(1, "Mug"));

        assert!(!store.is_favorite(ItemId::new(999)));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_no_duplicates_by_construction() {
        let path = temp_path();
        let store = FavoritesStore::load(&path);

        store.toggle(entry(1, "Mug"));
        store.toggle(entry(1, "Mug"));
        store.toggle(entry(1, "Mug"));

        assert_eq!(store.len(), 1);

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_persists_across_reload() {
        let path = temp_path();
        {
            let store = FavoritesStore::load(&path);
            store.toggle(entry(1, "Mug"));
            store.toggle(entry(2, "Scarf"));
        }

        let reloaded = FavoritesStore::load(&path);
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.is_favorite(ItemId::new(1)));
        assert!(reloaded.is_favorite(ItemId::new(2)));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let path = temp_path();
        fs::write(&path, "{ not json ][").unwrap();

        let store = FavoritesStore::load(&path);
        assert!(store.is_empty());

        // The store still works after the reset.
        assert!(store.toggle(entry(1, "Mug")));
        assert!(store.is_favorite(ItemId::new(1)));

        let _ = fs::remove_file(path);
    }

    #[test]
    fn test_missing_file_starts_empty() {
        let store = FavoritesStore::load(&temp_path());
        assert!(store.is_empty());
    }
}
