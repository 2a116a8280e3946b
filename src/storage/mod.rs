use crate::models::RecentCollection;
use crate::util::now_ms;
use serde::{Deserialize, Serialize};

/// Written by the admin login screen; the ToC editor only reads it.
pub(crate) const TOKEN_KEY: &str = "digitaledition_token";
pub(crate) const LAST_PROJECT_KEY: &str = "toc_admin_last_project";
pub(crate) const RECENT_COLLECTIONS_KEY: &str = "toc_admin_recent_collections";

const MAX_RECENT_COLLECTIONS: usize = 10;

fn local_storage() -> Option<web_sys::Storage> {
    web_sys::window().and_then(|w| w.local_storage().ok().flatten())
}

pub(crate) fn load_item(key: &str) -> Option<String> {
    local_storage()?.get_item(key).ok().flatten()
}

pub(crate) fn save_item(key: &str, value: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.set_item(key, value);
    }
}

pub(crate) fn remove_item(key: &str) {
    if let Some(storage) = local_storage() {
        let _ = storage.remove_item(key);
    }
}

pub(crate) fn load_json_from_storage<T: for<'de> Deserialize<'de>>(key: &str) -> Option<T> {
    serde_json::from_str(&load_item(key)?).ok()
}

pub(crate) fn save_json_to_storage<T: Serialize>(key: &str, value: &T) {
    if let Ok(json) = serde_json::to_string(value) {
        save_item(key, &json);
    }
}

pub(crate) fn upsert_lru_by_key<T: Clone>(
    mut items: Vec<T>,
    item: T,
    same_key: impl Fn(&T, &T) -> bool,
    max: usize,
) -> Vec<T> {
    items.retain(|x| !same_key(x, &item));
    items.insert(0, item);
    items.truncate(max);
    items
}

pub(crate) fn load_last_project() -> Option<String> {
    load_item(LAST_PROJECT_KEY).filter(|p| !p.trim().is_empty())
}

pub(crate) fn save_last_project(project: &str) {
    if !project.trim().is_empty() {
        save_item(LAST_PROJECT_KEY, project.trim());
    }
}

pub(crate) fn load_recent_collections() -> Vec<RecentCollection> {
    load_json_from_storage::<Vec<RecentCollection>>(RECENT_COLLECTIONS_KEY).unwrap_or_default()
}

/// Remember a collection opened in the editor (most recent first).
pub(crate) fn write_recent_collection(project: &str, collection_id: &str, title: &str, language: Option<&str>) {
    if project.trim().is_empty() || collection_id.trim().is_empty() {
        return;
    }

    let item = RecentCollection {
        project: project.to_string(),
        collection_id: collection_id.to_string(),
        title: title.to_string(),
        language: language.map(str::to_string).filter(|l| !l.trim().is_empty()),
        last_opened_ms: now_ms(),
    };

    let next = upsert_lru_by_key(
        load_recent_collections(),
        item,
        |a, b| a.project == b.project && a.collection_id == b.collection_id,
        MAX_RECENT_COLLECTIONS,
    );
    save_json_to_storage(RECENT_COLLECTIONS_KEY, &next);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_lru_moves_existing_to_front() {
        let items = vec![1, 2, 3];
        assert_eq!(upsert_lru_by_key(items, 3, |a, b| a == b, 10), vec![3, 1, 2]);
    }

    #[test]
    fn test_upsert_lru_truncates() {
        let items = vec![1, 2, 3];
        assert_eq!(upsert_lru_by_key(items, 4, |a, b| a == b, 3), vec![4, 1, 2]);
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_recent_collections_roundtrip() {
        remove_item(RECENT_COLLECTIONS_KEY);
        write_recent_collection("topelius", "7", "Letters", Some("sv"));
        write_recent_collection("topelius", "8", "Poems", None);
        write_recent_collection("topelius", "7", "Letters", None);

        let recent = load_recent_collections();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].collection_id, "7");
        assert!(recent[0].language.is_none());
        assert_eq!(recent[1].collection_id, "8");
        remove_item(RECENT_COLLECTIONS_KEY);
    }

    #[wasm_bindgen_test]
    fn test_blank_project_not_saved() {
        remove_item(LAST_PROJECT_KEY);
        save_last_project("  ");
        assert!(load_last_project().is_none());
        save_last_project("topelius");
        assert_eq!(load_last_project().as_deref(), Some("topelius"));
        remove_item(LAST_PROJECT_KEY);
    }
}
