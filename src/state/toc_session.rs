//! Per-collection ToC editing state.
//!
//! `TocSession` holds the tree being edited, the dirty flag and the in-flight
//! request flags. Network calls are split in two: `begin_*` checks preconditions and
//! hands out a ticket describing the request, `finish_*` applies the response. Every
//! ticket carries the session generation it was issued for; a response whose
//! generation no longer matches (the user switched collection or reloaded meanwhile)
//! is dropped without touching the tree.

use crate::api::{ApiError, ApiErrorKind, UpdateItemsRequest};
use crate::models::Publication;
use crate::toc::edit::{self, build_node, DialogMode, MoveRequest, NodeForm, NodeValidationError};
use crate::toc::flat::{generate_flat_toc, SortKey, TocField};
use crate::toc::navigate::{node_at_path, node_at_path_mut};
use crate::toc::normalize::normalize_toc_root;
use crate::toc::serialize::clean_toc_for_saving;
use crate::toc::{TocNode, TocRoot, TocRootApi};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub(crate) enum SessionError {
    #[error("No table of contents is loaded.")]
    NoTree,
    #[error("Another request is still running.")]
    Busy,
    #[error("There are unsaved changes.")]
    UnsavedChanges,
    #[error("Select at least one field to update.")]
    NoFieldsSelected,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A snackbar message. Errors stay until dismissed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    pub fn is_persistent(&self) -> bool {
        self.level == NoticeLevel::Error
    }
}

fn failure_notice(what: &str, err: &ApiError) -> Notice {
    match err.kind {
        ApiErrorKind::Unauthorized => Notice::error(format!("{what}: your session has expired, please log in again.")),
        _ => Notice::error(format!("{what}: {}", err.message)),
    }
}

/// Where a request goes. Shared by every ticket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Target {
    pub project: String,
    pub collection_id: String,
    pub language: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct LoadTicket {
    generation: u64,
    pub target: Target,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SaveTicket {
    generation: u64,
    revision: u64,
    pub target: Target,
    pub payload: TocRootApi,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct UpdateTicket {
    generation: u64,
    pub target: Target,
    pub request: UpdateItemsRequest,
}

/// Editable root-level properties.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct RootProperties {
    pub text: String,
    pub cover_page_name: String,
    pub title_page_name: String,
    pub foreword_page_name: String,
    pub introduction_page_name: String,
}

impl RootProperties {
    pub fn from_root(root: &TocRoot) -> Self {
        let s = |v: &Option<String>| v.clone().unwrap_or_default();
        Self {
            text: root.text.clone(),
            cover_page_name: s(&root.cover_page_name),
            title_page_name: s(&root.title_page_name),
            foreword_page_name: s(&root.foreword_page_name),
            introduction_page_name: s(&root.introduction_page_name),
        }
    }

    fn apply(&self, root: &mut TocRoot) -> bool {
        let opt = |v: &str| {
            let t = v.trim();
            (!t.is_empty()).then(|| t.to_string())
        };
        let before = Self::from_root(root);
        root.text = self.text.trim().to_string();
        root.cover_page_name = opt(&self.cover_page_name);
        root.title_page_name = opt(&self.title_page_name);
        root.foreword_page_name = opt(&self.foreword_page_name);
        root.introduction_page_name = opt(&self.introduction_page_name);
        Self::from_root(root) != before
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TocSession {
    pub project: String,
    pub collection_id: Option<String>,
    pub collection_title: Option<String>,
    pub language: Option<String>,
    pub tree: Option<TocRoot>,
    pub dirty: bool,
    pub loading: bool,
    pub saving: bool,
    pub updating: bool,
    generation: u64,
    /// Bumped by every successful mutation; a save only clears `dirty` when no edit
    /// happened while it was in flight.
    revision: u64,
    next_ui_id: u64,
}

impl TocSession {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            ..Default::default()
        }
    }

    pub fn is_busy(&self) -> bool {
        self.loading || self.saving || self.updating
    }

    pub fn can_save(&self) -> bool {
        self.tree.is_some() && !self.saving && !self.loading
    }

    /// Tree edits are refused while a load or an update from the database is in
    /// flight, since its response replaces the whole tree.
    pub fn can_edit(&self) -> bool {
        self.tree.is_some() && !self.loading && !self.updating
    }

    pub fn can_update_from_db(&self) -> bool {
        self.tree.is_some() && !self.dirty && !self.is_busy()
    }

    fn target(&self) -> Option<Target> {
        Some(Target {
            project: self.project.clone(),
            collection_id: self.collection_id.clone()?,
            language: self.language.clone(),
        })
    }

    /// Operations that throw the tree away call this first. `confirmed` is the user's
    /// answer to the discard prompt.
    pub fn ensure_can_discard(&self, confirmed: bool) -> Result<(), SessionError> {
        if self.dirty && !confirmed {
            Err(SessionError::UnsavedChanges)
        } else {
            Ok(())
        }
    }

    fn annotate(&mut self) {
        let counter = &mut self.next_ui_id;
        if let Some(tree) = self.tree.as_mut() {
            tree.annotate_ui_fields(&mut || {
                *counter += 1;
                format!("toc-node-{counter}")
            });
        }
    }

    fn replace_tree(&mut self, tree: Option<TocRoot>, dirty: bool) {
        self.tree = tree;
        self.dirty = dirty;
        self.revision += 1;
        self.annotate();
    }

    // -----------------------------------------------------------------------
    // Load
    // -----------------------------------------------------------------------

    /// Switch to another collection and start loading its ToC.
    pub fn select_collection(
        &mut self,
        project: &str,
        collection_id: &str,
        collection_title: Option<String>,
        language: Option<String>,
        confirmed: bool,
    ) -> Result<LoadTicket, SessionError> {
        self.ensure_can_discard(confirmed)?;
        self.project = project.trim().to_string();
        self.collection_id = Some(collection_id.trim().to_string());
        self.collection_title = collection_title.filter(|t| !t.trim().is_empty());
        self.language = language
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());
        self.replace_tree(None, false);
        self.begin_load()
    }

    /// Reload the current collection from the server, dropping local edits.
    pub fn reload(&mut self, confirmed: bool) -> Result<LoadTicket, SessionError> {
        self.ensure_can_discard(confirmed)?;
        self.begin_load()
    }

    fn begin_load(&mut self) -> Result<LoadTicket, SessionError> {
        let target = self.target().ok_or(SessionError::NoTree)?;
        self.generation += 1;
        self.loading = true;
        self.updating = false;
        info!(project = %target.project, collection_id = %target.collection_id, "loading toc");
        Ok(LoadTicket {
            generation: self.generation,
            target,
        })
    }

    pub fn finish_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Option<TocRootApi>, ApiError>,
    ) -> Option<Notice> {
        if ticket.generation != self.generation {
            debug!(generation = ticket.generation, "dropping stale toc load");
            return None;
        }
        self.loading = false;

        match result {
            Ok(Some(raw)) => {
                let mut root = normalize_toc_root(raw);
                if root.collection_id.is_empty() {
                    root.collection_id = ticket.target.collection_id.clone();
                }
                info!(nodes = root.node_count(), "toc loaded");
                self.replace_tree(Some(root), false);
                None
            }
            Ok(None) => {
                info!("collection has no toc yet, starting a new one");
                let title = self.collection_title.clone().unwrap_or_default();
                self.replace_tree(Some(TocRoot::new(ticket.target.collection_id.clone(), title)), false);
                None
            }
            Err(err) => {
                error!(error = %err, "toc load failed");
                self.replace_tree(None, false);
                Some(failure_notice("Loading the table of contents failed", &err))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Save
    // -----------------------------------------------------------------------

    pub fn begin_save(&mut self) -> Result<SaveTicket, SessionError> {
        if self.saving || self.loading {
            return Err(SessionError::Busy);
        }
        let tree = self.tree.as_ref().ok_or(SessionError::NoTree)?;
        let target = self.target().ok_or(SessionError::NoTree)?;
        let payload = clean_toc_for_saving(tree);
        self.saving = true;
        info!(collection_id = %target.collection_id, "saving toc");
        Ok(SaveTicket {
            generation: self.generation,
            revision: self.revision,
            target,
            payload,
        })
    }

    /// The tree itself is never touched here; a failed save leaves it dirty for a retry.
    pub fn finish_save(&mut self, ticket: &SaveTicket, result: Result<(), ApiError>) -> Option<Notice> {
        self.saving = false;
        match result {
            Ok(()) => {
                if ticket.generation == self.generation && ticket.revision == self.revision {
                    self.dirty = false;
                }
                info!("toc saved");
                Some(Notice::success("Table of contents saved."))
            }
            Err(err) => {
                error!(error = %err, "toc save failed");
                Some(failure_notice("Saving the table of contents failed", &err))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Update from database
    // -----------------------------------------------------------------------

    pub fn begin_update_from_db(&mut self, fields: &BTreeSet<TocField>) -> Result<UpdateTicket, SessionError> {
        if self.tree.is_none() {
            return Err(SessionError::NoTree);
        }
        if self.dirty {
            return Err(SessionError::UnsavedChanges);
        }
        if self.is_busy() {
            return Err(SessionError::Busy);
        }
        if fields.is_empty() {
            return Err(SessionError::NoFieldsSelected);
        }
        let target = self.target().ok_or(SessionError::NoTree)?;
        self.updating = true;
        let request = UpdateItemsRequest {
            update: fields.iter().map(|f| f.to_string()).collect(),
        };
        info!(fields = ?request.update, "updating toc items from database");
        Ok(UpdateTicket {
            generation: self.generation,
            target,
            request,
        })
    }

    /// A successful update replaces the tree and leaves it dirty: the merged values
    /// only become permanent after a save.
    pub fn finish_update_from_db(
        &mut self,
        ticket: &UpdateTicket,
        result: Result<Option<TocRootApi>, ApiError>,
    ) -> Option<Notice> {
        if ticket.generation != self.generation {
            debug!(generation = ticket.generation, "dropping stale toc update");
            return None;
        }
        self.updating = false;

        match result {
            Ok(Some(raw)) => {
                let mut root = normalize_toc_root(raw);
                if root.collection_id.is_empty() {
                    root.collection_id = ticket.target.collection_id.clone();
                }
                self.replace_tree(Some(root), true);
                Some(Notice::info("Fields updated from the database. Review and save the table of contents."))
            }
            Ok(None) => {
                warn!("update from database returned no toc");
                Some(Notice::error("The server returned no table of contents."))
            }
            Err(err) => {
                error!(error = %err, "toc update from database failed");
                Some(failure_notice("Updating from the database failed", &err))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Flat ToC
    // -----------------------------------------------------------------------

    /// Replace the tree with a generated flat ToC. Any load or update still in flight
    /// is abandoned.
    pub fn replace_tree_with_flat(
        &mut self,
        publications: &[Publication],
        sort_by: Option<SortKey>,
        included: &BTreeSet<TocField>,
        confirmed: bool,
    ) -> Result<(), SessionError> {
        self.ensure_can_discard(confirmed)?;
        let collection_id = self.collection_id.clone().ok_or(SessionError::NoTree)?;
        let title = self
            .tree
            .as_ref()
            .map(|t| t.text.clone())
            .filter(|t| !t.is_empty())
            .or_else(|| self.collection_title.clone());

        let root = generate_flat_toc(&collection_id, publications, sort_by, title.as_deref(), included);
        info!(nodes = root.children.len(), sort_by = ?sort_by, "generated flat toc");
        self.generation += 1;
        self.loading = false;
        self.updating = false;
        self.replace_tree(Some(root), true);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Run an editor operation on the tree; a successful one marks the session dirty
    /// and refreshes the UI annotations.
    fn mutate<T>(&mut self, op: impl FnOnce(&mut TocRoot) -> Option<T>) -> Option<T> {
        if !self.can_edit() {
            debug!(loading = self.loading, updating = self.updating, "edit refused while busy");
            return None;
        }
        let out = op(self.tree.as_mut()?)?;
        self.dirty = true;
        self.revision += 1;
        self.annotate();
        Some(out)
    }

    pub fn add_node(&mut self, parent_path: &[usize], node: TocNode) -> bool {
        self.mutate(|t| edit::add_node(t, parent_path, node).then_some(()))
            .is_some()
    }

    pub fn delete_node(&mut self, path: &[usize]) -> Option<TocNode> {
        self.mutate(|t| edit::delete_node(t, path))
    }

    pub fn replace_node(&mut self, path: &[usize], node: TocNode) -> bool {
        self.mutate(|t| edit::replace_node(t, path, node).then_some(()))
            .is_some()
    }

    pub fn move_node(&mut self, req: &MoveRequest) -> bool {
        self.mutate(|t| edit::move_node(t, req).then_some(()))
            .is_some()
    }

    pub fn move_up(&mut self, path: &[usize]) -> bool {
        self.mutate(|t| edit::move_up(t, path).then_some(()))
            .is_some()
    }

    pub fn move_down(&mut self, path: &[usize]) -> bool {
        self.mutate(|t| edit::move_down(t, path).then_some(()))
            .is_some()
    }

    pub fn indent(&mut self, path: &[usize]) -> Option<Vec<usize>> {
        self.mutate(|t| edit::indent(t, path))
    }

    pub fn outdent(&mut self, path: &[usize]) -> Option<Vec<usize>> {
        self.mutate(|t| edit::outdent(t, path))
    }

    /// Expand or collapse every section. Row toggles are reset either way.
    pub fn set_all_collapsed(&mut self, collapsed: bool) -> bool {
        if let Some(tree) = self.tree.as_mut() {
            tree.clear_expanded();
        }
        self.mutate(|t| t.set_all_collapsed(collapsed).then_some(()))
            .is_some()
    }

    /// Show or hide a section's children in the tree view. UI-only: not a mutation.
    pub fn toggle_open(&mut self, path: &[usize]) -> bool {
        let Some(TocNode::Section(s)) = self.tree.as_mut().and_then(|t| node_at_path_mut(t, path)) else {
            return false;
        };
        s.common.is_expanded = Some(!s.is_open());
        true
    }

    pub fn set_root_properties(&mut self, props: &RootProperties) -> bool {
        self.mutate(|t| props.apply(t).then_some(())).is_some()
    }

    /// Apply a node dialog submission. In add mode `path` is the parent container;
    /// in edit mode it is the node being edited.
    ///
    /// A form that fails validation leaves the session untouched.
    pub fn submit_node_form(
        &mut self,
        mode: DialogMode,
        path: &[usize],
        form: &NodeForm,
    ) -> Result<bool, NodeValidationError> {
        let Some(tree) = self.tree.as_ref() else {
            return Ok(false);
        };
        let existing = match mode {
            DialogMode::Edit => match node_at_path(tree, path) {
                Some(n) => Some(n),
                None => {
                    debug!(?path, "submit_node_form: node vanished");
                    return Ok(false);
                }
            },
            DialogMode::Add => None,
        };
        let node = build_node(existing, form, mode)?;
        Ok(match mode {
            DialogMode::Add => self.add_node(path, node),
            DialogMode::Edit => self.replace_node(path, node),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::model::{SectionNode, TextNode};
    use crate::toc::NodeKind;
    use serde_json::json;

    fn api_tree() -> TocRootApi {
        serde_json::from_value(json!({
            "text": "Letters",
            "collectionId": 7,
            "type": "title",
            "children": [
                {"type": "section", "text": "1870s", "children": [
                    {"type": "text", "text": "A", "itemId": "7_2"}
                ]},
                {"type": "text", "text": "B", "itemId": "7_5"}
            ]
        }))
        .expect("toc json")
    }

    fn network_error() -> ApiError {
        ApiError {
            kind: ApiErrorKind::Network,
            message: "connection refused".to_string(),
        }
    }

    fn loaded() -> TocSession {
        let mut s = TocSession::new("topelius");
        let ticket = s
            .select_collection("topelius", "7", Some("Letters".to_string()), None, false)
            .expect("select");
        assert!(s.loading);
        assert!(s.finish_load(&ticket, Ok(Some(api_tree()))).is_none());
        s
    }

    #[test]
    fn test_load_normalizes_and_annotates() {
        let s = loaded();
        assert!(!s.loading);
        assert!(!s.dirty);
        let tree = s.tree.as_ref().expect("tree");
        assert_eq!(tree.collection_id, "7");
        let a = &tree.children[0].children().expect("section")[0];
        assert_eq!(a.common().path.as_deref(), Some(&[0, 0][..]));
        assert!(a.common().id.is_some());
    }

    #[test]
    fn test_load_null_data_starts_fresh_root() {
        let mut s = TocSession::new("p");
        let ticket = s
            .select_collection("p", "9", Some("Poems".to_string()), Some("sv".to_string()), false)
            .expect("select");
        assert_eq!(ticket.target.language.as_deref(), Some("sv"));
        s.finish_load(&ticket, Ok(None));
        let tree = s.tree.as_ref().expect("fresh tree");
        assert_eq!(tree.text, "Poems");
        assert_eq!(tree.collection_id, "9");
        assert!(tree.children.is_empty());
        assert!(!s.dirty);
    }

    #[test]
    fn test_load_failure_clears_tree() {
        let mut s = loaded();
        s.delete_node(&[1]);
        let ticket = s.reload(true).expect("reload");
        let notice = s.finish_load(&ticket, Err(network_error())).expect("notice");
        assert!(notice.is_persistent());
        assert!(s.tree.is_none());
        assert!(!s.dirty);
        assert!(!s.loading);
    }

    #[test]
    fn test_stale_load_is_ignored() {
        let mut s = TocSession::new("p");
        let first = s.select_collection("p", "1", None, None, false).expect("select");
        let second = s.select_collection("p", "2", None, None, false).expect("select");
        assert!(s.finish_load(&first, Err(network_error())).is_none());
        assert!(s.loading, "the newer load is still pending");
        s.finish_load(&second, Ok(Some(api_tree())));
        assert!(s.tree.is_some());
        assert_eq!(s.collection_id.as_deref(), Some("2"));
    }

    #[test]
    fn test_edit_marks_dirty_and_discard_requires_confirmation() {
        let mut s = loaded();
        assert!(s.add_node(&[], TocNode::Section(SectionNode::new("Part 2"))));
        assert!(s.dirty);
        assert_eq!(s.reload(false), Err(SessionError::UnsavedChanges));
        assert_eq!(
            s.select_collection("topelius", "8", None, None, false),
            Err(SessionError::UnsavedChanges)
        );
        assert!(s.reload(true).is_ok());
    }

    #[test]
    fn test_invalid_edit_is_noop() {
        let mut s = loaded();
        let before = s.clone();
        assert!(!s.add_node(&[1], TocNode::Text(TextNode::new("x", "7_1"))));
        assert!(s.delete_node(&[]).is_none());
        assert!(!s.move_up(&[0]));
        assert!(!s.move_down(&[1]));
        assert!(s.indent(&[0]).is_none());
        assert_eq!(s, before);
    }

    #[test]
    fn test_edits_reannotate_paths() {
        let mut s = loaded();
        assert!(s.move_up(&[1]));
        let tree = s.tree.as_ref().expect("tree");
        assert_eq!(tree.children[0].text(), "B");
        assert_eq!(tree.children[1].common().path.as_deref(), Some(&[1][..]));
        assert_eq!(
            tree.children[1].children().expect("section")[0].common().path.as_deref(),
            Some(&[1, 0][..])
        );
        assert_eq!(s.outdent(&[1, 0]), Some(vec![2]));
        assert_eq!(s.tree.as_ref().expect("tree").children.len(), 3);
    }

    #[test]
    fn test_save_cycle_clears_dirty() {
        let mut s = loaded();
        s.set_all_collapsed(false);
        assert!(s.dirty);
        let ticket = s.begin_save().expect("save");
        assert!(s.saving);
        assert!(!s.can_save());
        assert_eq!(s.begin_save(), Err(SessionError::Busy));
        assert_eq!(ticket.payload.node_type.as_deref(), Some("title"));
        let notice = s.finish_save(&ticket, Ok(())).expect("notice");
        assert_eq!(notice.level, NoticeLevel::Success);
        assert!(!s.dirty);
        assert!(!s.saving);
    }

    #[test]
    fn test_save_failure_keeps_tree_dirty() {
        let mut s = loaded();
        s.delete_node(&[1]);
        let tree = s.tree.clone();
        let ticket = s.begin_save().expect("save");
        let notice = s.finish_save(&ticket, Err(network_error())).expect("notice");
        assert!(notice.is_persistent());
        assert!(s.dirty);
        assert_eq!(s.tree, tree);
    }

    #[test]
    fn test_edit_during_save_stays_dirty() {
        let mut s = loaded();
        s.delete_node(&[1]);
        let ticket = s.begin_save().expect("save");
        s.set_all_collapsed(false);
        s.finish_save(&ticket, Ok(()));
        assert!(s.dirty);
    }

    #[test]
    fn test_save_without_tree() {
        let mut s = TocSession::new("p");
        assert_eq!(s.begin_save(), Err(SessionError::NoTree));
    }

    #[test]
    fn test_update_from_db_preconditions() {
        let fields: BTreeSet<TocField> = [TocField::Text, TocField::Date].into_iter().collect();

        let mut s = TocSession::new("p");
        assert_eq!(s.begin_update_from_db(&fields), Err(SessionError::NoTree));

        let mut s = loaded();
        assert_eq!(s.begin_update_from_db(&BTreeSet::new()), Err(SessionError::NoFieldsSelected));
        s.delete_node(&[1]);
        assert!(!s.can_update_from_db());
        assert_eq!(s.begin_update_from_db(&fields), Err(SessionError::UnsavedChanges));
    }

    #[test]
    fn test_update_from_db_leaves_tree_dirty() {
        let mut s = loaded();
        let fields: BTreeSet<TocField> = [TocField::FacsimileOnly, TocField::Text].into_iter().collect();
        let ticket = s.begin_update_from_db(&fields).expect("update");
        assert_eq!(ticket.request.update, vec!["text", "facsimileOnly"]);
        assert_eq!(s.begin_update_from_db(&fields), Err(SessionError::Busy));

        let mut raw = api_tree();
        raw.text = Some("Letters (updated)".to_string());
        let notice = s.finish_update_from_db(&ticket, Ok(Some(raw))).expect("notice");
        assert_eq!(notice.level, NoticeLevel::Info);
        assert!(s.dirty);
        assert!(!s.updating);
        assert_eq!(s.tree.as_ref().map(|t| t.text.as_str()), Some("Letters (updated)"));
    }

    #[test]
    fn test_edits_refused_while_update_in_flight() {
        let mut s = loaded();
        let fields: BTreeSet<TocField> = [TocField::Text].into_iter().collect();
        let ticket = s.begin_update_from_db(&fields).expect("update");
        assert!(!s.can_edit());

        assert!(!s.add_node(&[], TocNode::Section(SectionNode::new("Manual"))));
        assert!(s.delete_node(&[1]).is_none());
        assert!(!s.move_down(&[0]));
        assert_eq!(s.tree.as_ref().map(|t| t.children.len()), Some(2));
        assert!(!s.dirty);

        s.finish_update_from_db(&ticket, Ok(Some(api_tree())));
        assert!(s.can_edit());
        assert!(s.add_node(&[], TocNode::Section(SectionNode::new("Manual"))));
        assert_eq!(s.tree.as_ref().map(|t| t.children.len()), Some(3));
    }

    #[test]
    fn test_edits_refused_while_reload_in_flight() {
        let mut s = loaded();
        assert!(s.add_node(&[], TocNode::Text(TextNode::new("Draft", "7_9"))));
        let ticket = s.reload(true).expect("reload");
        assert!(!s.add_node(&[], TocNode::Text(TextNode::new("Lost", "7_10"))));

        s.finish_load(&ticket, Ok(Some(api_tree())));
        assert!(!s.dirty);
        assert_eq!(s.tree.as_ref().map(|t| t.children.len()), Some(2));
        assert!(s.add_node(&[], TocNode::Text(TextNode::new("After", "7_11"))));
    }

    #[test]
    fn test_update_from_db_failure_keeps_tree() {
        let mut s = loaded();
        let fields: BTreeSet<TocField> = [TocField::Text].into_iter().collect();
        let tree = s.tree.clone();
        let ticket = s.begin_update_from_db(&fields).expect("update");
        assert!(s.finish_update_from_db(&ticket, Err(network_error())).is_some());
        assert_eq!(s.tree, tree);
        assert!(!s.dirty);
    }

    #[test]
    fn test_flat_generation_requires_confirmation_when_dirty() {
        let pubs = vec![
            Publication {
                id: 5,
                name: Some("B".to_string()),
                ..Default::default()
            },
            Publication {
                id: 2,
                name: Some("A".to_string()),
                ..Default::default()
            },
        ];
        let mut s = loaded();
        s.delete_node(&[0]);
        assert_eq!(
            s.replace_tree_with_flat(&pubs, Some(SortKey::Name), &BTreeSet::new(), false),
            Err(SessionError::UnsavedChanges)
        );
        s.replace_tree_with_flat(&pubs, Some(SortKey::Name), &BTreeSet::new(), true)
            .expect("generate");
        let tree = s.tree.as_ref().expect("tree");
        assert_eq!(tree.text, "Letters");
        let ids: Vec<_> = tree
            .children
            .iter()
            .map(|n| n.common().item_id.clone().unwrap_or_default())
            .collect();
        assert_eq!(ids, vec!["7_2", "7_5"]);
        assert!(s.dirty);
    }

    #[test]
    fn test_submit_node_form() {
        let mut s = loaded();

        let mut form = NodeForm::new(NodeKind::Section);
        form.text = "  ".to_string();
        assert_eq!(
            s.submit_node_form(DialogMode::Add, &[], &form),
            Err(NodeValidationError::EmptyText)
        );
        assert!(!s.dirty);

        form.text = "Part 2".to_string();
        assert_eq!(s.submit_node_form(DialogMode::Add, &[], &form), Ok(true));
        assert_eq!(s.tree.as_ref().map(|t| t.children.len()), Some(3));

        let node = s.tree.as_ref().and_then(|t| node_at_path(t, &[1])).expect("node");
        let mut form = NodeForm::from_node(node);
        form.text = "B (renamed)".to_string();
        assert_eq!(s.submit_node_form(DialogMode::Edit, &[1], &form), Ok(true));
        assert_eq!(s.tree.as_ref().map(|t| t.children[1].text()), Some("B (renamed)"));

        let section = s.tree.as_ref().and_then(|t| node_at_path(t, &[0])).expect("section");
        let mut form = NodeForm::from_node(section);
        form.kind = NodeKind::Text;
        form.item_id = "7_3".to_string();
        assert_eq!(
            s.submit_node_form(DialogMode::Edit, &[0], &form),
            Err(NodeValidationError::SectionHasChildren)
        );
    }

    #[test]
    fn test_toggle_open_is_not_a_mutation() {
        let mut s = loaded();
        let is_open = |s: &TocSession| match &s.tree.as_ref().expect("tree").children[0] {
            TocNode::Section(sec) => sec.is_open(),
            TocNode::Text(_) => panic!("expected section"),
        };
        assert!(!is_open(&s));
        assert!(s.toggle_open(&[0]));
        assert!(is_open(&s));
        assert!(!s.dirty);
        assert!(!s.toggle_open(&[1]), "text nodes have nothing to open");

        s.set_all_collapsed(true);
        assert!(!is_open(&s), "collapse all overrides row toggles");
    }

    #[test]
    fn test_root_properties() {
        let mut s = loaded();
        let mut props = RootProperties::from_root(s.tree.as_ref().expect("tree"));
        assert!(!s.set_root_properties(&props), "unchanged properties are a no-op");
        assert!(!s.dirty);

        props.introduction_page_name = " Inledning ".to_string();
        assert!(s.set_root_properties(&props));
        assert!(s.dirty);
        assert_eq!(
            s.tree.as_ref().and_then(|t| t.introduction_page_name.as_deref()),
            Some("Inledning")
        );
    }
}
