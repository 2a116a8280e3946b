use super::model::{NodeCommon, NodeKind, SectionNode, TextNode, TocNode, TocRoot};
use super::navigate::{can_move_down, can_move_up, children_at_path_mut, container_at_path, node_at_path};
use super::search::PublicationLite;
use thiserror::Error;
use tracing::debug;

// ---------------------------------------------------------------------------
// Structural operations. Invalid paths are silent no-ops (logged at debug level):
// they can only come from a UI bug, never from user input.
// ---------------------------------------------------------------------------

/// Append `node` to the container at `parent_path`.
pub(crate) fn add_node(root: &mut TocRoot, parent_path: &[usize], node: TocNode) -> bool {
    let Some(children) = children_at_path_mut(root, parent_path) else {
        debug!(?parent_path, "add_node: no container at path");
        return false;
    };
    children.push(node);
    true
}

/// Remove and return the node at `node_path`. The root (empty path) cannot be deleted.
pub(crate) fn delete_node(root: &mut TocRoot, node_path: &[usize]) -> Option<TocNode> {
    let Some((&last, parent)) = node_path.split_last() else {
        debug!("delete_node: refusing to delete the root");
        return None;
    };
    let children = children_at_path_mut(root, parent)?;
    if last >= children.len() {
        debug!(?node_path, "delete_node: index out of range");
        return None;
    }
    Some(children.remove(last))
}

/// Swap the node at `node_path` for `node`, keeping its position.
pub(crate) fn replace_node(root: &mut TocRoot, node_path: &[usize], node: TocNode) -> bool {
    let Some((&last, parent)) = node_path.split_last() else {
        return false;
    };
    match children_at_path_mut(root, parent).and_then(|c| c.get_mut(last)) {
        Some(slot) => {
            *slot = node;
            true
        }
        None => {
            debug!(?node_path, "replace_node: no node at path");
            false
        }
    }
}

/// A drag-and-drop move: take the child at `previous_index` of `source_container` and
/// insert it at `current_index` of `target_container` (the final position of the item).
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct MoveRequest {
    pub source_container: Vec<usize>,
    pub previous_index: usize,
    pub target_container: Vec<usize>,
    pub current_index: usize,
}

impl MoveRequest {
    pub fn within(container: Vec<usize>, previous_index: usize, current_index: usize) -> Self {
        Self {
            source_container: container.clone(),
            previous_index,
            target_container: container,
            current_index,
        }
    }

    fn moved_path(&self) -> Vec<usize> {
        let mut p = self.source_container.clone();
        p.push(self.previous_index);
        p
    }
}

/// Apply a move. The item is removed and reinserted inside this one call, so no caller
/// ever observes it missing from both containers or present in both.
///
/// Returns `false` (tree untouched) when a path does not resolve, when the target lies
/// inside the moved subtree, or when the move would not change anything.
pub(crate) fn move_node(root: &mut TocRoot, req: &MoveRequest) -> bool {
    if req.source_container == req.target_container {
        return move_within(root, &req.source_container, req.previous_index, req.current_index);
    }

    let moved = req.moved_path();
    if req.target_container.starts_with(&moved) {
        debug!(?req, "move_node: cannot move a node into its own subtree");
        return false;
    }

    let source_len = match container_at_path(root, &req.source_container) {
        Some(c) => c.children().len(),
        None => return false,
    };
    if req.previous_index >= source_len || container_at_path(root, &req.target_container).is_none() {
        debug!(?req, "move_node: unresolved source or target");
        return false;
    }

    // Removing the item shifts later siblings one to the left; a target path running
    // through one of them must follow.
    let mut target = req.target_container.clone();
    let depth = req.source_container.len();
    if target.len() > depth
        && target.starts_with(&req.source_container)
        && target[depth] > req.previous_index
    {
        target[depth] -= 1;
    }

    let Some(source) = children_at_path_mut(root, &req.source_container) else {
        return false;
    };
    let item = source.remove(req.previous_index);

    match children_at_path_mut(root, &target) {
        Some(dest) => {
            let at = req.current_index.min(dest.len());
            dest.insert(at, item);
            true
        }
        None => {
            // Unreachable after the checks above; put the item back rather than lose it.
            if let Some(source) = children_at_path_mut(root, &req.source_container) {
                source.insert(req.previous_index, item);
            }
            false
        }
    }
}

fn move_within(root: &mut TocRoot, container: &[usize], from: usize, to: usize) -> bool {
    let Some(children) = children_at_path_mut(root, container) else {
        return false;
    };
    if from >= children.len() {
        debug!(?container, from, "move_node: source index out of range");
        return false;
    }
    let to = to.min(children.len() - 1);
    if from == to {
        return false;
    }
    let item = children.remove(from);
    children.insert(to, item);
    true
}

pub(crate) fn move_up(root: &mut TocRoot, path: &[usize]) -> bool {
    if !can_move_up(Some(&*root), Some(path)) {
        return false;
    }
    let Some((&last, parent)) = path.split_last() else {
        return false;
    };
    move_within(root, parent, last, last - 1)
}

pub(crate) fn move_down(root: &mut TocRoot, path: &[usize]) -> bool {
    if !can_move_down(Some(&*root), Some(path)) {
        return false;
    }
    let Some((&last, parent)) = path.split_last() else {
        return false;
    };
    move_within(root, parent, last, last + 1)
}

/// Nest the node into its previous sibling (which must be a section), as its last child.
/// Returns the node's new path.
pub(crate) fn indent(root: &mut TocRoot, path: &[usize]) -> Option<Vec<usize>> {
    let (&last, parent) = path.split_last()?;
    if last == 0 {
        return None;
    }
    let mut target = parent.to_vec();
    target.push(last - 1);
    let new_index = match node_at_path(root, &target)? {
        TocNode::Section(s) => s.children.len(),
        TocNode::Text(_) => return None,
    };

    let req = MoveRequest {
        source_container: parent.to_vec(),
        previous_index: last,
        target_container: target.clone(),
        current_index: new_index,
    };
    if !move_node(root, &req) {
        return None;
    }
    target.push(new_index);
    Some(target)
}

/// Lift the node out of its section, placing it right after that section.
/// Returns the node's new path.
pub(crate) fn outdent(root: &mut TocRoot, path: &[usize]) -> Option<Vec<usize>> {
    let (&last, parent) = path.split_last()?;
    let (&parent_index, grandparent) = parent.split_last()?;

    let req = MoveRequest {
        source_container: parent.to_vec(),
        previous_index: last,
        target_container: grandparent.to_vec(),
        current_index: parent_index + 1,
    };
    if !move_node(root, &req) {
        return None;
    }
    let mut new_path = grandparent.to_vec();
    new_path.push(parent_index + 1);
    Some(new_path)
}

/// Where a dragged row is dropped relative to the row under the cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DropPlacement {
    Before,
    After,
    /// Append as the last child of the target, which must be a section (or the root,
    /// addressed by the empty path).
    Inside,
}

/// Turn a drop of the node at `source_path` onto `target_path` into a [`MoveRequest`].
///
/// Text nodes never accept `Inside`, and a node cannot be dropped onto itself or into its
/// own subtree. Drops that would leave the tree unchanged resolve to `None`.
pub(crate) fn resolve_drop(
    root: &TocRoot,
    source_path: &[usize],
    target_path: &[usize],
    placement: DropPlacement,
) -> Option<MoveRequest> {
    let (&previous_index, source_container) = source_path.split_last()?;
    node_at_path(root, source_path)?;
    if target_path.starts_with(source_path) {
        return None;
    }

    let (target_container, current_index) = match placement {
        DropPlacement::Inside => {
            let len = container_at_path(root, target_path)?.children().len();
            let same = target_path == source_container;
            (target_path.to_vec(), if same { len - 1 } else { len })
        }
        DropPlacement::Before | DropPlacement::After => {
            let (&target_index, container) = target_path.split_last()?;
            node_at_path(root, target_path)?;
            let mut index = target_index + usize::from(placement == DropPlacement::After);
            if container == source_container && previous_index < index {
                index -= 1;
            }
            (container.to_vec(), index)
        }
    };

    if target_container == source_container && current_index == previous_index {
        return None;
    }

    Some(MoveRequest {
        source_container: source_container.to_vec(),
        previous_index,
        target_container,
        current_index,
    })
}

// ---------------------------------------------------------------------------
// Node edit form.
// ---------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DialogMode {
    Add,
    Edit,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub(crate) enum NodeValidationError {
    #[error("Text is required.")]
    EmptyText,
    #[error("Text nodes must be linked to a publication (item id is required).")]
    MissingItemId,
    #[error("A section that still has children cannot be turned into a text node.")]
    SectionHasChildren,
}

/// Values bound to the node dialog. Empty strings mean "not set".
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NodeForm {
    pub kind: NodeKind,
    pub text: String,
    pub item_id: String,
    pub language: String,
    pub description: String,
    pub date: String,
    pub category: String,
    pub facsimile_only: bool,
    pub collapsed: bool,
}

impl NodeForm {
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            text: String::new(),
            item_id: String::new(),
            language: String::new(),
            description: String::new(),
            date: String::new(),
            category: String::new(),
            facsimile_only: false,
            collapsed: true,
        }
    }

    pub fn from_node(node: &TocNode) -> Self {
        let c = node.common();
        let mut form = Self::new(node.kind());
        form.text = c.text.clone();
        form.item_id = c.item_id.clone().unwrap_or_default();
        form.language = c.language.clone().unwrap_or_default();
        match node {
            TocNode::Section(s) => form.collapsed = s.collapsed,
            TocNode::Text(t) => {
                form.description = t.description.clone().unwrap_or_default();
                form.date = t.date.clone().unwrap_or_default();
                form.category = t.category.clone().unwrap_or_default();
                form.facsimile_only = t.facsimile_only.unwrap_or(false);
            }
        }
        form
    }

    pub fn validate(&self) -> Result<(), NodeValidationError> {
        if self.text.trim().is_empty() {
            return Err(NodeValidationError::EmptyText);
        }
        if self.kind == NodeKind::Text && self.item_id.trim().is_empty() {
            return Err(NodeValidationError::MissingItemId);
        }
        Ok(())
    }

    /// Fill text, date and item id from a chosen publication.
    pub fn link_publication(&mut self, collection_id: &str, publication: &PublicationLite) {
        let name = publication.name.trim();
        self.text = if name.is_empty() {
            crate::config::UNTITLED_LABEL.to_string()
        } else {
            name.to_string()
        };
        self.date = publication
            .original_publication_date
            .clone()
            .unwrap_or_default();
        self.item_id = item_id_for(collection_id, publication.id);
    }

    /// Drop the publication link. `text` keeps whatever it was last set to.
    pub fn unlink_publication(&mut self) {
        self.item_id.clear();
        self.date.clear();
    }
}

pub(crate) fn item_id_for(collection_id: &str, publication_id: i64) -> String {
    format!("{collection_id}_{publication_id}")
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Build the node a dialog submission produces.
///
/// In edit mode the existing node's other fields (unknown backend keys, UI ids, a
/// section's children) are kept and the form values laid over them; fields that are
/// not legal for the resulting type are gone by construction.
pub(crate) fn build_node(
    existing: Option<&TocNode>,
    form: &NodeForm,
    mode: DialogMode,
) -> Result<TocNode, NodeValidationError> {
    form.validate()?;

    let existing = match mode {
        DialogMode::Edit => existing,
        DialogMode::Add => None,
    };

    let mut common = existing
        .map(|n| n.common().clone())
        .unwrap_or_else(NodeCommon::default);
    common.text = form.text.trim().to_string();
    common.item_id = non_empty(&form.item_id);
    common.language = non_empty(&form.language);

    let node = match form.kind {
        NodeKind::Section => {
            let children = match existing {
                Some(TocNode::Section(s)) => s.children.clone(),
                _ => vec![],
            };
            TocNode::Section(SectionNode {
                common,
                collapsed: form.collapsed,
                children,
            })
        }
        NodeKind::Text => {
            if let Some(TocNode::Section(s)) = existing {
                if !s.children.is_empty() {
                    return Err(NodeValidationError::SectionHasChildren);
                }
            }
            TocNode::Text(TextNode {
                common,
                description: non_empty(&form.description),
                date: non_empty(&form.date),
                category: non_empty(&form.category),
                facsimile_only: Some(form.facsimile_only),
            })
        }
    };

    Ok(node)
}
