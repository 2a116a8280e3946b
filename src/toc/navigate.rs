use super::model::{TocContainer, TocNode, TocRoot};

/// Resolve the container (root or section) reached by following `path` from the root.
///
/// Every index must land on a section; an out-of-range index or a text node on the way
/// yields `None`. An empty path is the root itself.
pub(crate) fn container_at_path<'a>(root: &'a TocRoot, path: &[usize]) -> Option<TocContainer<'a>> {
    let mut container = TocContainer::Root(root);
    for &index in path {
        match container.children().get(index) {
            Some(TocNode::Section(s)) => container = TocContainer::Section(s),
            _ => return None,
        }
    }
    Some(container)
}

/// Mutable counterpart of [`container_at_path`], returning the container's children.
pub(crate) fn children_at_path_mut<'a>(
    root: &'a mut TocRoot,
    path: &[usize],
) -> Option<&'a mut Vec<TocNode>> {
    let mut children = &mut root.children;
    for &index in path {
        children = match children.get_mut(index) {
            Some(TocNode::Section(s)) => &mut s.children,
            _ => return None,
        };
    }
    Some(children)
}

pub(crate) fn node_at_path<'a>(root: &'a TocRoot, path: &[usize]) -> Option<&'a TocNode> {
    let (last, parent) = path.split_last()?;
    container_at_path(root, parent)?.children().get(*last)
}

pub(crate) fn node_at_path_mut<'a>(root: &'a mut TocRoot, path: &[usize]) -> Option<&'a mut TocNode> {
    let (last, parent) = path.split_last()?;
    children_at_path_mut(root, parent)?.get_mut(*last)
}

pub(crate) fn can_move_up(root: Option<&TocRoot>, path: Option<&[usize]>) -> bool {
    match (root, path.and_then(|p| p.last())) {
        (Some(_), Some(&last)) => last > 0,
        _ => false,
    }
}

pub(crate) fn can_move_down(root: Option<&TocRoot>, path: Option<&[usize]>) -> bool {
    let (Some(root), Some(path)) = (root, path) else {
        return false;
    };
    let Some((&last, parent)) = path.split_last() else {
        return false;
    };
    container_at_path(root, parent)
        .map(|c| last + 1 < c.children().len())
        .unwrap_or(false)
}

/// `[0, 2, 1]` -> `"0.2.1"`; used as the drag-and-drop payload.
pub(crate) fn format_path(path: &[usize]) -> String {
    path.iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join(".")
}

pub(crate) fn parse_path(s: &str) -> Option<Vec<usize>> {
    let s = s.trim();
    if s.is_empty() {
        return Some(vec![]);
    }
    s.split('.').map(|p| p.parse::<usize>().ok()).collect()
}
