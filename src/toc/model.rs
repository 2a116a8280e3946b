use serde_json::{Map, Value};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Fixed `type` tag carried by every ToC root.
pub(crate) const ROOT_TYPE: &str = "title";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub(crate) enum NodeKind {
    Section,
    #[default]
    Text,
}

/// Fields shared by section and text nodes.
///
/// `id`, `is_expanded` and `path` are UI-only: they are recomputed on every change
/// and never sent to the backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct NodeCommon {
    pub text: String,
    pub collection_id: Option<String>,
    /// `"<collectionId>_<publicationId>"`.
    pub item_id: Option<String>,
    pub language: Option<String>,

    pub id: Option<String>,
    pub is_expanded: Option<bool>,
    pub path: Option<Vec<usize>>,

    /// Backend fields this client does not model; written back unchanged.
    pub extra: Map<String, Value>,
}

impl NodeCommon {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub(crate) fn clear_ui_fields(&mut self) {
        self.id = None;
        self.is_expanded = None;
        self.path = None;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SectionNode {
    pub common: NodeCommon,
    pub collapsed: bool,
    pub children: Vec<TocNode>,
}

impl SectionNode {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            common: NodeCommon::with_text(text),
            collapsed: true,
            children: vec![],
        }
    }

    /// Whether the tree view shows the children. A per-row toggle (`isExpanded`)
    /// overrides the persisted `collapsed` flag.
    pub fn is_open(&self) -> bool {
        self.common.is_expanded.unwrap_or(!self.collapsed)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TextNode {
    pub common: NodeCommon,
    pub description: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
    pub facsimile_only: Option<bool>,
}

impl TextNode {
    pub fn new(text: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            common: NodeCommon {
                item_id: Some(item_id.into()),
                ..NodeCommon::with_text(text)
            },
            ..Default::default()
        }
    }
}

/// A ToC node. The variant decides which optional fields exist at all, so a section can
/// never carry `date`/`description`/`category`/`facsimileOnly` and a text node can never
/// carry `children`/`collapsed`.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum TocNode {
    Section(SectionNode),
    Text(TextNode),
}

impl TocNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            TocNode::Section(_) => NodeKind::Section,
            TocNode::Text(_) => NodeKind::Text,
        }
    }

    pub fn common(&self) -> &NodeCommon {
        match self {
            TocNode::Section(s) => &s.common,
            TocNode::Text(t) => &t.common,
        }
    }

    pub fn common_mut(&mut self) -> &mut NodeCommon {
        match self {
            TocNode::Section(s) => &mut s.common,
            TocNode::Text(t) => &mut t.common,
        }
    }

    pub fn text(&self) -> &str {
        &self.common().text
    }

    pub fn is_section(&self) -> bool {
        matches!(self, TocNode::Section(_))
    }

    pub fn children(&self) -> Option<&[TocNode]> {
        match self {
            TocNode::Section(s) => Some(&s.children),
            TocNode::Text(_) => None,
        }
    }
}

/// Document root of a collection's table of contents. Its `type` is always `"title"`.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct TocRoot {
    pub text: String,
    pub collection_id: String,
    pub cover_page_name: Option<String>,
    pub title_page_name: Option<String>,
    pub foreword_page_name: Option<String>,
    pub introduction_page_name: Option<String>,
    pub children: Vec<TocNode>,

    pub id: Option<String>,
    pub is_expanded: Option<bool>,

    pub extra: Map<String, Value>,
}

impl TocRoot {
    pub fn new(collection_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            collection_id: collection_id.into(),
            ..Default::default()
        }
    }

    pub fn node_type(&self) -> &'static str {
        ROOT_TYPE
    }

    /// Recompute `path` on every node and give nodes without one a synthetic `id`.
    pub(crate) fn annotate_ui_fields(&mut self, next_id: &mut impl FnMut() -> String) {
        if self.id.is_none() {
            self.id = Some(next_id());
        }
        annotate_children(&mut self.children, &mut Vec::new(), next_id);
    }

    pub(crate) fn clear_ui_fields(&mut self) {
        self.id = None;
        self.is_expanded = None;
        for_each_node_mut(&mut self.children, &mut |n| n.common_mut().clear_ui_fields());
    }

    /// Set `collapsed` on every section. Returns whether anything changed.
    pub(crate) fn set_all_collapsed(&mut self, collapsed: bool) -> bool {
        let mut changed = false;
        for_each_node_mut(&mut self.children, &mut |n| {
            if let TocNode::Section(s) = n {
                if s.collapsed != collapsed {
                    s.collapsed = collapsed;
                    changed = true;
                }
            }
        });
        changed
    }

    /// Drop every per-row expand toggle so `collapsed` decides again.
    pub(crate) fn clear_expanded(&mut self) {
        for_each_node_mut(&mut self.children, &mut |n| n.common_mut().is_expanded = None);
    }

    pub fn node_count(&self) -> usize {
        fn count(xs: &[TocNode]) -> usize {
            xs.iter()
                .map(|n| 1 + n.children().map(count).unwrap_or(0))
                .sum()
        }
        count(&self.children)
    }
}

fn annotate_children(
    children: &mut [TocNode],
    prefix: &mut Vec<usize>,
    next_id: &mut impl FnMut() -> String,
) {
    for (i, node) in children.iter_mut().enumerate() {
        prefix.push(i);
        let common = node.common_mut();
        common.path = Some(prefix.clone());
        if common.id.is_none() {
            common.id = Some(next_id());
        }
        if let TocNode::Section(s) = node {
            annotate_children(&mut s.children, prefix, next_id);
        }
        prefix.pop();
    }
}

fn for_each_node_mut(children: &mut [TocNode], f: &mut impl FnMut(&mut TocNode)) {
    for node in children.iter_mut() {
        f(node);
        if let TocNode::Section(s) = node {
            for_each_node_mut(&mut s.children, f);
        }
    }
}

/// Something with ordered children: the root or a section node.
#[derive(Clone, Copy, Debug)]
pub(crate) enum TocContainer<'a> {
    Root(&'a TocRoot),
    Section(&'a SectionNode),
}

impl<'a> TocContainer<'a> {
    pub fn children(&self) -> &'a [TocNode] {
        match self {
            TocContainer::Root(r) => &r.children,
            TocContainer::Section(s) => &s.children,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self, TocContainer::Root(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TocRoot {
        let mut part = SectionNode::new("Part 1");
        part.children.push(TocNode::Text(TextNode::new("Letter", "7_2")));
        let mut root = TocRoot::new("7", "Letters");
        root.children.push(TocNode::Section(part));
        root.children.push(TocNode::Text(TextNode::new("Epilogue", "7_9")));
        root
    }

    #[test]
    fn test_node_kind_strings() {
        assert_eq!(NodeKind::Section.to_string(), "section");
        assert_eq!("text".parse::<NodeKind>().ok(), Some(NodeKind::Text));
        assert!("chapter".parse::<NodeKind>().is_err());
    }

    #[test]
    fn test_annotate_assigns_paths_and_ids() {
        let mut root = sample();
        let mut n = 0;
        root.annotate_ui_fields(&mut || {
            n += 1;
            format!("ui-{n}")
        });

        assert_eq!(root.id.as_deref(), Some("ui-1"));
        assert_eq!(root.children[0].common().path, Some(vec![0]));
        assert_eq!(
            root.children[0].children().unwrap()[0].common().path,
            Some(vec![0, 0])
        );
        assert_eq!(root.children[1].common().path, Some(vec![1]));

        // Existing ids survive re-annotation.
        let before = root.children[1].common().id.clone();
        root.annotate_ui_fields(&mut || "fresh".to_string());
        assert_eq!(root.children[1].common().id, before);
    }

    #[test]
    fn test_clear_ui_fields() {
        let mut root = sample();
        root.annotate_ui_fields(&mut || "x".to_string());
        root.is_expanded = Some(true);
        root.clear_ui_fields();
        assert_eq!(root, sample());
    }

    #[test]
    fn test_set_all_collapsed_reports_change() {
        let mut root = sample();
        assert!(!root.set_all_collapsed(true));
        assert!(root.set_all_collapsed(false));
        match &root.children[0] {
            TocNode::Section(s) => assert!(!s.collapsed),
            TocNode::Text(_) => panic!("expected section"),
        }
    }

    #[test]
    fn test_node_count_and_container() {
        let root = sample();
        assert_eq!(root.node_count(), 3);
        let c = TocContainer::Root(&root);
        assert!(c.is_root());
        assert_eq!(c.children().len(), 2);
        assert_eq!(root.node_type(), "title");
    }
}
