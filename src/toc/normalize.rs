use super::model::{NodeCommon, SectionNode, TextNode, TocNode, TocRoot};
use super::wire::{TocNodeApi, TocRootApi};

/// Convert a loosely-typed backend node into the strict model.
///
/// - a node with a non-empty `children` array, or one whose `type` is `"section"`, is a
///   section; everything else (including unknown legacy types) is a text node
/// - sections are collapsed unless the backend sent an explicit `false`
/// - the legacy `url` field is dropped
pub(crate) fn normalize_toc_node(raw: TocNodeApi) -> TocNode {
    let children: Vec<TocNode> = raw
        .children
        .unwrap_or_default()
        .into_iter()
        .map(normalize_toc_node)
        .collect();

    let is_section = !children.is_empty() || raw.node_type.as_deref() == Some("section");

    let common = NodeCommon {
        text: raw.text.unwrap_or_default(),
        collection_id: raw.collection_id,
        item_id: raw.item_id,
        language: raw.language,
        id: raw.id,
        is_expanded: raw.is_expanded,
        path: raw.path,
        extra: raw.extra,
    };

    if is_section {
        TocNode::Section(SectionNode {
            common,
            collapsed: raw.collapsed != Some(false),
            children,
        })
    } else {
        TocNode::Text(TextNode {
            common,
            description: raw.description,
            date: raw.date,
            category: raw.category,
            facsimile_only: raw.facsimile_only,
        })
    }
}

pub(crate) fn normalize_toc_root(raw: TocRootApi) -> TocRoot {
    TocRoot {
        text: raw.text.unwrap_or_default(),
        collection_id: raw.collection_id.unwrap_or_default(),
        cover_page_name: raw.cover_page_name,
        title_page_name: raw.title_page_name,
        foreword_page_name: raw.foreword_page_name,
        introduction_page_name: raw.introduction_page_name,
        children: raw
            .children
            .unwrap_or_default()
            .into_iter()
            .map(normalize_toc_node)
            .collect(),
        id: raw.id,
        is_expanded: raw.is_expanded,
        extra: raw.extra,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::model::NodeKind;
    use crate::toc::serialize::to_wire_node;
    use serde_json::json;

    fn node(v: serde_json::Value) -> TocNode {
        normalize_toc_node(serde_json::from_value(v).expect("node json"))
    }

    #[test]
    fn test_empty_section_stays_section() {
        let n = node(json!({"type": "section", "text": "Part 1"}));
        match n {
            TocNode::Section(s) => {
                assert!(s.children.is_empty());
                assert!(s.collapsed);
            }
            TocNode::Text(_) => panic!("expected section"),
        }
    }

    #[test]
    fn test_children_make_a_section_regardless_of_type() {
        let n = node(json!({
            "type": "est",
            "text": "Legacy",
            "children": [{"type": "est", "text": "Leaf", "url": "x"}]
        }));
        assert_eq!(n.kind(), NodeKind::Section);
        assert_eq!(n.children().unwrap()[0].kind(), NodeKind::Text);
    }

    #[test]
    fn test_empty_children_without_section_type_is_text() {
        let n = node(json!({"type": "text", "text": "Leaf", "children": []}));
        assert_eq!(n.kind(), NodeKind::Text);
        let n = node(json!({"text": "Untyped"}));
        assert_eq!(n.kind(), NodeKind::Text);
    }

    #[test]
    fn test_collapsed_only_false_when_explicit_false() {
        let expanded = node(json!({"type": "section", "text": "a", "collapsed": false}));
        let other = node(json!({"type": "section", "text": "a", "collapsed": 0}));
        match (expanded, other) {
            (TocNode::Section(a), TocNode::Section(b)) => {
                assert!(!a.collapsed);
                assert!(b.collapsed);
            }
            _ => panic!("expected sections"),
        }
    }

    #[test]
    fn test_url_dropped_and_extra_kept() {
        let n = node(json!({"text": "Leaf", "itemId": "7_2", "url": "old", "note": "kept"}));
        let back = serde_json::to_value(to_wire_node(&n)).expect("serialize");
        assert!(back.get("url").is_none());
        assert_eq!(back["note"], "kept");
        assert_eq!(back["itemId"], "7_2");
    }

    #[test]
    fn test_section_drops_text_only_fields() {
        let n = node(json!({
            "type": "section",
            "text": "Part",
            "date": "1876",
            "facsimileOnly": true
        }));
        let back = serde_json::to_value(to_wire_node(&n)).expect("serialize");
        assert!(back.get("date").is_none());
        assert!(back.get("facsimileOnly").is_none());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = json!({
            "type": "whatever",
            "text": "Top",
            "collapsed": false,
            "children": [
                {"type": "section", "text": "Empty"},
                {"text": "Leaf", "itemId": "1_2", "date": "1875", "facsimileOnly": false},
                {"text": "Nested", "children": [{"text": "Deep", "itemId": "1_3"}]}
            ]
        });
        let once = node(raw);
        let twice = normalize_toc_node(to_wire_node(&once));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_root_defaults() {
        let root = normalize_toc_root(
            serde_json::from_value(json!({"text": "Letters", "collectionId": 7, "type": "bogus"}))
                .expect("root json"),
        );
        assert_eq!(root.node_type(), "title");
        assert_eq!(root.collection_id, "7");
        assert!(root.children.is_empty());
    }
}
