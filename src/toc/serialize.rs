use super::model::{NodeKind, TocNode, TocRoot, ROOT_TYPE};
use super::wire::{TocNodeApi, TocRootApi};

/// Lossless model -> wire conversion (UI fields and defaults included).
pub(crate) fn to_wire_node(node: &TocNode) -> TocNodeApi {
    let c = node.common();
    let mut api = TocNodeApi {
        text: Some(c.text.clone()),
        node_type: Some(node.kind().to_string()),
        collection_id: c.collection_id.clone(),
        item_id: c.item_id.clone(),
        language: c.language.clone(),
        id: c.id.clone(),
        is_expanded: c.is_expanded,
        path: c.path.clone(),
        extra: c.extra.clone(),
        ..Default::default()
    };
    match node {
        TocNode::Section(s) => {
            api.collapsed = Some(s.collapsed);
            api.children = Some(s.children.iter().map(to_wire_node).collect());
        }
        TocNode::Text(t) => {
            api.description = t.description.clone();
            api.date = t.date.clone();
            api.category = t.category.clone();
            api.facsimile_only = t.facsimile_only;
        }
    }
    api
}

fn is_blank(v: &Option<String>) -> bool {
    v.as_deref().map_or(true, |s| s.is_empty())
}

/// Strip one node (and, recursively, its children) down to what the backend stores.
fn strip_for_save(node: &mut TocNodeApi) {
    node.id = None;
    node.is_expanded = None;
    node.path = None;
    node.url = None;

    let is_section = node.node_type.as_deref() == Some(NodeKind::Section.as_ref());
    if is_section {
        node.description = None;
        node.date = None;
        node.category = None;
        node.facsimile_only = None;
        if is_blank(&node.item_id) {
            node.item_id = None;
        }
        // `true` is the default on load; only an explicit `false` is sent.
        if node.collapsed != Some(false) {
            node.collapsed = None;
        }
    } else {
        node.collapsed = None;
        for field in [&mut node.description, &mut node.date, &mut node.category] {
            if is_blank(field) {
                *field = None;
            }
        }
        if node.facsimile_only != Some(true) {
            node.facsimile_only = None;
        }
    }

    if let Some(children) = node.children.as_mut() {
        children.iter_mut().for_each(strip_for_save);
    }
}

/// Produce the payload sent on save. The caller's tree is not touched.
///
/// Loading the result again yields the same tree minus UI-only fields.
pub(crate) fn clean_toc_for_saving(root: &TocRoot) -> TocRootApi {
    let page_name = |v: &Option<String>| v.clone().filter(|s| !s.trim().is_empty());

    let mut children: Vec<TocNodeApi> = root.children.iter().map(to_wire_node).collect();
    children.iter_mut().for_each(strip_for_save);

    TocRootApi {
        text: Some(root.text.clone()),
        node_type: Some(ROOT_TYPE.to_string()),
        collection_id: Some(root.collection_id.clone()),
        cover_page_name: page_name(&root.cover_page_name),
        title_page_name: page_name(&root.title_page_name),
        foreword_page_name: page_name(&root.foreword_page_name),
        introduction_page_name: page_name(&root.introduction_page_name),
        children: Some(children),
        id: None,
        is_expanded: None,
        extra: root.extra.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::model::{SectionNode, TextNode};
    use crate::toc::normalize::{normalize_toc_node, normalize_toc_root};
    use serde_json::json;

    fn loaded() -> TocRoot {
        let raw = json!({
            "text": "Letters",
            "collectionId": "7",
            "type": "title",
            "introductionPageName": "Inledning",
            "children": [
                {
                    "type": "section",
                    "text": "1870s",
                    "collapsed": false,
                    "children": [
                        {"type": "text", "text": "A", "itemId": "7_2", "date": "1875-01-01", "facsimileOnly": true},
                        {"type": "est", "text": "B", "itemId": "7_5", "url": "legacy"}
                    ]
                },
                {"type": "section", "text": "Empty", "itemId": ""},
                {"text": "Loose", "itemId": "7_9", "description": "", "extraKey": [1, 2]}
            ]
        });
        normalize_toc_root(serde_json::from_value(raw).expect("root json"))
    }

    #[test]
    fn test_clean_strips_ui_and_default_fields() {
        let mut root = loaded();
        root.annotate_ui_fields(&mut || "ui".to_string());
        root.is_expanded = Some(true);
        let v = serde_json::to_value(clean_toc_for_saving(&root)).expect("serialize");

        assert!(v.get("id").is_none());
        assert!(v.get("isExpanded").is_none());
        assert_eq!(v["type"], "title");
        assert_eq!(v["introductionPageName"], "Inledning");
        assert!(v.get("coverPageName").is_none());

        let s = &v["children"][0];
        assert_eq!(s["collapsed"], false);
        assert!(s.get("path").is_none());
        assert!(s.get("id").is_none());
        assert_eq!(s["children"][0]["facsimileOnly"], true);
        assert!(s["children"][1].get("facsimileOnly").is_none());
        assert!(s["children"][1].get("url").is_none());
        assert!(s["children"][1].get("collapsed").is_none());

        let empty = &v["children"][1];
        assert!(empty.get("collapsed").is_none(), "true is implicit");
        assert!(empty.get("itemId").is_none());
        assert_eq!(empty["children"], json!([]));

        let loose = &v["children"][2];
        assert!(loose.get("description").is_none());
        assert_eq!(loose["extraKey"], json!([1, 2]));
        assert_eq!(loose["type"], "text");
    }

    #[test]
    fn test_clean_does_not_mutate_input() {
        let mut root = loaded();
        root.annotate_ui_fields(&mut || "ui".to_string());
        let before = root.clone();
        let _ = clean_toc_for_saving(&root);
        assert_eq!(root, before);
    }

    #[test]
    fn test_save_reload_roundtrip() {
        let mut root = loaded();
        let reloaded_from = |r: &TocRoot| {
            let json = serde_json::to_string(&clean_toc_for_saving(r)).expect("serialize");
            normalize_toc_root(serde_json::from_str(&json).expect("parse"))
        };

        let once = reloaded_from(&root);
        root.annotate_ui_fields(&mut || "ui".to_string());
        let twice = reloaded_from(&reloaded_from(&root));
        assert_eq!(once, twice);

        // Modulo the facsimileOnly/itemId defaults, the reload equals the original.
        let mut expected = loaded();
        if let TocNode::Section(s) = &mut expected.children[1] {
            s.common.item_id = None;
        }
        if let TocNode::Text(t) = &mut expected.children[2] {
            t.description = None;
        }
        assert_eq!(once, expected);
    }

    #[test]
    fn test_text_node_defaults_collapse_on_save() {
        let mut t = TextNode::new("Leaf", "1_1");
        t.facsimile_only = Some(false);
        t.date = Some(String::new());
        let api = {
            let mut a = to_wire_node(&TocNode::Text(t));
            strip_for_save(&mut a);
            a
        };
        assert!(api.facsimile_only.is_none());
        assert!(api.date.is_none());
        assert!(api.children.is_none());

        let back = normalize_toc_node(api);
        assert_eq!(back, TocNode::Text(TextNode::new("Leaf", "1_1")));
    }

    #[test]
    fn test_section_without_children_keeps_array() {
        let mut root = TocRoot::new("1", "Root");
        root.children.push(TocNode::Section(SectionNode::new("Part 1")));
        let v = serde_json::to_value(clean_toc_for_saving(&root)).expect("serialize");
        assert_eq!(v["children"][0], json!({"type": "section", "text": "Part 1", "children": []}));
        assert_eq!(v["collectionId"], "1");
    }
}
