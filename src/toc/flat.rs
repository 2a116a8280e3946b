use super::edit::item_id_for;
use super::model::{NodeCommon, TextNode, TocNode, TocRoot};
use crate::config::{READABLE_DATE_SEPARATOR, UNTITLED_LABEL};
use crate::models::Publication;
use crate::util::locale_compare;
use std::collections::BTreeSet;
use strum::{AsRefStr, Display, EnumIter, EnumString};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum SortKey {
    Id,
    Name,
    OriginalFilename,
    OriginalPublicationDate,
}

impl SortKey {
    pub fn label(&self) -> &'static str {
        match self {
            SortKey::Id => "Publication id",
            SortKey::Name => "Name",
            SortKey::OriginalFilename => "File name",
            SortKey::OriginalPublicationDate => "Publication date",
        }
    }
}

/// Optional node fields, named as on the wire. Used both for the flat generator's
/// `includedFields` and for the update-from-database field list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Display, EnumString, EnumIter, AsRefStr)]
#[strum(serialize_all = "camelCase")]
pub(crate) enum TocField {
    Text,
    Date,
    Description,
    Language,
    Category,
    FacsimileOnly,
}

impl TocField {
    pub fn label(&self) -> &'static str {
        match self {
            TocField::Text => "Text (publication name)",
            TocField::Date => "Date",
            TocField::Description => "Description (readable date)",
            TocField::Language => "Language",
            TocField::Category => "Category (genre)",
            TocField::FacsimileOnly => "Facsimile only",
        }
    }
}

/// `"1876-03-01"` -> `"1.3.1876"`, `"1876"` -> `"1876"`, anything else -> `""`.
///
/// An empty result means "cannot be converted": callers leave the field out.
pub(crate) fn readable_date(date: &str, separator: &str) -> String {
    let date = date.trim();
    let is_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    if date.len() == 4 && is_digits(date) {
        return date.to_string();
    }

    let parts: Vec<&str> = date.split('-').collect();
    match parts.as_slice() {
        [y, m, d]
            if y.len() == 4
                && m.len() == 2
                && d.len() == 2
                && is_digits(y)
                && is_digits(m)
                && is_digits(d) =>
        {
            let strip = |s: &str| s.strip_prefix('0').unwrap_or(s).to_string();
            format!("{}{separator}{}{separator}{}", strip(d), strip(m), y)
        }
        _ => String::new(),
    }
}

fn sort_publications(publications: &mut [&Publication], sort_by: Option<SortKey>) {
    let text = |s: &Option<String>| s.clone().unwrap_or_default();
    match sort_by {
        Some(SortKey::Id) => publications.sort_by_key(|p| p.id),
        Some(SortKey::Name) => publications.sort_by(|a, b| locale_compare(&text(&a.name), &text(&b.name))),
        Some(SortKey::OriginalFilename) => publications.sort_by(|a, b| {
            locale_compare(&text(&a.original_filename), &text(&b.original_filename))
        }),
        Some(SortKey::OriginalPublicationDate) => publications.sort_by(|a, b| {
            locale_compare(
                &text(&a.original_publication_date),
                &text(&b.original_publication_date),
            )
        }),
        None => {}
    }
}

fn flat_text_node(collection_id: &str, p: &Publication, included: &BTreeSet<TocField>) -> TocNode {
    let non_empty = |s: &Option<String>| s.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
    let date = non_empty(&p.original_publication_date);

    let mut node = TextNode {
        common: NodeCommon {
            text: p.display_name().unwrap_or(UNTITLED_LABEL).to_string(),
            item_id: Some(item_id_for(collection_id, p.id)),
            ..Default::default()
        },
        ..Default::default()
    };

    if included.contains(&TocField::Date) {
        node.date = date.clone();
    }
    if included.contains(&TocField::Description) {
        node.description = date
            .as_deref()
            .map(|d| readable_date(d, READABLE_DATE_SEPARATOR))
            .filter(|d| !d.is_empty());
    }
    if included.contains(&TocField::Language) {
        node.common.language = non_empty(&p.language);
    }
    if included.contains(&TocField::Category) {
        node.category = non_empty(&p.genre);
    }
    if included.contains(&TocField::FacsimileOnly) {
        node.facsimile_only = Some(true);
    }

    TocNode::Text(node)
}

/// Build a one-level ToC listing every publication as a text node.
///
/// `sort_by = None` keeps the input order. The result replaces the current tree
/// wholesale; confirming the discard of unsaved edits is up to the caller.
pub(crate) fn generate_flat_toc(
    collection_id: &str,
    publications: &[Publication],
    sort_by: Option<SortKey>,
    collection_title: Option<&str>,
    included: &BTreeSet<TocField>,
) -> TocRoot {
    let mut sorted: Vec<&Publication> = publications.iter().collect();
    sort_publications(&mut sorted, sort_by);

    let mut root = TocRoot::new(collection_id, collection_title.unwrap_or_default());
    root.children = sorted
        .into_iter()
        .map(|p| flat_text_node(collection_id, p, included))
        .collect();
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn publication(id: i64, name: &str, date: &str) -> Publication {
        Publication {
            id,
            name: Some(name.to_string()),
            original_publication_date: Some(date.to_string()),
            ..Default::default()
        }
    }

    fn item_ids(root: &TocRoot) -> Vec<String> {
        root.children
            .iter()
            .map(|n| n.common().item_id.clone().unwrap_or_default())
            .collect()
    }

    #[test]
    fn test_readable_date() {
        assert_eq!(readable_date("1876-03-01", "."), "1.3.1876");
        assert_eq!(readable_date("1876-12-24", "."), "24.12.1876");
        assert_eq!(readable_date("1876", "."), "1876");
        assert_eq!(readable_date("1876-03-XX", "."), "");
        assert_eq!(readable_date("1876-3-1", "."), "");
        assert_eq!(readable_date("", "."), "");
        assert_eq!(readable_date("1876-03-01", "/"), "1/3/1876");
    }

    #[test]
    fn test_sort_by_name_scenario() {
        let pubs = vec![publication(5, "B", "1876-03-01"), publication(2, "A", "1875-01-01")];
        let root = generate_flat_toc("7", &pubs, Some(SortKey::Name), None, &BTreeSet::new());

        let texts: Vec<&str> = root.children.iter().map(|n| n.text()).collect();
        assert_eq!(texts, vec!["A", "B"]);
        assert_eq!(item_ids(&root), vec!["7_2", "7_5"]);
        assert_eq!(root.collection_id, "7");
        assert_eq!(root.node_type(), "title");
    }

    #[test]
    fn test_sort_keys() {
        let mut a = publication(3, "b", "1900");
        a.original_filename = Some("z.xml".to_string());
        let mut b = publication(1, "C", "1800-01-01");
        b.original_filename = Some("a.xml".to_string());
        let c = publication(2, "a", "1850");
        let pubs = vec![a, b, c];
        let none = BTreeSet::new();

        let by = |k: Option<SortKey>| item_ids(&generate_flat_toc("9", &pubs, k, None, &none));
        assert_eq!(by(Some(SortKey::Id)), vec!["9_1", "9_2", "9_3"]);
        assert_eq!(by(Some(SortKey::Name)), vec!["9_2", "9_3", "9_1"]);
        assert_eq!(by(Some(SortKey::OriginalFilename)), vec!["9_2", "9_1", "9_3"]);
        assert_eq!(by(Some(SortKey::OriginalPublicationDate)), vec!["9_1", "9_2", "9_3"]);
        assert_eq!(by(None), vec!["9_3", "9_1", "9_2"]);
        assert!("title".parse::<SortKey>().is_err());
        assert_eq!("original_publication_date".parse::<SortKey>().ok(), Some(SortKey::OriginalPublicationDate));
    }

    #[test]
    fn test_included_fields() {
        let mut p = publication(4, "", "1876-03-01");
        p.language = Some("sv".to_string());
        p.genre = Some("letter".to_string());
        let all: BTreeSet<TocField> = TocField::iter().collect();

        let root = generate_flat_toc("7", &[p.clone()], Some(SortKey::Id), Some("Letters"), &all);
        assert_eq!(root.text, "Letters");
        match &root.children[0] {
            TocNode::Text(t) => {
                assert_eq!(t.common.text, "Untitled");
                assert_eq!(t.date.as_deref(), Some("1876-03-01"));
                assert_eq!(t.description.as_deref(), Some("1.3.1876"));
                assert_eq!(t.common.language.as_deref(), Some("sv"));
                assert_eq!(t.category.as_deref(), Some("letter"));
                assert_eq!(t.facsimile_only, Some(true));
            }
            TocNode::Section(_) => panic!("expected text"),
        }

        let root = generate_flat_toc("7", &[p], None, None, &BTreeSet::new());
        assert_eq!(root.children[0], TocNode::Text(TextNode::new("Untitled", "7_4")));
    }

    #[test]
    fn test_unconvertible_date_omits_description() {
        let p = publication(1, "X", "1876-03-XX");
        let fields: BTreeSet<TocField> = [TocField::Date, TocField::Description].into_iter().collect();
        let root = generate_flat_toc("7", &[p], None, None, &fields);
        match &root.children[0] {
            TocNode::Text(t) => {
                assert_eq!(t.date.as_deref(), Some("1876-03-XX"));
                assert!(t.description.is_none());
            }
            TocNode::Section(_) => panic!("expected text"),
        }
    }

    #[test]
    fn test_field_names_match_wire() {
        assert_eq!(TocField::FacsimileOnly.to_string(), "facsimileOnly");
        assert_eq!(TocField::Text.as_ref(), "text");
        assert_eq!(SortKey::OriginalFilename.to_string(), "original_filename");
    }
}
