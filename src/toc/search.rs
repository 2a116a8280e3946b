use crate::config::{SEARCH_MAX_RESULTS, SEARCH_MIN_QUERY_CHARS};
use crate::models::Publication;

/// Read-only projection of a publication used by the link-publication picker.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PublicationLite {
    pub id: i64,
    pub name: String,
    pub original_publication_date: Option<String>,
    /// Lowercased `"<id> <name> <date>"`, computed once per listing.
    pub search_key: String,
}

impl From<&Publication> for PublicationLite {
    fn from(p: &Publication) -> Self {
        let name = p.name.clone().unwrap_or_default();
        let date = p
            .original_publication_date
            .clone()
            .filter(|d| !d.trim().is_empty());
        let search_key = format!("{} {} {}", p.id, name, date.as_deref().unwrap_or_default())
            .trim()
            .to_lowercase();

        Self {
            id: p.id,
            name,
            original_publication_date: date,
            search_key,
        }
    }
}

pub(crate) fn to_publication_lites(publications: &[Publication]) -> Vec<PublicationLite> {
    publications.iter().map(PublicationLite::from).collect()
}

/// Filter the picker list by a free-text query.
///
/// Queries shorter than three characters (counted as typed, spaces included) return the
/// whole list; longer ones match case-insensitively against the precomputed search key,
/// stopping at 50 hits.
pub(crate) fn filter_publications(list: &[PublicationLite], query: &str) -> Vec<PublicationLite> {
    if query.chars().count() < SEARCH_MIN_QUERY_CHARS {
        return list.to_vec();
    }

    let needle = query.to_lowercase();
    list.iter()
        .filter(|p| p.search_key.contains(&needle))
        .take(SEARCH_MAX_RESULTS)
        .cloned()
        .collect()
}
