use serde::{Deserialize, Serialize};

/// A publication record as listed by the backend for a collection.
///
/// The publication CRUD screens own this record; the ToC editor only reads it for
/// linking text nodes and generating flat ToCs. Optional fields are frequently `null`.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct Publication {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub original_publication_date: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub publication_collection_id: Option<i64>,
}

impl Publication {
    /// Trimmed name, or `None` when missing or blank.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub(crate) struct PublicationCollection {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub published: Option<i64>,
}

impl PublicationCollection {
    pub fn title(&self) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Collection {}", self.id))
    }
}

/// Local-only record of a collection opened in the editor.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub(crate) struct RecentCollection {
    pub project: String,
    pub collection_id: String,
    pub title: String,
    #[serde(default)]
    pub language: Option<String>,
    pub last_opened_ms: i64,
}
