pub(crate) mod toc_session;

use crate::api::ApiClient;
use crate::config::EnvConfig;
use crate::models::{PublicationCollection, RecentCollection};
use crate::storage::{load_last_project, load_recent_collections};
use leptos::prelude::*;

pub(crate) use toc_session::{Notice, NoticeLevel, TocSession};

#[derive(Clone)]
pub(crate) struct AppState {
    pub config: StoredValue<EnvConfig>,
    pub api_client: RwSignal<ApiClient>,

    /// Project whose collections the picker lists.
    pub project: RwSignal<String>,

    pub collections: RwSignal<Vec<PublicationCollection>>,
    pub collections_loading: RwSignal<bool>,
    pub collections_error: RwSignal<Option<String>>,

    pub recent_collections: RwSignal<Vec<RecentCollection>>,
}

impl AppState {
    pub fn new(config: EnvConfig) -> Self {
        let client = ApiClient::load_from_storage(&config);
        let project = load_last_project().unwrap_or_else(|| config.project.clone());

        Self {
            config: StoredValue::new(config),
            api_client: RwSignal::new(client),
            project: RwSignal::new(project),
            collections: RwSignal::new(vec![]),
            collections_loading: RwSignal::new(false),
            collections_error: RwSignal::new(None),
            recent_collections: RwSignal::new(load_recent_collections()),
        }
    }
}

#[derive(Clone)]
pub(crate) struct AppContext(pub AppState);
