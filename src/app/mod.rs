use crate::config::EnvConfig;
use crate::pages::{CollectionsPage, TocPage};
use crate::state::{AppContext, AppState};
use leptos::prelude::*;
use leptos_router::components::{Route, Router, Routes};
use leptos_router::path;

#[component]
pub fn App() -> impl IntoView {
    provide_context(AppContext(AppState::new(EnvConfig::from_window())));

    view! {
        <Router>
            <Routes fallback=|| view! {
                <div class="px-4 py-8 text-xs text-muted-foreground">
                    "Not found. " <a class="underline" href="/">"Back to collections"</a>
                </div>
            }>
                <Route path=path!("toc/:project/:collection_id") view=TocPage />
                <Route path=path!("") view=CollectionsPage />
            </Routes>
        </Router>
    }
}
