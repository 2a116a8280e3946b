use crate::components::ui::{
    Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Card, CardContent, CardDescription,
    CardHeader, CardItem, CardList, CardTitle, Input, Label, Spinner,
};
use crate::editor::{NodeDialog, NodeDialogRequest, TocTree, TreeActions};
use crate::models::Publication;
use crate::state::toc_session::{LoadTicket, RootProperties, SessionError};
use crate::state::{AppContext, Notice, NoticeLevel, TocSession};
use crate::storage::{load_recent_collections, save_last_project, write_recent_collection};
use crate::toc::edit::{DialogMode, NodeForm};
use crate::toc::flat::{SortKey, TocField};
use crate::toc::navigate::node_at_path;
use crate::toc::search::to_publication_lites;
use crate::toc::NodeKind;
use leptos::ev;
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_dom::helpers::{set_timeout, window_event_listener};
use leptos_router::hooks::{use_navigate, use_params, use_query_map};
use leptos_router::params::Params;
use std::collections::BTreeSet;
use std::time::Duration;
use strum::IntoEnumIterator;
use tracing::{info, warn};
use wasm_bindgen::JsCast;

const NOTICE_TIMEOUT: Duration = Duration::from_millis(4000);

/// `/toc/<project>/<collectionId>[?lang=<language>]`
pub(crate) fn toc_href(project: &str, collection_id: &str, language: Option<&str>) -> String {
    let mut href = format!(
        "/toc/{}/{}",
        urlencoding::encode(project.trim()),
        urlencoding::encode(collection_id.trim())
    );
    if let Some(lang) = language.map(str::trim).filter(|l| !l.is_empty()) {
        href.push_str("?lang=");
        href.push_str(&urlencoding::encode(lang));
    }
    href
}

#[component]
pub fn CollectionsPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let project = app_state.0.project;
    let collections = app_state.0.collections;
    let loading = app_state.0.collections_loading;
    let error = app_state.0.collections_error;
    let recent = app_state.0.recent_collections;
    let language: RwSignal<String> = RwSignal::new(String::new());
    let token_input: RwSignal<String> = RwSignal::new(String::new());
    let has_token = move || api_client.with(|c| c.token.is_some());

    let set_token = move |token: Option<String>| {
        api_client.update(|c| {
            c.set_token(token);
            c.save_to_storage();
        });
        token_input.set(String::new());
        collections.set(vec![]);
        error.set(None);
    };

    let load_collections = move || {
        let p = project.get_untracked().trim().to_string();
        if p.is_empty() {
            error.set(Some("Enter a project name.".to_string()));
            return;
        }
        save_last_project(&p);
        let client = api_client.get_untracked();
        loading.set(true);
        error.set(None);

        spawn_local(async move {
            match client.get_collections(&p).await {
                Ok(list) => {
                    info!(project = %p, count = list.len(), "collections loaded");
                    collections.set(list);
                }
                Err(e) => {
                    warn!(project = %p, error = %e, "collections load failed");
                    collections.set(vec![]);
                    error.set(Some(e.message));
                }
            }
            loading.set(false);
        });
    };

    Effect::new(move |_| {
        if collections.get_untracked().is_empty() && !project.get_untracked().trim().is_empty() {
            load_collections();
        }
    });

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto w-full max-w-[1080px] px-4 py-8 space-y-4">
                <div class="space-y-1">
                    <h1 class="text-xl font-semibold">"Table of contents"</h1>
                    <p class="text-xs text-muted-foreground">"Pick a collection to edit its table of contents."</p>
                </div>

                <div class="flex items-end gap-2">
                    <div class="space-y-1">
                        <Label class="text-xs">"Project"</Label>
                        <Input bind_value=project class="h-8 w-56 text-sm border-border bg-background" />
                    </div>
                    <div class="space-y-1">
                        <Label class="text-xs">"Language (optional)"</Label>
                        <Input bind_value=language placeholder="e.g. sv" class="h-8 w-32 text-sm border-border bg-background" />
                    </div>
                    <Button
                        size=ButtonSize::Sm
                        attr:disabled=move || loading.get()
                        on:click=move |_| load_collections()
                    >
                        <span class="inline-flex items-center gap-2">
                            <Show when=move || loading.get() fallback=|| ().into_view()>
                                <Spinner />
                            </Show>
                            {move || if loading.get() { "Loading" } else { "Load collections" }}
                        </span>
                    </Button>
                </div>

                <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                    {move || error.get().map(|e| view! {
                        <Alert class="border-destructive/30">
                            <AlertDescription class="text-destructive">{e}</AlertDescription>
                        </Alert>
                    })}
                </Show>

                <Show
                    when=has_token
                    fallback=move || view! {
                        <div class="flex items-end gap-2">
                            <div class="space-y-1">
                                <Label class="text-xs">"Access token"</Label>
                                <Input
                                    r#type="password"
                                    bind_value=token_input
                                    placeholder="Paste the token from the admin login"
                                    class="h-8 w-80 text-sm border-border bg-background"
                                />
                            </div>
                            <Button
                                variant=ButtonVariant::Outline
                                size=ButtonSize::Sm
                                on:click=move |_| set_token(Some(token_input.get_untracked().trim().to_string()))
                            >
                                "Use token"
                            </Button>
                        </div>
                    }
                >
                    <div class="text-xs text-muted-foreground">
                        "Signed in. "
                        <button class="underline hover:text-foreground" on:click=move |_| set_token(None)>
                            "Forget token"
                        </button>
                    </div>
                </Show>

                <Show when=move || !recent.get().is_empty() fallback=|| ().into_view()>
                    <Card>
                        <CardHeader>
                            <CardTitle>"Recently edited"</CardTitle>
                        </CardHeader>
                        <CardContent>
                            <CardList>
                                {move || {
                                    recent
                                        .get()
                                        .into_iter()
                                        .map(|r| {
                                            let href = toc_href(&r.project, &r.collection_id, r.language.as_deref());
                                            let label = if r.title.trim().is_empty() {
                                                format!("Collection {}", r.collection_id)
                                            } else {
                                                r.title.clone()
                                            };
                                            let meta = match &r.language {
                                                Some(l) => format!("{} · #{} · {}", r.project, r.collection_id, l),
                                                None => format!("{} · #{}", r.project, r.collection_id),
                                            };
                                            view! {
                                                <CardItem class="flex flex-col items-start gap-1 rounded-md border px-4 py-2">
                                                    <a class="text-sm font-medium hover:underline" href=href>{label}</a>
                                                    <div class="text-xs text-muted-foreground">{meta}</div>
                                                </CardItem>
                                            }
                                        })
                                        .collect_view()
                                }}
                            </CardList>
                        </CardContent>
                    </Card>
                </Show>

                <Card>
                    <CardHeader>
                        <CardTitle>"Collections"</CardTitle>
                        <CardDescription>
                            {move || format!("{} total", collections.get().len())}
                        </CardDescription>
                    </CardHeader>
                    <CardContent>
                        <Show
                            when=move || !collections.get().is_empty()
                            fallback=move || view! {
                                <div class="text-xs text-muted-foreground">
                                    {move || if loading.get() { "Loading collections..." } else { "No collections loaded." }}
                                </div>
                            }
                        >
                            <CardList>
                                {move || {
                                    let p = project.get();
                                    let lang = language.get();
                                    collections
                                        .get()
                                        .into_iter()
                                        .map(|c| {
                                            let href = toc_href(&p, &c.id.to_string(), Some(&lang));
                                            view! {
                                                <CardItem class="flex items-center justify-between rounded-md border px-4 py-2">
                                                    <a class="text-sm font-medium hover:underline" href=href>{c.title()}</a>
                                                    <div class="text-xs text-muted-foreground">{format!("#{}", c.id)}</div>
                                                </CardItem>
                                            }
                                        })
                                        .collect_view()
                                }}
                            </CardList>
                        </Show>
                    </CardContent>
                </Card>
            </div>
        </div>
    }
}

#[derive(Params, PartialEq, Clone, Debug)]
pub struct TocRouteParams {
    pub project: Option<String>,
    pub collection_id: Option<String>,
}

/// Collection and language named by the current URL.
#[derive(Clone, Debug, PartialEq)]
struct RouteTarget {
    project: String,
    collection_id: String,
    language: Option<String>,
}

impl RouteTarget {
    fn new(project: &str, collection_id: &str, language: Option<&str>) -> Self {
        Self {
            project: project.trim().to_string(),
            collection_id: collection_id.trim().to_string(),
            language: language
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        }
    }

    /// Whether the session already holds this collection in this language.
    fn is_open_in(&self, session: &TocSession) -> bool {
        session.project == self.project
            && session.collection_id.as_deref() == Some(self.collection_id.as_str())
            && session.language == self.language
    }
}

/// Actions that throw the current tree away and need a confirmation when it is dirty.
#[derive(Clone, Debug, PartialEq)]
enum DiscardAction {
    Reload,
    GenerateFlat,
    /// The URL moved to another collection or language.
    OpenRoute(RouteTarget),
    Leave,
}

#[component]
fn FieldChecklist(fields: RwSignal<BTreeSet<TocField>>) -> impl IntoView {
    view! {
        <div class="grid grid-cols-2 gap-2">
            {TocField::iter()
                .map(|field| {
                    view! {
                        <label class="flex items-center gap-2 text-xs">
                            <input
                                type="checkbox"
                                prop:checked=move || fields.with(|f| f.contains(&field))
                                on:change=move |ev: web_sys::Event| {
                                    let checked = ev
                                        .target()
                                        .and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok())
                                        .is_some_and(|i| i.checked());
                                    fields.update(|f| {
                                        if checked {
                                            f.insert(field);
                                        } else {
                                            f.remove(&field);
                                        }
                                    });
                                }
                            />
                            {field.label()}
                        </label>
                    }
                })
                .collect_view()}
        </div>
    }
}

#[component]
fn Snackbar(notice: RwSignal<Option<Notice>>) -> impl IntoView {
    view! {
        {move || notice.get().map(|n| {
            let class = match n.level {
                NoticeLevel::Success => "border-primary/30",
                NoticeLevel::Info => "border-border",
                NoticeLevel::Error => "border-destructive/40 text-destructive",
            };
            view! {
                <div class="fixed bottom-4 right-4 z-50 max-w-md">
                    <Alert class=format!("flex items-start gap-3 bg-background shadow-lg {class}")>
                        <AlertDescription class="flex-1 text-xs">{n.message}</AlertDescription>
                        <button class="text-xs text-muted-foreground hover:text-foreground" on:click=move |_| notice.set(None)>
                            "Dismiss"
                        </button>
                    </Alert>
                </div>
            }
        })}
    }
}

#[component]
pub fn TocPage() -> impl IntoView {
    let app_state = expect_context::<AppContext>();
    let api_client = app_state.0.api_client;
    let collections = app_state.0.collections;
    let recent = app_state.0.recent_collections;
    let params = use_params::<TocRouteParams>();
    let query = use_query_map();
    let navigate = StoredValue::new(use_navigate());

    let session: RwSignal<TocSession> = RwSignal::new(TocSession::default());
    let notice: RwSignal<Option<Notice>> = RwSignal::new(None);

    let publications: RwSignal<Vec<Publication>> = RwSignal::new(vec![]);
    let publications_loading: RwSignal<bool> = RwSignal::new(false);
    let publication_lites = Memo::new(move |_| to_publication_lites(&publications.get()));

    let node_dialog: RwSignal<Option<NodeDialogRequest>> = RwSignal::new(None);
    let delete_target: RwSignal<Option<(Vec<usize>, String)>> = RwSignal::new(None);
    let discard_prompt: RwSignal<Option<DiscardAction>> = RwSignal::new(None);
    let language_input: RwSignal<String> = RwSignal::new(String::new());

    let flat_open: RwSignal<bool> = RwSignal::new(false);
    let flat_sort: RwSignal<Option<SortKey>> = RwSignal::new(Some(SortKey::Name));
    let flat_fields: RwSignal<BTreeSet<TocField>> = RwSignal::new(BTreeSet::new());
    let flat_running: RwSignal<bool> = RwSignal::new(false);

    let update_open: RwSignal<bool> = RwSignal::new(false);
    let update_fields: RwSignal<BTreeSet<TocField>> =
        RwSignal::new([TocField::Text, TocField::Date].into_iter().collect());
    let update_error: RwSignal<Option<String>> = RwSignal::new(None);

    let root_open: RwSignal<bool> = RwSignal::new(false);
    let root_text: RwSignal<String> = RwSignal::new(String::new());
    let root_cover: RwSignal<String> = RwSignal::new(String::new());
    let root_title: RwSignal<String> = RwSignal::new(String::new());
    let root_foreword: RwSignal<String> = RwSignal::new(String::new());
    let root_intro: RwSignal<String> = RwSignal::new(String::new());

    let show_notice = move |n: Notice| {
        let persistent = n.is_persistent();
        notice.set(Some(n.clone()));
        if !persistent {
            set_timeout(
                move || {
                    if notice.try_get_untracked().flatten().as_ref() == Some(&n) {
                        notice.set(None);
                    }
                },
                NOTICE_TIMEOUT,
            );
        }
    };

    let run_load = move |ticket: LoadTicket| {
        let client = api_client.get_untracked();
        spawn_local(async move {
            let t = &ticket.target;
            let result = client
                .get_collection_toc(&t.project, &t.collection_id, t.language.as_deref())
                .await;
            let mut out = None;
            session.update(|s| out = s.finish_load(&ticket, result));
            if let Some(n) = out {
                show_notice(n);
            }
        });
    };

    let load_publications = move |project: String, collection_id: String| {
        let client = api_client.get_untracked();
        publications_loading.set(true);
        spawn_local(async move {
            match client.get_publications(&project, &collection_id).await {
                Ok(list) => publications.set(list),
                Err(e) => {
                    warn!(error = %e, "publication list failed");
                    show_notice(Notice::error(format!("Loading publications failed: {}", e.message)));
                }
            }
            publications_loading.set(false);
        });
    };

    let open_route = move |route: RouteTarget, confirmed: bool| {
        let RouteTarget {
            project,
            collection_id,
            language,
        } = route;
        let title = collections
            .get_untracked()
            .iter()
            .find(|c| c.id.to_string() == collection_id)
            .map(|c| c.title());

        let mut ticket = None;
        session.update(|s| {
            ticket = s
                .select_collection(&project, &collection_id, title.clone(), language.clone(), confirmed)
                .ok();
        });
        let Some(ticket) = ticket else {
            return;
        };

        write_recent_collection(&project, &collection_id, title.as_deref().unwrap_or_default(), language.as_deref());
        recent.set(load_recent_collections());
        load_publications(project, collection_id);
        run_load(ticket);
    };

    // Route params drive which collection is open. Moving away from a dirty tree asks first.
    Effect::new(move |_| {
        let Some(route) = params.get().ok().and_then(|p| {
            let lang = query.get().get("lang");
            Some(RouteTarget::new(&p.project?, &p.collection_id?, lang.as_deref()))
        }) else {
            return;
        };
        language_input.set(route.language.clone().unwrap_or_default());

        if session.with_untracked(|s| route.is_open_in(s)) {
            return;
        }
        if session.with_untracked(|s| s.ensure_can_discard(false)).is_err() {
            discard_prompt.set(Some(DiscardAction::OpenRoute(route)));
            return;
        }
        open_route(route, false);
    });

    let unload_handle = window_event_listener(ev::beforeunload, move |ev: web_sys::BeforeUnloadEvent| {
        if session.try_with_untracked(|s| s.dirty).unwrap_or(false) {
            ev.prevent_default();
            ev.set_return_value("There are unsaved changes.");
        }
    });
    on_cleanup(move || unload_handle.remove());

    let go_to = move |href: String| {
        navigate.with_value(|nav| nav(&href, Default::default()));
    };

    let reload = move |confirmed: bool| {
        let mut res = Err(SessionError::NoTree);
        session.update(|s| res = s.reload(confirmed));
        match res {
            Ok(ticket) => run_load(ticket),
            Err(SessionError::UnsavedChanges) => discard_prompt.set(Some(DiscardAction::Reload)),
            Err(e) => show_notice(Notice::error(e.to_string())),
        }
    };

    let generate_flat = move |confirmed: bool| {
        if session.with_untracked(|s| s.ensure_can_discard(confirmed)).is_err() {
            discard_prompt.set(Some(DiscardAction::GenerateFlat));
            return;
        }
        let Some((project, collection_id)) =
            session.with_untracked(|s| s.collection_id.clone().map(|c| (s.project.clone(), c)))
        else {
            return;
        };
        let client = api_client.get_untracked();
        let sort_by = flat_sort.get_untracked();
        let fields = flat_fields.get_untracked();
        flat_running.set(true);

        spawn_local(async move {
            match client.get_publications(&project, &collection_id).await {
                Ok(list) => {
                    let mut res = Ok(());
                    session.update(|s| res = s.replace_tree_with_flat(&list, sort_by, &fields, true));
                    publications.set(list);
                    match res {
                        Ok(()) => {
                            flat_open.set(false);
                            show_notice(Notice::info("Flat table of contents generated. Review it and save."));
                        }
                        Err(e) => show_notice(Notice::error(e.to_string())),
                    }
                }
                Err(e) => {
                    warn!(error = %e, "publication list failed");
                    show_notice(Notice::error(format!("Loading publications failed: {}", e.message)));
                }
            }
            flat_running.set(false);
        });
    };

    // The route effect does the discard check and the reload.
    let switch_language = move || {
        let lang = language_input.get_untracked();
        let href = session.with_untracked(|s| {
            s.collection_id
                .as_deref()
                .map(|c| toc_href(&s.project, c, Some(&lang)))
        });
        if let Some(href) = href {
            go_to(href);
        }
    };

    // Declining a route change puts the URL back on the collection still open.
    let keep_editing = move |_: ev::MouseEvent| {
        let declined = discard_prompt.get_untracked();
        discard_prompt.set(None);
        if let Some(DiscardAction::OpenRoute(_)) = declined {
            let href = session.with_untracked(|s| {
                s.collection_id
                    .as_deref()
                    .map(|c| toc_href(&s.project, c, s.language.as_deref()))
            });
            if let Some(href) = href {
                go_to(href);
            }
        }
    };

    let leave = move |confirmed: bool| {
        if session.with_untracked(|s| s.ensure_can_discard(confirmed)).is_err() {
            discard_prompt.set(Some(DiscardAction::Leave));
            return;
        }
        go_to("/".to_string());
    };

    let confirm_discard = move |_: ev::MouseEvent| {
        let Some(action) = discard_prompt.get_untracked() else {
            return;
        };
        discard_prompt.set(None);
        match action {
            DiscardAction::Reload => reload(true),
            DiscardAction::GenerateFlat => generate_flat(true),
            DiscardAction::OpenRoute(route) => open_route(route, true),
            DiscardAction::Leave => leave(true),
        }
    };

    let save = move || {
        let mut res = Err(SessionError::NoTree);
        session.update(|s| res = s.begin_save());
        let ticket = match res {
            Ok(t) => t,
            Err(e) => {
                show_notice(Notice::error(e.to_string()));
                return;
            }
        };
        let client = api_client.get_untracked();
        spawn_local(async move {
            let t = &ticket.target;
            let result = client
                .put_collection_toc(&t.project, &t.collection_id, t.language.as_deref(), &ticket.payload)
                .await;
            let mut out = None;
            session.update(|s| out = s.finish_save(&ticket, result));
            if let Some(n) = out {
                show_notice(n);
            }
        });
    };

    let run_update = move || {
        let fields = update_fields.get_untracked();
        let mut res = Err(SessionError::NoTree);
        session.update(|s| res = s.begin_update_from_db(&fields));
        let ticket = match res {
            Ok(t) => t,
            Err(e) => {
                update_error.set(Some(e.to_string()));
                return;
            }
        };
        update_error.set(None);
        update_open.set(false);

        let client = api_client.get_untracked();
        spawn_local(async move {
            let result = client
                .update_toc_items(&ticket.target.project, &ticket.target.collection_id, &ticket.request)
                .await;
            let mut out = None;
            session.update(|s| out = s.finish_update_from_db(&ticket, result));
            if let Some(n) = out {
                show_notice(n);
            }
        });
    };

    let open_root_props = move || {
        let Some(props) = session.with_untracked(|s| s.tree.as_ref().map(RootProperties::from_root)) else {
            return;
        };
        root_text.set(props.text);
        root_cover.set(props.cover_page_name);
        root_title.set(props.title_page_name);
        root_foreword.set(props.foreword_page_name);
        root_intro.set(props.introduction_page_name);
        root_open.set(true);
    };

    let save_root_props = move |_: ev::MouseEvent| {
        let props = RootProperties {
            text: root_text.get_untracked(),
            cover_page_name: root_cover.get_untracked(),
            title_page_name: root_title.get_untracked(),
            foreword_page_name: root_foreword.get_untracked(),
            introduction_page_name: root_intro.get_untracked(),
        };
        session.update(|s| {
            s.set_root_properties(&props);
        });
        root_open.set(false);
    };

    let actions = TreeActions {
        add_child: Callback::new(move |path: Vec<usize>| {
            node_dialog.set(Some(NodeDialogRequest {
                mode: DialogMode::Add,
                path,
                form: NodeForm::new(NodeKind::Text),
            }));
        }),
        edit: Callback::new(move |path: Vec<usize>| {
            let form = session.with_untracked(|s| {
                s.tree
                    .as_ref()
                    .and_then(|t| node_at_path(t, &path))
                    .map(NodeForm::from_node)
            });
            if let Some(form) = form {
                node_dialog.set(Some(NodeDialogRequest {
                    mode: DialogMode::Edit,
                    path,
                    form,
                }));
            }
        }),
        delete: Callback::new(move |path: Vec<usize>| {
            let label = session.with_untracked(|s| {
                s.tree
                    .as_ref()
                    .and_then(|t| node_at_path(t, &path))
                    .map(|n| n.text().to_string())
            });
            if let Some(label) = label {
                delete_target.set(Some((path, label)));
            }
        }),
    };

    let on_node_submit: Callback<NodeDialogRequest, Result<(), String>> =
        Callback::new(move |req: NodeDialogRequest| {
            let mut out = Ok(false);
            session.update(|s| out = s.submit_node_form(req.mode, &req.path, &req.form));
            match out {
                Ok(_) => {
                    node_dialog.set(None);
                    Ok(())
                }
                Err(e) => Err(e.to_string()),
            }
        });

    let confirm_delete = move |_: ev::MouseEvent| {
        if let Some((path, _)) = delete_target.get_untracked() {
            session.update(|s| {
                s.delete_node(&path);
            });
        }
        delete_target.set(None);
    };

    let has_tree = move || session.with(|s| s.tree.is_some());
    let can_edit = move || session.with(|s| s.can_edit());
    let heading = move || {
        session.with(|s| {
            s.tree
                .as_ref()
                .map(|t| t.text.clone())
                .filter(|t| !t.trim().is_empty())
                .or_else(|| s.collection_title.clone())
                .unwrap_or_else(|| format!("Collection {}", s.collection_id.clone().unwrap_or_default()))
        })
    };

    view! {
        <div class="min-h-screen bg-background">
            <div class="mx-auto w-full max-w-[1080px] px-4 py-6 space-y-4">
                <div class="flex items-center justify-between gap-4">
                    <div class="min-w-0 space-y-1">
                        <button class="text-xs text-muted-foreground hover:text-foreground" on:click=move |_| leave(false)>
                            "← Collections"
                        </button>
                        <h1 class="truncate text-xl font-semibold">{heading}</h1>
                        <p class="text-xs text-muted-foreground">
                            {move || session.with(|s| {
                                let mut parts = vec![s.project.clone()];
                                parts.extend(s.collection_id.clone().map(|c| format!("#{c}")));
                                parts.extend(s.language.clone());
                                parts.join(" · ")
                            })}
                            <Show when=move || session.with(|s| s.dirty) fallback=|| ().into_view()>
                                <span class="ml-2 text-warning">"Unsaved changes"</span>
                            </Show>
                        </p>
                    </div>

                    <div class="flex shrink-0 items-end gap-2">
                        <div class="space-y-1">
                            <Label class="text-xs">"Language"</Label>
                            <Input bind_value=language_input placeholder="default" class="h-8 w-24 text-sm border-border bg-background" />
                        </div>
                        <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=move |_| switch_language()>
                            "Switch"
                        </Button>
                    </div>
                </div>

                <div class="flex flex-wrap items-center gap-2">
                    <Button
                        size=ButtonSize::Sm
                        attr:disabled=move || !can_edit()
                        on:click=move |_| node_dialog.set(Some(NodeDialogRequest {
                            mode: DialogMode::Add,
                            path: vec![],
                            form: NodeForm::new(NodeKind::Section),
                        }))
                    >
                        "Add node"
                    </Button>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || !can_edit()
                        on:click=move |_| session.update(|s| {
                            s.set_all_collapsed(false);
                        })
                    >
                        "Expand all"
                    </Button>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || !can_edit()
                        on:click=move |_| session.update(|s| {
                            s.set_all_collapsed(true);
                        })
                    >
                        "Collapse all"
                    </Button>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || !can_edit()
                        on:click=move |_| open_root_props()
                    >
                        "Root properties"
                    </Button>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || session.with(|s| s.collection_id.is_none() || s.is_busy())
                        on:click=move |_| flat_open.set(true)
                    >
                        "Generate flat ToC"
                    </Button>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || !session.with(|s| s.can_update_from_db())
                        attr:title=move || if session.with(|s| s.dirty) { "Save your changes first." } else { "" }
                        on:click=move |_| {
                            update_error.set(None);
                            update_open.set(true);
                        }
                    >
                        <span class="inline-flex items-center gap-2">
                            <Show when=move || session.with(|s| s.updating) fallback=|| ().into_view()>
                                <Spinner />
                            </Show>
                            "Update from database"
                        </span>
                    </Button>
                    <Button
                        variant=ButtonVariant::Outline
                        size=ButtonSize::Sm
                        attr:disabled=move || session.with(|s| s.collection_id.is_none() || s.loading)
                        on:click=move |_| reload(false)
                    >
                        "Reload"
                    </Button>
                    <Button
                        size=ButtonSize::Sm
                        attr:disabled=move || !session.with(|s| s.can_save())
                        on:click=move |_| save()
                    >
                        <span class="inline-flex items-center gap-2">
                            <Show when=move || session.with(|s| s.saving) fallback=|| ().into_view()>
                                <Spinner />
                            </Show>
                            {move || if session.with(|s| s.saving) { "Saving..." } else { "Save" }}
                        </span>
                    </Button>
                </div>

                <Card>
                    <CardContent>
                        <Show
                            when=has_tree
                            fallback=move || view! {
                                <div class="flex items-center gap-2 text-xs text-muted-foreground">
                                    {move || if session.with(|s| s.loading) {
                                        view! { <Spinner /> "Loading table of contents..." }.into_any()
                                    } else {
                                        view! { "No table of contents loaded." }.into_any()
                                    }}
                                </div>
                            }
                        >
                            <TocTree session=session actions=actions />
                        </Show>
                    </CardContent>
                </Card>
            </div>

            {move || node_dialog.get().map(|req| {
                let collection_id = session.with_untracked(|s| s.collection_id.clone().unwrap_or_default());
                view! {
                    <NodeDialog
                        request=req
                        collection_id=collection_id
                        publications=publication_lites
                        publications_loading=publications_loading
                        on_submit=on_node_submit
                        on_cancel=Callback::new(move |_| node_dialog.set(None))
                    />
                }
            })}

            <Show when=move || delete_target.get().is_some() fallback=|| ().into_view()>
                <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                    <div class="w-full max-w-sm rounded-md border border-border bg-background p-4 shadow-lg">
                        <div class="mb-3 space-y-1">
                            <div class="text-sm font-medium text-destructive">"Delete node"</div>
                            <div class="text-xs text-muted-foreground">"The node and everything below it will be removed."</div>
                        </div>
                        <div class="rounded-md border border-border bg-muted px-3 py-2 text-sm">
                            {move || delete_target.get().map(|(_, label)| label).unwrap_or_default()}
                        </div>
                        <div class="flex items-center justify-end gap-2 pt-3">
                            <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=move |_| delete_target.set(None)>
                                "Cancel"
                            </Button>
                            <Button
                                variant=ButtonVariant::Outline
                                size=ButtonSize::Sm
                                class="border-destructive/40 text-destructive"
                                on:click=confirm_delete
                            >
                                "Delete"
                            </Button>
                        </div>
                    </div>
                </div>
            </Show>

            <Show when=move || discard_prompt.get().is_some() fallback=|| ().into_view()>
                <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                    <div class="w-full max-w-sm rounded-md border border-border bg-background p-4 shadow-lg">
                        <div class="mb-3 space-y-1">
                            <div class="text-sm font-medium">"Discard unsaved changes?"</div>
                            <div class="text-xs text-muted-foreground">
                                "The table of contents has changes that have not been saved. They will be lost."
                            </div>
                        </div>
                        <div class="flex items-center justify-end gap-2 pt-2">
                            <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=keep_editing>
                                "Keep editing"
                            </Button>
                            <Button variant=ButtonVariant::Destructive size=ButtonSize::Sm on:click=confirm_discard>
                                "Discard"
                            </Button>
                        </div>
                    </div>
                </div>
            </Show>

            <Show when=move || flat_open.get() fallback=|| ().into_view()>
                <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                    <div class="w-full max-w-md rounded-md border border-border bg-background p-4 shadow-lg">
                        <div class="mb-3 space-y-1">
                            <div class="text-sm font-medium">"Generate flat table of contents"</div>
                            <div class="text-xs text-muted-foreground">
                                "Lists every publication of the collection as a text node. Replaces the current tree."
                            </div>
                        </div>
                        <div class="space-y-3">
                            <div class="space-y-1">
                                <Label class="text-xs">"Sort by"</Label>
                                <select
                                    class="h-8 w-full rounded-md border border-border bg-background px-2 text-sm"
                                    on:change=move |ev: web_sys::Event| {
                                        let value = ev
                                            .target()
                                            .and_then(|t| t.dyn_into::<web_sys::HtmlSelectElement>().ok())
                                            .map(|s| s.value())
                                            .unwrap_or_default();
                                        flat_sort.set(value.parse::<SortKey>().ok());
                                    }
                                >
                                    <option value="" selected=move || flat_sort.get().is_none()>"Publication order"</option>
                                    {SortKey::iter()
                                        .map(|k| view! {
                                            <option value=k.to_string() selected=move || flat_sort.get() == Some(k)>{k.label()}</option>
                                        })
                                        .collect_view()}
                                </select>
                            </div>
                            <div class="space-y-1">
                                <Label class="text-xs">"Include fields"</Label>
                                <FieldChecklist fields=flat_fields />
                            </div>
                            <div class="flex items-center justify-end gap-2 pt-2">
                                <Button
                                    variant=ButtonVariant::Outline
                                    size=ButtonSize::Sm
                                    attr:disabled=move || flat_running.get()
                                    on:click=move |_| flat_open.set(false)
                                >
                                    "Cancel"
                                </Button>
                                <Button
                                    size=ButtonSize::Sm
                                    attr:disabled=move || flat_running.get()
                                    on:click=move |_| generate_flat(false)
                                >
                                    <span class="inline-flex items-center gap-2">
                                        <Show when=move || flat_running.get() fallback=|| ().into_view()>
                                            <Spinner />
                                        </Show>
                                        "Generate"
                                    </span>
                                </Button>
                            </div>
                        </div>
                    </div>
                </div>
            </Show>

            <Show when=move || update_open.get() fallback=|| ().into_view()>
                <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                    <div class="w-full max-w-md rounded-md border border-border bg-background p-4 shadow-lg">
                        <div class="mb-3 space-y-1">
                            <div class="text-sm font-medium">"Update fields from the database"</div>
                            <div class="text-xs text-muted-foreground">
                                "Refreshes the chosen fields of every linked text node from its publication. Save afterwards to keep the result."
                            </div>
                        </div>
                        <div class="space-y-3">
                            <FieldChecklist fields=update_fields />
                            <Show when=move || update_error.get().is_some() fallback=|| ().into_view()>
                                {move || update_error.get().map(|e| view! {
                                    <Alert class="border-destructive/30">
                                        <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                                    </Alert>
                                })}
                            </Show>
                            <div class="flex items-center justify-end gap-2 pt-2">
                                <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=move |_| update_open.set(false)>
                                    "Cancel"
                                </Button>
                                <Button size=ButtonSize::Sm on:click=move |_| run_update()>
                                    "Update"
                                </Button>
                            </div>
                        </div>
                    </div>
                </div>
            </Show>

            <Show when=move || root_open.get() fallback=|| ().into_view()>
                <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
                    <div class="w-full max-w-md rounded-md border border-border bg-background p-4 shadow-lg">
                        <div class="mb-3 space-y-1">
                            <div class="text-sm font-medium">"Root properties"</div>
                            <div class="text-xs text-muted-foreground">"Leave a page name empty to use the default."</div>
                        </div>
                        <div class="space-y-2">
                            <div class="space-y-1">
                                <Label class="text-xs">"Title"</Label>
                                <Input bind_value=root_text class="h-8 text-sm border-border bg-background" />
                            </div>
                            <div class="space-y-1">
                                <Label class="text-xs">"Cover page name"</Label>
                                <Input bind_value=root_cover class="h-8 text-sm border-border bg-background" />
                            </div>
                            <div class="space-y-1">
                                <Label class="text-xs">"Title page name"</Label>
                                <Input bind_value=root_title class="h-8 text-sm border-border bg-background" />
                            </div>
                            <div class="space-y-1">
                                <Label class="text-xs">"Foreword page name"</Label>
                                <Input bind_value=root_foreword class="h-8 text-sm border-border bg-background" />
                            </div>
                            <div class="space-y-1">
                                <Label class="text-xs">"Introduction page name"</Label>
                                <Input bind_value=root_intro class="h-8 text-sm border-border bg-background" />
                            </div>
                            <div class="flex items-center justify-end gap-2 pt-2">
                                <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=move |_| root_open.set(false)>
                                    "Cancel"
                                </Button>
                                <Button size=ButtonSize::Sm on:click=save_root_props>
                                    "Apply"
                                </Button>
                            </div>
                        </div>
                    </div>
                </div>
            </Show>

            <Snackbar notice=notice />
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_target_matches_open_collection() {
        let route = RouteTarget::new(" topelius ", "7", Some(" "));
        assert_eq!(route.language, None);

        let mut session = TocSession::new("topelius");
        assert!(!route.is_open_in(&session));
        session
            .select_collection("topelius", "7", None, None, false)
            .expect("select");
        assert!(route.is_open_in(&session));
        assert!(!RouteTarget::new("topelius", "7", Some("sv")).is_open_in(&session));
        assert!(!RouteTarget::new("topelius", "8", None).is_open_in(&session));
    }

    #[test]
    fn test_toc_href() {
        assert_eq!(toc_href("topelius", "7", None), "/toc/topelius/7");
        assert_eq!(toc_href("topelius", "7", Some("sv")), "/toc/topelius/7?lang=sv");
        assert_eq!(toc_href("topelius", "7", Some(" ")), "/toc/topelius/7");
        assert_eq!(toc_href("my project", "7", None), "/toc/my%20project/7");
    }
}
