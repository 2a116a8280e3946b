use crate::components::ui::{Alert, AlertDescription, Button, ButtonSize, ButtonVariant, Input, Label};
use crate::state::TocSession;
use crate::toc::edit::{resolve_drop, DialogMode, DropPlacement, NodeForm};
use crate::toc::navigate::{can_move_down, can_move_up, format_path, parse_path};
use crate::toc::search::{filter_publications, PublicationLite};
use crate::toc::{NodeKind, TocNode, TocRoot};
use leptos::prelude::*;
use tracing::debug;
use wasm_bindgen::JsCast;

const DRAG_MIME: &str = "text/plain";

/// One visible line of the tree view.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct TreeRow {
    pub path: Vec<usize>,
    pub depth: usize,
    pub text: String,
    pub kind: NodeKind,
    pub item_id: Option<String>,
    pub date: Option<String>,
    pub child_count: usize,
    pub open: bool,
    pub can_up: bool,
    pub can_down: bool,
    /// The previous sibling is a section this node can move into.
    pub can_indent: bool,
}

/// Depth-first list of the rows to render; children of closed sections are skipped.
pub(crate) fn visible_rows(root: &TocRoot) -> Vec<TreeRow> {
    fn walk(root: &TocRoot, nodes: &[TocNode], prefix: &mut Vec<usize>, out: &mut Vec<TreeRow>) {
        for (i, node) in nodes.iter().enumerate() {
            prefix.push(i);
            let (child_count, open, date) = match node {
                TocNode::Section(s) => (s.children.len(), s.is_open(), None),
                TocNode::Text(t) => (0, false, t.date.clone()),
            };
            out.push(TreeRow {
                path: prefix.clone(),
                depth: prefix.len() - 1,
                text: node.text().to_string(),
                kind: node.kind(),
                item_id: node.common().item_id.clone(),
                date,
                child_count,
                open,
                can_up: can_move_up(Some(root), Some(prefix.as_slice())),
                can_down: can_move_down(Some(root), Some(prefix.as_slice())),
                can_indent: i > 0 && nodes[i - 1].is_section(),
            });
            if let (TocNode::Section(s), true) = (node, open) {
                walk(root, &s.children, prefix, out);
            }
            prefix.pop();
        }
    }

    let mut out = Vec::new();
    walk(root, &root.children, &mut Vec::new(), &mut out);
    out
}

/// Where on a row the cursor is: the top half means before and the bottom half after.
/// Sections also take the middle third as "drop inside".
pub(crate) fn drop_placement(is_section: bool, top: f64, height: f64, y: f64) -> DropPlacement {
    let offset = y - top;
    if is_section && height > 0.0 {
        let third = height / 3.0;
        if offset >= third && offset < 2.0 * third {
            return DropPlacement::Inside;
        }
    }
    if offset < height / 2.0 {
        DropPlacement::Before
    } else {
        DropPlacement::After
    }
}

fn dragged_path(ev: &web_sys::DragEvent) -> Option<Vec<usize>> {
    let raw = ev.data_transfer()?.get_data(DRAG_MIME).ok()?;
    parse_path(&raw)
}

fn apply_drop(session: RwSignal<TocSession>, source: &[usize], target: &[usize], placement: DropPlacement) {
    session.update(|s| {
        let Some(req) = s.tree.as_ref().and_then(|t| resolve_drop(t, source, target, placement)) else {
            debug!(?source, ?target, ?placement, "drop rejected");
            return;
        };
        s.move_node(&req);
    });
}

/// What the tree asks its page to do.
#[derive(Clone, Copy)]
pub(crate) struct TreeActions {
    pub add_child: Callback<Vec<usize>>,
    pub edit: Callback<Vec<usize>>,
    pub delete: Callback<Vec<usize>>,
}

#[component]
pub fn TocTree(session: RwSignal<TocSession>, actions: TreeActions) -> impl IntoView {
    let drop_hint: RwSignal<Option<(Vec<usize>, DropPlacement)>> = RwSignal::new(None);

    let rows = move || {
        session.with(|s| s.tree.as_ref().map(visible_rows).unwrap_or_default())
    };

    view! {
        <div class="flex flex-col" on:dragend=move |_| drop_hint.set(None)>
            <Show
                when=move || !rows().is_empty()
                fallback=|| view! {
                    <div class="px-2 py-6 text-xs text-muted-foreground">
                        "This table of contents is empty. Add a section or a text to get started."
                    </div>
                }
            >
                {move || {
                    rows()
                        .into_iter()
                        .map(|row| view! { <TocRow row=row session=session actions=actions drop_hint=drop_hint /> })
                        .collect_view()
                }}
            </Show>

            // Dropping here appends to the root.
            <div
                class=move || {
                    let active = drop_hint.get().is_some_and(|(p, _)| p.is_empty());
                    if active {
                        "mt-2 rounded-md border border-dashed border-primary bg-primary/10 px-2 py-2 text-xs text-muted-foreground"
                    } else {
                        "mt-2 rounded-md border border-dashed border-border px-2 py-2 text-xs text-muted-foreground"
                    }
                }
                on:dragover=move |ev: web_sys::DragEvent| {
                    ev.prevent_default();
                    drop_hint.set(Some((vec![], DropPlacement::Inside)));
                }
                on:dragleave=move |_| drop_hint.set(None)
                on:drop=move |ev: web_sys::DragEvent| {
                    ev.prevent_default();
                    drop_hint.set(None);
                    if let Some(source) = dragged_path(&ev) {
                        apply_drop(session, &source, &[], DropPlacement::Inside);
                    }
                }
            >
                "Drop here to move to the end"
            </div>
        </div>
    }
}

#[component]
fn TocRow(
    row: TreeRow,
    session: RwSignal<TocSession>,
    actions: TreeActions,
    drop_hint: RwSignal<Option<(Vec<usize>, DropPlacement)>>,
) -> impl IntoView {
    let path = StoredValue::new(row.path.clone());
    let is_section = row.kind == NodeKind::Section;
    let indent_px = row.depth * 20;
    let (can_up, can_down, can_indent) = (row.can_up, row.can_down, row.can_indent);
    let can_outdent = row.depth > 0;
    let locked = move || !session.with(|s| s.can_edit());

    let hint_class = move || {
        let base = "group flex items-center gap-2 rounded-md border px-2 py-1";
        match drop_hint.get() {
            Some((p, placement)) if p == path.get_value() => match placement {
                DropPlacement::Before => format!("{base} border-transparent border-t-primary"),
                DropPlacement::After => format!("{base} border-transparent border-b-primary"),
                DropPlacement::Inside => format!("{base} border-primary bg-primary/10"),
            },
            _ => format!("{base} border-transparent hover:bg-accent/50"),
        }
    };

    let placement_for = move |ev: &web_sys::DragEvent| {
        ev.current_target()
            .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            .map(|el| el.get_bounding_client_rect())
            .map(|rect| drop_placement(is_section, rect.top(), rect.height(), ev.client_y() as f64))
            .unwrap_or(DropPlacement::After)
    };

    let (bullet, bullet_title) = match (is_section, row.open) {
        (true, true) => ("▾", "Collapse"),
        (true, false) => ("▸", "Expand"),
        (false, _) => ("•", ""),
    };

    let subtitle = match row.kind {
        NodeKind::Section => format!("Section · {} item(s)", row.child_count),
        NodeKind::Text => {
            let mut parts = vec![row.item_id.clone().unwrap_or_else(|| "unlinked".to_string())];
            parts.extend(row.date.clone());
            parts.join(" · ")
        }
    };

    view! {
        <div style=format!("padding-left: {}px", indent_px)>
            <div
                class=hint_class
                draggable=move || if locked() { "false" } else { "true" }
                on:dragstart=move |ev: web_sys::DragEvent| {
                    if let Some(dt) = ev.data_transfer() {
                        let _ = dt.set_data(DRAG_MIME, &format_path(&path.get_value()));
                        dt.set_effect_allowed("move");
                    }
                }
                on:dragover=move |ev: web_sys::DragEvent| {
                    ev.prevent_default();
                    if let Some(dt) = ev.data_transfer() {
                        dt.set_drop_effect("move");
                    }
                    drop_hint.set(Some((path.get_value(), placement_for(&ev))));
                }
                on:drop=move |ev: web_sys::DragEvent| {
                    ev.prevent_default();
                    ev.stop_propagation();
                    drop_hint.set(None);
                    let Some(source) = dragged_path(&ev) else {
                        return;
                    };
                    apply_drop(session, &source, &path.get_value(), placement_for(&ev));
                }
            >
                <button
                    class="h-5 w-5 text-base leading-none text-muted-foreground hover:text-foreground/80 disabled:cursor-default"
                    disabled=!is_section
                    title=bullet_title
                    on:click=move |_| {
                        session.update(|s| {
                            s.toggle_open(&path.get_value());
                        });
                    }
                >
                    {bullet}
                </button>

                <div class="min-w-0 flex-1 cursor-pointer" on:dblclick=move |_| {
                    if !locked() {
                        actions.edit.run(path.get_value());
                    }
                }>
                    <div class=if is_section { "truncate text-sm font-medium" } else { "truncate text-sm" }>
                        {row.text.clone()}
                    </div>
                    <div class="truncate text-xs text-muted-foreground">{subtitle}</div>
                </div>

                <div class="flex shrink-0 items-center gap-1 opacity-60 group-hover:opacity-100">
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        attr:title="Move up"
                        attr:disabled=move || !can_up || locked()
                        on:click=move |_| session.update(|s| {
                            s.move_up(&path.get_value());
                        })
                    >
                        "↑"
                    </Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        attr:title="Move down"
                        attr:disabled=move || !can_down || locked()
                        on:click=move |_| session.update(|s| {
                            s.move_down(&path.get_value());
                        })
                    >
                        "↓"
                    </Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        attr:title="Move out of the section"
                        attr:disabled=move || !can_outdent || locked()
                        on:click=move |_| session.update(|s| {
                            s.outdent(&path.get_value());
                        })
                    >
                        "←"
                    </Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        attr:title="Move into the section above"
                        attr:disabled=move || !can_indent || locked()
                        on:click=move |_| session.update(|s| {
                            s.indent(&path.get_value());
                        })
                    >
                        "→"
                    </Button>
                    <Show when=move || is_section fallback=|| ().into_view()>
                        <Button
                            variant=ButtonVariant::Ghost
                            size=ButtonSize::Xs
                            attr:title="Add a child"
                            attr:disabled=locked
                            on:click=move |_| actions.add_child.run(path.get_value())
                        >
                            "+"
                        </Button>
                    </Show>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        attr:disabled=locked
                        on:click=move |_| actions.edit.run(path.get_value())
                    >
                        "Edit"
                    </Button>
                    <Button
                        variant=ButtonVariant::Ghost
                        size=ButtonSize::Xs
                        class="text-destructive"
                        attr:disabled=locked
                        on:click=move |_| actions.delete.run(path.get_value())
                    >
                        "Delete"
                    </Button>
                </div>
            </div>
        </div>
    }
}

/// Everything needed to open the node dialog.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct NodeDialogRequest {
    pub mode: DialogMode,
    /// Parent container in add mode, the edited node in edit mode.
    pub path: Vec<usize>,
    pub form: NodeForm,
}

#[component]
fn CheckboxField(label: &'static str, checked: RwSignal<bool>) -> impl IntoView {
    view! {
        <label class="flex items-center gap-2 text-xs">
            <input
                type="checkbox"
                prop:checked=move || checked.get()
                on:change=move |ev: web_sys::Event| {
                    if let Some(input) = ev.target().and_then(|t| t.dyn_into::<web_sys::HtmlInputElement>().ok()) {
                        checked.set(input.checked());
                    }
                }
            />
            {label}
        </label>
    }
}

/// Add/edit dialog for a single node. `on_submit` returns the validation message to
/// show when the form is rejected.
#[component]
pub fn NodeDialog(
    request: NodeDialogRequest,
    collection_id: String,
    #[prop(into)] publications: Signal<Vec<PublicationLite>>,
    #[prop(into)] publications_loading: Signal<bool>,
    on_submit: Callback<NodeDialogRequest, Result<(), String>>,
    on_cancel: Callback<()>,
) -> impl IntoView {
    let NodeDialogRequest { mode, path, form } = request;
    let path = StoredValue::new(path);
    let collection_id = StoredValue::new(collection_id);

    let kind = RwSignal::new(form.kind);
    let text = RwSignal::new(form.text);
    let item_id = RwSignal::new(form.item_id);
    let language = RwSignal::new(form.language);
    let description = RwSignal::new(form.description);
    let date = RwSignal::new(form.date);
    let category = RwSignal::new(form.category);
    let facsimile_only = RwSignal::new(form.facsimile_only);
    let collapsed = RwSignal::new(form.collapsed);
    let query: RwSignal<String> = RwSignal::new(String::new());
    let error: RwSignal<Option<String>> = RwSignal::new(None);

    let current_form = move || NodeForm {
        kind: kind.get_untracked(),
        text: text.get_untracked(),
        item_id: item_id.get_untracked(),
        language: language.get_untracked(),
        description: description.get_untracked(),
        date: date.get_untracked(),
        category: category.get_untracked(),
        facsimile_only: facsimile_only.get_untracked(),
        collapsed: collapsed.get_untracked(),
    };

    let load_form = move |f: NodeForm| {
        text.set(f.text);
        item_id.set(f.item_id);
        date.set(f.date);
    };

    let link = move |p: PublicationLite| {
        let mut f = current_form();
        f.link_publication(&collection_id.get_value(), &p);
        load_form(f);
    };

    let unlink = move |_| {
        let mut f = current_form();
        f.unlink_publication();
        load_form(f);
    };

    let submit = move |_| {
        let req = NodeDialogRequest {
            mode,
            path: path.get_value(),
            form: current_form(),
        };
        if let Err(e) = on_submit.run(req) {
            error.set(Some(e));
        }
    };

    let results = move || filter_publications(&publications.get(), &query.get());
    let is_text = move || kind.get() == NodeKind::Text;

    let title = match mode {
        DialogMode::Add => "Add node",
        DialogMode::Edit => "Edit node",
    };

    view! {
        <div class="fixed inset-0 z-50 flex items-center justify-center bg-black/30 px-4">
            <div class="w-full max-w-lg rounded-md border border-border bg-background p-4 shadow-lg">
                <div class="mb-3 space-y-1">
                    <div class="text-sm font-medium">{title}</div>
                </div>

                <div class="space-y-3">
                    <div class="flex items-center gap-4 text-xs">
                        <label class="flex items-center gap-1">
                            <input
                                type="radio"
                                name="node-kind"
                                prop:checked=move || kind.get() == NodeKind::Section
                                on:change=move |_| kind.set(NodeKind::Section)
                            />
                            "Section"
                        </label>
                        <label class="flex items-center gap-1">
                            <input
                                type="radio"
                                name="node-kind"
                                prop:checked=move || kind.get() == NodeKind::Text
                                on:change=move |_| kind.set(NodeKind::Text)
                            />
                            "Text"
                        </label>
                    </div>

                    <div class="space-y-1">
                        <Label class="text-xs">"Text"</Label>
                        <Input bind_value=text class="h-8 text-sm border-border bg-background" />
                    </div>

                    <div class="grid grid-cols-2 gap-2">
                        <div class="space-y-1">
                            <Label class="text-xs">"Item id"</Label>
                            <Input
                                bind_value=item_id
                                placeholder="collection_publication"
                                class="h-8 text-sm border-border bg-background"
                            />
                        </div>
                        <div class="space-y-1">
                            <Label class="text-xs">"Language"</Label>
                            <Input bind_value=language class="h-8 text-sm border-border bg-background" />
                        </div>
                    </div>

                    <Show
                        when=is_text
                        fallback=move || view! { <CheckboxField label="Collapsed by default" checked=collapsed /> }
                    >
                        <div class="grid grid-cols-2 gap-2">
                            <div class="space-y-1">
                                <Label class="text-xs">"Date"</Label>
                                <Input bind_value=date placeholder="YYYY-MM-DD" class="h-8 text-sm border-border bg-background" />
                            </div>
                            <div class="space-y-1">
                                <Label class="text-xs">"Category"</Label>
                                <Input bind_value=category class="h-8 text-sm border-border bg-background" />
                            </div>
                        </div>
                        <div class="space-y-1">
                            <Label class="text-xs">"Description"</Label>
                            <Input bind_value=description class="h-8 text-sm border-border bg-background" />
                        </div>
                        <CheckboxField label="Facsimile only" checked=facsimile_only />

                        <div class="space-y-1 rounded-md border border-border p-2">
                            <div class="flex items-center justify-between">
                                <Label class="text-xs">"Link publication"</Label>
                                <Button
                                    variant=ButtonVariant::Ghost
                                    size=ButtonSize::Sm
                                    attr:disabled=move || item_id.get().trim().is_empty()
                                    on:click=unlink
                                >
                                    "Unlink"
                                </Button>
                            </div>
                            <Input
                                bind_value=query
                                placeholder="Search by id, name or date"
                                class="h-8 text-sm border-border bg-background"
                            />
                            <div class="max-h-48 overflow-y-auto">
                                <Show
                                    when=move || !publications_loading.get()
                                    fallback=|| view! { <div class="px-1 py-2 text-xs text-muted-foreground">"Loading publications..."</div> }
                                >
                                    {move || {
                                        let hits = results();
                                        if hits.is_empty() {
                                            return view! {
                                                <div class="px-1 py-2 text-xs text-muted-foreground">"No matching publications."</div>
                                            }
                                            .into_any();
                                        }
                                        hits.into_iter()
                                            .map(|p| {
                                                let label = format!(
                                                    "{} · {}{}",
                                                    p.id,
                                                    p.name,
                                                    p.original_publication_date
                                                        .as_deref()
                                                        .map(|d| format!(" · {d}"))
                                                        .unwrap_or_default()
                                                );
                                                view! {
                                                    <button
                                                        class="block w-full truncate rounded px-1 py-1 text-left text-xs hover:bg-accent"
                                                        on:click=move |_| link(p.clone())
                                                    >
                                                        {label}
                                                    </button>
                                                }
                                            })
                                            .collect_view()
                                            .into_any()
                                    }}
                                </Show>
                            </div>
                        </div>
                    </Show>

                    <Show when=move || error.get().is_some() fallback=|| ().into_view()>
                        {move || error.get().map(|e| view! {
                            <Alert class="border-destructive/30">
                                <AlertDescription class="text-destructive text-xs">{e}</AlertDescription>
                            </Alert>
                        })}
                    </Show>

                    <div class="flex items-center justify-end gap-2 pt-2">
                        <Button variant=ButtonVariant::Outline size=ButtonSize::Sm on:click=move |_| on_cancel.run(())>
                            "Cancel"
                        </Button>
                        <Button size=ButtonSize::Sm on:click=submit>
                            {match mode {
                                DialogMode::Add => "Add",
                                DialogMode::Edit => "Save",
                            }}
                        </Button>
                    </div>
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toc::model::{SectionNode, TextNode};

    fn sample() -> TocRoot {
        let mut part = SectionNode::new("Part 1");
        part.children.push(TocNode::Text(TextNode::new("Letter", "7_2")));
        let mut root = TocRoot::new("7", "Letters");
        root.children.push(TocNode::Section(part));
        root.children.push(TocNode::Text(TextNode::new("Epilogue", "7_9")));
        root
    }

    #[test]
    fn test_visible_rows_skip_closed_sections() {
        let root = sample();
        let rows = visible_rows(&root);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].path, vec![0]);
        assert_eq!(rows[0].child_count, 1);
        assert!(!rows[0].open);
        assert!(!rows[0].can_up);
        assert!(rows[0].can_down);
        assert_eq!(rows[1].item_id.as_deref(), Some("7_9"));
        assert!(!rows[1].can_down);
        assert!(!rows[0].can_indent);
        assert!(rows[1].can_indent, "the previous sibling is a section");
    }

    #[test]
    fn test_can_indent_needs_section_above() {
        let mut root = sample();
        root.children.push(TocNode::Text(TextNode::new("Postscript", "7_10")));
        let rows = visible_rows(&root);
        assert_eq!(rows.len(), 3);
        assert!(rows[2].can_up);
        assert!(!rows[2].can_indent, "a text node cannot take children");
    }

    #[test]
    fn test_visible_rows_open_section() {
        let mut root = sample();
        if let TocNode::Section(s) = &mut root.children[0] {
            s.collapsed = false;
        }
        let rows = visible_rows(&root);
        let paths: Vec<_> = rows.iter().map(|r| (r.path.clone(), r.depth)).collect();
        assert_eq!(paths, vec![(vec![0], 0), (vec![0, 0], 1), (vec![1], 0)]);
    }

    #[test]
    fn test_drop_placement() {
        assert_eq!(drop_placement(false, 100.0, 30.0, 105.0), DropPlacement::Before);
        assert_eq!(drop_placement(false, 100.0, 30.0, 125.0), DropPlacement::After);
        assert_eq!(drop_placement(true, 100.0, 30.0, 105.0), DropPlacement::Before);
        assert_eq!(drop_placement(true, 100.0, 30.0, 115.0), DropPlacement::Inside);
        assert_eq!(drop_placement(true, 100.0, 30.0, 128.0), DropPlacement::After);
        assert_eq!(drop_placement(true, 100.0, 0.0, 100.0), DropPlacement::After);
    }
}
