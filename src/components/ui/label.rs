use leptos::prelude::*;
use tw_merge::*;

/// Field caption. Disabled styling follows the enclosing `data-disabled` group.
#[component]
pub fn Label(#[prop(optional, into)] class: String, children: Children) -> impl IntoView {
    let class = tw_merge!(
        "flex items-center gap-2 text-sm leading-none font-medium select-none group-data-[disabled=true]:pointer-events-none group-data-[disabled=true]:opacity-50",
        class
    );

    view! { <label class=class>{children()}</label> }
}
