#![allow(non_snake_case)]
use super::UiTick;
use crate::shell::PageSignals;
use dioxus::prelude::*;
use portfolio_site::services::page::DegradedView;
use portfolio_site::state::ComponentKind;
use portfolio_site::Site;
use std::rc::Rc;

#[component]
pub fn ThemeToggle() -> Element {
    let site = use_context::<Rc<Site>>();
    let tick = use_context::<UiTick>();
    let page = use_context::<PageSignals>();
    tick.watch();

    if let Some(DegradedView::ThemeToggle { notice }) = page.degraded_view(ComponentKind::Theme) {
        return rsx! {
            button { class: "theme-toggle theme-toggle-fallback", disabled: true, title: notice, "☕" }
        };
    }
    let Some(theme) = site.theme.clone() else {
        return None;
    };
    let button = theme.toggle_button();

    rsx! {
        button {
            class: "theme-toggle",
            title: "{button.title}",
            aria_label: button.aria_label,
            onclick: move |_| {
                site.toggle_theme();
                tick.touch();
            },
            span { class: "theme-icon", dangerous_inner_html: "{button.icon}" }
        }
    }
}
