#![allow(non_snake_case)]
use super::UiTick;
use crate::shell::PageSignals;
use dioxus::prelude::*;
use portfolio_site::services::page::{DegradedView, Surface};
use portfolio_site::state::ComponentKind;
use portfolio_site::widgets::coffee::{ARIA_LABEL, TITLE};
use portfolio_site::widgets::CoffeeButton;
use portfolio_site::Site;
use std::rc::Rc;
use std::time::Instant;

#[component]
pub fn CoffeeLink() -> Element {
    let site = use_context::<Rc<Site>>();
    let tick = use_context::<UiTick>();
    let page = use_context::<PageSignals>();
    tick.watch();

    if let Some(DegradedView::PlainCoffeeLink { label }) = page.degraded_view(ComponentKind::Coffee) {
        let url = site.config.coffee.url.clone();
        return rsx! {
            a { class: "coffee-button coffee-fallback", href: "{url}", target: "_blank", rel: "noopener noreferrer", "{label}" }
        };
    }
    let Some(coffee) = site.coffee.clone() else {
        return None;
    };
    let url = coffee.url().to_string();
    let scale = coffee.scale(Instant::now());
    let focus = if coffee.is_focused() { " focused" } else { "" };
    let class = format!("coffee-button{}{}", focus, page.surface_classes(Surface::CoffeeButton));

    let press = |coffee: Rc<CoffeeButton>, site: Rc<Site>| {
        move |activate: &dyn Fn(&CoffeeButton, Instant) -> bool| {
            let pressed = site
                .boundaries
                .run(ComponentKind::Coffee, || Ok(activate(&coffee, Instant::now())))
                .unwrap_or(false);
            if pressed {
                tick.touch();
                let release = coffee.press_duration();
                spawn(async move {
                    tokio::time::sleep(release).await;
                    tick.touch();
                });
            }
        }
    };
    let on_click = {
        let press = press(coffee.clone(), site.clone());
        move |_: MouseEvent| press(&|c, now| c.click(now))
    };
    let on_key = {
        let press = press(coffee.clone(), site.clone());
        move |evt: KeyboardEvent| {
            let key = evt.key().to_string();
            press(&|c, now| c.key_down(&key, now));
        }
    };
    let hover = |hovered: bool| {
        let coffee = coffee.clone();
        move |_: MouseEvent| {
            coffee.set_hovered(hovered);
            tick.touch();
        }
    };
    let focus_change = |focused: bool| {
        let coffee = coffee.clone();
        move |_: FocusEvent| {
            coffee.set_focused(focused);
            tick.touch();
        }
    };

    rsx! {
        a {
            class: "{class}",
            href: "{url}",
            target: "_blank",
            rel: "noopener noreferrer",
            tabindex: "0",
            aria_label: ARIA_LABEL,
            title: TITLE,
            style: "transform: scale({scale});",
            onclick: on_click,
            onkeydown: on_key,
            onmouseenter: hover(true),
            onmouseleave: hover(false),
            onfocus: focus_change(true),
            onblur: focus_change(false),
            span { class: "coffee-icon", "☕" }
            span { class: "coffee-label", "Buy me a coffee" }
        }
    }
}
