#![allow(non_snake_case)]
use super::UiTick;
use crate::shell::PageSignals;
use dioxus::html::point_interaction::InteractionLocation;
use dioxus::prelude::*;
use portfolio_site::services::page::{DegradedView, Surface};
use portfolio_site::state::ComponentKind;
use portfolio_site::widgets::skills::{Horizontal, Vertical};
use portfolio_site::widgets::{Rect, SkillView, TooltipPlacement};
use portfolio_site::Site;
use std::rc::Rc;

// Pointer position stands in for the card bounds when placing the tooltip.
const POINTER_BOX: f64 = 24.0;
const TOOLTIP_HEIGHT: f64 = 120.0;

#[component]
pub fn SkillsSection() -> Element {
    let site = use_context::<Rc<Site>>();
    let tick = use_context::<UiTick>();
    let page = use_context::<PageSignals>();
    tick.watch();

    if let Some(DegradedView::BasicSkills(basic)) = page.degraded_view(ComponentKind::Skills) {
        return rsx! {
            section { id: "skills", class: "skills",
                h2 { "Skills" }
                div { class: "skills-grid",
                    for skill in basic {
                        div { key: "{skill.name}", class: "skill-item glass-card",
                            h3 { "{skill.name}" }
                            div { class: "skill-bar",
                                div { class: "skill-fill", style: "width: {skill.level}%" }
                            }
                            div { class: "skill-level", "{skill.level}%" }
                        }
                    }
                }
            }
        };
    }
    let Some(panel) = site.skills.clone() else {
        return None;
    };
    let tooltip_bg = panel.tooltip_background();
    let glass = page.surface_classes(Surface::GlassCards);
    let tooltip_flash = page.surface_classes(Surface::SkillTooltips);

    rsx! {
        section { id: "skills", class: "skills",
            h2 { "Skills" }
            div { class: "skills-grid",
                for (index, view) in panel.views().into_iter().enumerate() {
                    SkillCard {
                        key: "{view.name}",
                        index,
                        view,
                        tooltip_bg: tooltip_bg.clone(),
                        card_class: format!("skill-item glass-card{}", glass),
                        tooltip_flash: tooltip_flash.clone(),
                    }
                }
            }
        }
    }
}

#[component]
fn SkillCard(index: usize, view: SkillView, tooltip_bg: String, card_class: String, tooltip_flash: String) -> Element {
    let site = use_context::<Rc<Site>>();
    let tick = use_context::<UiTick>();
    let Some(panel) = site.skills.clone() else {
        return None;
    };

    let reveal = {
        let panel = panel.clone();
        move |_: MountedEvent| {
            panel.reveal(index);
            tick.touch();
        }
    };
    let enter = {
        let panel = panel.clone();
        let boundaries = site.boundaries.clone();
        move |evt: MouseEvent| {
            let point = evt.client_coordinates();
            let anchor = Rect {
                left: point.x - POINTER_BOX / 2.0,
                top: point.y - POINTER_BOX / 2.0,
                width: POINTER_BOX,
                height: POINTER_BOX,
            };
            boundaries.run(ComponentKind::Skills, || panel.show_tooltip(index, anchor, TOOLTIP_HEIGHT));
            tick.touch();
        }
    };
    let tooltip = view
        .tooltip
        .map(|placement| format!("skill-tooltip {}{}", placement_classes(placement), tooltip_flash));
    let leave = move |_: MouseEvent| {
        panel.hide_tooltip();
        tick.touch();
    };

    rsx! {
        div {
            class: "{card_class}",
            onmounted: reveal,
            onmouseenter: enter,
            onmouseleave: leave,
            h3 { "{view.name}" }
            div { class: "skill-category", "{view.category}" }
            div { class: "skill-bar",
                div { class: "skill-fill", style: "width: {view.progress}%" }
            }
            if let Some(tooltip_class) = tooltip {
                div {
                    class: "{tooltip_class}",
                    style: "background: {tooltip_bg};",
                    strong { "{view.name} · {view.level}%" }
                    p { "{view.description}" }
                }
            }
        }
    }
}

fn placement_classes(placement: TooltipPlacement) -> String {
    let vertical = match placement.vertical {
        Vertical::Top => "tooltip-top",
        Vertical::Bottom => "tooltip-bottom",
    };
    let horizontal = match placement.horizontal {
        Horizontal::Left => "tooltip-left",
        Horizontal::Center => "tooltip-center",
        Horizontal::Right => "tooltip-right",
    };
    format!("{} {}", vertical, horizontal)
}
