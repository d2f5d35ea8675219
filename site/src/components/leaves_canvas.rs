#![allow(non_snake_case)]
// Falling leaves drawn as SVG, one group per sprite, redrawn every frame tick.
use super::UiTick;
use crate::shell::PageSignals;
use dioxus::prelude::*;
use portfolio_site::services::page::DegradedView;
use portfolio_site::state::ComponentKind;
use portfolio_site::widgets::LeafSprite;
use portfolio_site::Site;
use std::rc::Rc;

const STEM_LENGTH: f64 = 4.0;

#[component]
pub fn LeavesCanvas() -> Element {
    let site = use_context::<Rc<Site>>();
    let tick = use_context::<UiTick>();
    let page = use_context::<PageSignals>();
    tick.watch_frames();

    if let Some(DegradedView::StaticBackdrop { gradient }) = page.degraded_view(ComponentKind::Leaves) {
        return rsx! {
            div { class: "leaves-backdrop", style: "background: {gradient};" }
        };
    }
    let Some(leaves) = site.leaves.clone() else {
        return None;
    };
    if leaves.is_halted() {
        return None;
    }
    let (width, height) = leaves.viewport();
    let shapes: Vec<LeafShape> = leaves.sprites().into_iter().map(LeafShape::from).collect();

    rsx! {
        svg {
            id: "falling-leaves-canvas",
            class: "leaves-canvas",
            view_box: "0 0 {width} {height}",
            "preserveAspectRatio": "none",
            for (i, shape) in shapes.into_iter().enumerate() {
                g {
                    key: "{i}",
                    transform: "{shape.transform}",
                    opacity: "{shape.opacity}",
                    ellipse { cx: "0", cy: "0", rx: "{shape.rx}", ry: "{shape.ry}", fill: shape.color }
                    line {
                        x1: "0",
                        y1: "{shape.ry}",
                        x2: "0",
                        y2: "{shape.stem_end}",
                        stroke: shape.stem_color,
                        stroke_width: "1",
                    }
                }
            }
        }
    }
}

struct LeafShape {
    transform: String,
    opacity: f64,
    rx: f64,
    ry: f64,
    stem_end: f64,
    color: &'static str,
    stem_color: &'static str,
}

impl From<LeafSprite> for LeafShape {
    fn from(leaf: LeafSprite) -> Self {
        let ry = leaf.height / 2.0;
        Self {
            transform: format!("translate({} {}) rotate({})", leaf.x, leaf.y, leaf.rotation_deg),
            opacity: leaf.opacity,
            rx: leaf.width / 2.0,
            ry,
            stem_end: ry + STEM_LENGTH,
            color: leaf.color,
            stem_color: leaf.stem_color,
        }
    }
}
