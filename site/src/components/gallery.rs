#![allow(non_snake_case)]
use super::UiTick;
use crate::shell::PageSignals;
use dioxus::prelude::*;
use portfolio_site::services::page::{DegradedView, Surface};
use portfolio_site::state::ComponentKind;
use portfolio_site::widgets::lazy_images::{ERROR_TEXT, PLACEHOLDER_TEXT};
use portfolio_site::widgets::{ImageState, LazyImage};
use portfolio_site::Site;
use std::rc::Rc;

#[component]
pub fn Gallery() -> Element {
    let site = use_context::<Rc<Site>>();
    let tick = use_context::<UiTick>();
    let page = use_context::<PageSignals>();
    tick.watch();

    let eager = matches!(page.degraded_view(ComponentKind::LazyImages), Some(DegradedView::EagerImages));
    let Some(loader) = site.images.clone() else {
        return None;
    };
    let images = loader.images();
    if images.is_empty() {
        return None;
    }
    let card_class = format!("project-card{}", page.surface_classes(Surface::ProjectCards));

    rsx! {
        section { id: "projects", class: "projects",
            h2 { "Projects" }
            div { class: "projects-grid",
                for image in images {
                    GalleryImage { key: "{image.id}", image, eager, card_class: card_class.clone() }
                }
            }
        }
    }
}

#[component]
fn GalleryImage(image: LazyImage, eager: bool, card_class: String) -> Element {
    let site = use_context::<Rc<Site>>();
    let tick = use_context::<UiTick>();

    let src = if eager { Some(image.data_src.clone()) } else { image.src().map(str::to_string) };
    let visible = {
        let site = site.clone();
        let id = image.id.clone();
        move |_: MountedEvent| {
            site.image_visible(&id);
            tick.touch();
        }
    };
    let settled = |ok: bool| {
        let site = site.clone();
        let id = image.id.clone();
        move |_: ImageEvent| {
            if let Some(images) = &site.images {
                if ok {
                    images.on_loaded(&id);
                } else {
                    images.on_error(&id);
                }
            }
            tick.touch();
        }
    };
    let img_class = if image.state == ImageState::Loaded { "lazy-image loaded" } else { "lazy-image" };

    let body = if image.state == ImageState::Failed {
        rsx! { div { class: "image-error", "{ERROR_TEXT}" } }
    } else if let Some(src) = src {
        rsx! {
            img {
                class: img_class,
                src: "{src}",
                alt: "{image.alt}",
                onload: settled(true),
                onerror: settled(false),
            }
        }
    } else {
        rsx! { div { class: "image-placeholder", "{PLACEHOLDER_TEXT}" } }
    };

    rsx! {
        div { class: "{card_class}", onmounted: visible, {body} }
    }
}
