#![allow(non_snake_case)]
use crate::components::{
    CoffeeLink, ContactSection, DebugOverlay, Gallery, LeavesCanvas, SkillsSection, ThemeToggle, UiTick,
};
use crate::shell::host_probe::{pump_page_events, read_memory};
use crate::shell::{DesktopPage, HostReport, PageSignals};
use dioxus::prelude::*;
use portfolio_site::services::page::{PageHost, Surface};
use portfolio_site::services::preferences::{FilePreferenceStore, PreferenceStore};
use portfolio_site::{Environment, Site, SiteConfig};
use std::rc::Rc;
use std::time::{Duration, Instant};

const STYLE: &str = include_str!("../assets/styles/site.css");
const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Handed to the root component by `main`.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub config: SiteConfig,
    pub location: String,
}

#[component]
pub fn App() -> Element {
    let page = PageSignals::use_new();
    use_context_provider(|| page);
    let host = use_resource(HostReport::probe);

    let generation = *page.generation.read();
    let theme = *page.theme.read();
    let chrome_color = page.chrome_color.read().clone();
    let page_class = format!("page {}{}", page.body_class_list(), page.surface_classes(Surface::Body));
    let report: Option<HostReport> = (*host.read()).clone();
    let content = match report {
        Some(report) => rsx! { Portfolio { key: "{generation}", host: report } },
        None => rsx! { div { class: "page-loading", "Brewing..." } },
    };

    rsx! {
        style { "{STYLE}" }
        meta { name: "theme-color", content: "{chrome_color}" }
        div { class: "{page_class}", "data-theme": "{theme}",
            {content}
        }
    }
}

/// Everything below the root, rebuilt from scratch on reload.
#[component]
fn Portfolio(host: HostReport) -> Element {
    let launch = use_context::<LaunchOptions>();
    let page = use_context::<PageSignals>();
    let tick = UiTick::use_new();
    use_context_provider(|| tick);

    let site = use_hook(|| {
        let store = FilePreferenceStore::default_location().map(|store| {
            tracing::debug!(path = %store.path().display(), "Using preference file");
            Rc::new(store) as Rc<dyn PreferenceStore>
        });
        let env = Environment {
            capabilities: host.capabilities(store.is_some()),
            prefers_dark: host.prefers_dark(),
            store,
            viewport: host.viewport(),
            seed: layout_seed(),
        };
        let page_host: Rc<dyn PageHost> = Rc::new(DesktopPage::new(launch.location.clone(), page));
        Rc::new(Site::bootstrap(launch.config.clone(), page_host, env))
    });
    use_context_provider(|| site.clone());

    use_future({
        let site = site.clone();
        move || {
            let site = site.clone();
            async move {
                loop {
                    tokio::time::sleep(FRAME_INTERVAL).await;
                    site.on_frame(Instant::now());
                    tick.next_frame();
                }
            }
        }
    });

    use_future({
        let site = site.clone();
        move || {
            let site = site.clone();
            async move {
                let interval = site.config.performance.memory_check_interval();
                loop {
                    tokio::time::sleep(interval).await;
                    if let Some(sample) = read_memory().await {
                        site.sample_memory(sample);
                    }
                }
            }
        }
    });

    use_future({
        let site = site.clone();
        move || {
            let site = site.clone();
            async move {
                tokio::time::sleep(site.config.boundaries.auto_recovery_delay()).await;
                let outcome = site.auto_recover();
                tracing::debug!(?outcome, "Auto-recovery pass finished");
                tick.touch();
            }
        }
    });

    use_future({
        let site = site.clone();
        move || pump_page_events(site.clone(), move || tick.touch())
    });

    use_future({
        let site = site.clone();
        move || {
            let site = site.clone();
            async move {
                if !site.config.debug {
                    return;
                }
                let interval = site.config.performance.report_interval();
                loop {
                    tokio::time::sleep(interval).await;
                    match serde_json::to_string(&site.debug_snapshot()) {
                        Ok(report) => tracing::info!(%report, "Performance report"),
                        Err(e) => tracing::warn!(error = %e, "Could not serialize performance report"),
                    }
                }
            }
        }
    });

    let title = site.config.site.title.clone();
    let header_class = format!("site-header glass-card{}", page.surface_classes(Surface::GlassCards));
    let terminal_class = format!("terminal{}", page.surface_classes(Surface::Terminals));

    rsx! {
        LeavesCanvas {}
        header { class: "{header_class}",
            h1 { "{title}" }
            ThemeToggle {}
        }
        main { class: "content",
            section { id: "about", class: "about",
                div { class: "{terminal_class}",
                    p { "$ whoami" }
                    p { "developer, coffee enthusiast" }
                }
            }
            SkillsSection {}
            Gallery {}
            ContactSection {}
        }
        footer { class: "site-footer",
            CoffeeLink {}
        }
        DebugOverlay {}
    }
}

// Varies the leaf layout between launches.
fn layout_seed() -> u32 {
    chrono::Utc::now().timestamp_subsec_nanos() | 1
}
