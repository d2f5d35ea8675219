// PageHost over Dioxus signals. The signals live in the root `App` so they
// outlive a reload of the portfolio subtree.
use dioxus::prelude::*;
use portfolio_site::config::Theme;
use portfolio_site::services::page::{DegradedView, FlashSet, PageHost, Surface};
use portfolio_site::state::ComponentKind;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

#[derive(Clone, Copy, PartialEq)]
pub struct PageSignals {
    pub theme: Signal<Theme>,
    pub chrome_color: Signal<String>,
    pub flashing: Signal<FlashSet>,
    pub body_classes: Signal<BTreeSet<String>>,
    pub degraded: Signal<BTreeMap<ComponentKind, DegradedView>>,
    /// Bumped on reload; keys the portfolio subtree.
    pub generation: Signal<u64>,
}

impl PageSignals {
    /// Must be called from a component body; each field is a hook.
    pub fn use_new() -> Self {
        Self {
            theme: use_signal(Theme::default),
            chrome_color: use_signal(String::new),
            flashing: use_signal(FlashSet::default),
            body_classes: use_signal(BTreeSet::new),
            degraded: use_signal(BTreeMap::new),
            generation: use_signal(|| 0),
        }
    }

    /// Extra classes for a themable surface, leading space included.
    pub fn surface_classes(&self, surface: Surface) -> String {
        self.flashing.read().classes(surface).map(|class| format!(" {}", class)).collect()
    }

    pub fn body_class_list(&self) -> String {
        self.body_classes.read().iter().cloned().collect::<Vec<_>>().join(" ")
    }

    pub fn degraded_view(&self, kind: ComponentKind) -> Option<DegradedView> {
        self.degraded.read().get(&kind).cloned()
    }
}

pub struct DesktopPage {
    location: String,
    signals: PageSignals,
}

impl DesktopPage {
    pub fn new(location: impl Into<String>, signals: PageSignals) -> Self {
        Self { location: location.into(), signals }
    }
}

impl PageHost for DesktopPage {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn set_theme_attribute(&self, theme: Theme) {
        let mut signal = self.signals.theme;
        signal.set(theme);
    }

    fn set_chrome_color(&self, color: &str) {
        let mut signal = self.signals.chrome_color;
        signal.set(color.to_string());
    }

    fn flash_class(&self, surface: Surface, class: &'static str, duration: Duration) {
        let mut flashing = self.signals.flashing;
        let ticket = flashing.write().begin(surface, class);
        spawn(async move {
            tokio::time::sleep(duration).await;
            flashing.write().end(surface, class, ticket);
        });
    }

    fn set_body_class(&self, class: &str, enabled: bool) {
        let mut classes = self.signals.body_classes;
        if enabled {
            classes.write().insert(class.to_string());
        } else {
            classes.write().remove(class);
        }
    }

    fn show_degraded(&self, kind: ComponentKind, view: DegradedView) {
        let mut degraded = self.signals.degraded;
        degraded.write().insert(kind, view);
    }

    fn clear_degraded(&self, kind: ComponentKind) {
        let mut degraded = self.signals.degraded;
        degraded.write().remove(&kind);
    }

    fn reload(&self) {
        tracing::warn!(location = %self.location, "Reloading page");
        let PageSignals { mut flashing, mut body_classes, mut degraded, mut generation, .. } = self.signals;
        flashing.write().clear();
        body_classes.write().clear();
        degraded.write().clear();
        generation += 1;
    }
}
