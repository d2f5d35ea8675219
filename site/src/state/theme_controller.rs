// Owner of the active theme. Exactly one theme is active for the page session;
// every change is applied to the page, persisted best-effort and broadcast
// synchronously on the bus before the call returns.
use crate::config::{SiteSettings, Theme, ThemeColors, ThemeData};
use crate::events::{SiteBus, ThemeChanged};
use crate::services::page::{PageHost, Surface, TRANSITION_CLASS};
use crate::services::performance::{Details, ErrorSink};
use crate::services::preferences::PreferenceStore;
use crate::state::registry::{ComponentKind, Widget};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThemeSnapshot {
    pub theme: Theme,
    pub data: ThemeData,
}

/// What the toggle button shows: the theme it would switch to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleButton {
    pub icon: String,
    pub title: String,
    pub aria_label: &'static str,
}

pub struct ThemeController {
    current: Cell<Theme>,
    store: Option<Rc<dyn PreferenceStore>>,
    key: String,
    page: Rc<dyn PageHost>,
    bus: Rc<SiteBus>,
    sink: Rc<dyn ErrorSink>,
    transition: Duration,
}

impl ThemeController {
    /// Resolves the starting theme (persisted preference, then the environment's
    /// color scheme, then the configured default) and applies it to the page.
    /// Pass `store: None` when the storage probe failed.
    #[allow(clippy::too_many_arguments)]
    pub fn init(
        settings: &SiteSettings,
        transition: Duration,
        store: Option<Rc<dyn PreferenceStore>>,
        prefers_dark: Option<bool>,
        page: Rc<dyn PageHost>,
        bus: Rc<SiteBus>,
        sink: Rc<dyn ErrorSink>,
    ) -> Rc<Self> {
        let controller = Rc::new(Self {
            current: Cell::new(settings.default_theme),
            store,
            key: settings.preference_key.clone(),
            page,
            bus,
            sink,
            transition,
        });

        let theme = controller
            .load_saved()
            .or_else(|| prefers_dark.map(|dark| if dark { Theme::Dark } else { Theme::Light }))
            .unwrap_or(settings.default_theme);
        controller.current.set(theme);
        controller.apply(theme);
        tracing::info!(theme = %theme, "Theme controller initialized");
        controller
    }

    fn load_saved(&self) -> Option<Theme> {
        let Some(store) = &self.store else {
            tracing::warn!("Preference storage not supported, using default theme");
            return None;
        };
        match store.get(&self.key) {
            Ok(Some(saved)) => match saved.parse::<Theme>() {
                Ok(theme) => Some(theme),
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring saved theme preference");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(error = %e, "Could not load theme preference");
                self.sink.handle_error("Theme Loading Error", &anyhow::Error::new(e), Details::new());
                None
            }
        }
    }

    fn has_saved_preference(&self) -> bool {
        self.store
            .as_ref()
            .map(|store| matches!(store.get(&self.key), Ok(Some(_))))
            .unwrap_or(false)
    }

    fn apply(&self, theme: Theme) {
        let data = theme.data();
        self.page.set_theme_attribute(theme);
        self.page.set_chrome_color(&data.colors.primary);
        self.page.flash_class(Surface::Body, TRANSITION_CLASS, self.transition);
    }

    fn persist(&self, theme: Theme) {
        let Some(store) = &self.store else { return };
        if let Err(e) = store.set(&self.key, theme.as_str()) {
            tracing::warn!(theme = %theme, error = %e, "Could not save theme preference");
            self.sink.handle_error("Theme Storage Error", &anyhow::Error::new(e), Details::new());
        }
    }

    fn transition_to(&self, theme: Theme) {
        self.current.set(theme);
        self.apply(theme);
        self.persist(theme);
        let listeners = self.bus.theme_changed.emit(&ThemeChanged::new(theme));
        tracing::debug!(theme = %theme, listeners, "Theme changed");
    }

    pub fn current_theme(&self) -> ThemeSnapshot {
        let theme = self.current.get();
        ThemeSnapshot { theme, data: theme.data() }
    }

    pub fn theme(&self) -> Theme {
        self.current.get()
    }

    /// Switches to the named theme. Unknown names and the active theme are
    /// ignored; returns whether a transition happened.
    pub fn set_theme(&self, name: &str) -> bool {
        match name.parse::<Theme>() {
            Ok(theme) => self.set(theme),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring set_theme");
                false
            }
        }
    }

    pub fn set(&self, theme: Theme) -> bool {
        if theme == self.current.get() {
            return false;
        }
        self.transition_to(theme);
        true
    }

    pub fn toggle_theme(&self) -> Theme {
        let next = self.current.get().opposite();
        self.transition_to(next);
        next
    }

    pub fn is_dark(&self) -> bool {
        self.current.get() == Theme::Dark
    }

    pub fn colors(&self) -> ThemeColors {
        self.current.get().data().colors
    }

    pub fn toggle_button(&self) -> ToggleButton {
        let next = self.current.get().opposite().data();
        ToggleButton { title: format!("Switch to {}", next.name), icon: next.icon, aria_label: "Toggle theme" }
    }

    /// The environment's color scheme changed. Followed only while the user has
    /// no saved preference; the new theme is broadcast but not persisted.
    pub fn system_scheme_changed(&self, dark: bool) -> bool {
        if self.has_saved_preference() {
            return false;
        }
        let theme = if dark { Theme::Dark } else { Theme::Light };
        if theme == self.current.get() {
            return false;
        }
        self.current.set(theme);
        self.apply(theme);
        self.bus.theme_changed.emit(&ThemeChanged::new(theme));
        tracing::info!(theme = %theme, "Following system color scheme");
        true
    }
}

impl Widget for ThemeController {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Theme
    }
}
