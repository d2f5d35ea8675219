//! Composition root for the page runtime.
//!
//! [`Site::bootstrap`] builds every service once, in dependency order: the
//! performance monitor (the error sink), then the error boundaries, then the
//! theme (applied before any widget exists), then the widgets, each created
//! inside its own boundary and registered explicitly, and finally the
//! integration pass. The shell drives the result with frames, timers and page
//! events.

use crate::config::{SiteConfig, Theme};
use crate::events::{Resized, SiteBus, VisibilityChanged};
use crate::services::error_boundary::{BoundaryState, ErrorBoundaryManager, RecoveryOutcome};
use crate::services::integration::{ComponentIntegration, IntegrationStatus, SLOW_INTEGRATION};
use crate::services::page::PageHost;
use crate::services::performance::{
    Capabilities, ErrorSink, Feature, LoadReducer, MemorySample, PerformanceMonitor, PerformanceReport,
};
use crate::services::preferences::{probe_storage, PreferenceStore};
use crate::state::{ComponentKind, ComponentRegistry, ThemeController};
use crate::widgets::{CoffeeButton, ContactForm, FormPhase, LazyImageLoader, LeavesAnimation, SkillsPanel};
use serde::Serialize;
use shared::models::ContactRequest;
use std::rc::Rc;
use std::time::Instant;

/// What the host environment reports about itself at startup.
pub struct Environment {
    pub capabilities: Capabilities,
    /// `prefers-color-scheme: dark`, when the host can tell.
    pub prefers_dark: Option<bool>,
    pub store: Option<Rc<dyn PreferenceStore>>,
    pub viewport: (f64, f64),
    /// Seed for the leaves layout.
    pub seed: u32,
}

/// A started contact submission. `payload` is `None` when validation failed.
#[derive(Debug, Clone, PartialEq)]
pub struct ContactAttempt {
    pub attempt: u64,
    pub payload: Option<ContactRequest>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSnapshot {
    pub performance: PerformanceReport,
    pub boundaries: Vec<BoundaryState>,
    pub total_boundary_errors: u32,
    pub integration: IntegrationStatus,
}

pub struct Site {
    pub config: SiteConfig,
    pub bus: Rc<SiteBus>,
    pub registry: Rc<ComponentRegistry>,
    pub monitor: Rc<PerformanceMonitor>,
    pub boundaries: Rc<ErrorBoundaryManager>,
    pub integration: Rc<ComponentIntegration>,
    pub theme: Option<Rc<ThemeController>>,
    pub leaves: Option<Rc<LeavesAnimation>>,
    pub skills: Option<Rc<SkillsPanel>>,
    pub contact: Option<Rc<ContactForm>>,
    pub coffee: Option<Rc<CoffeeButton>>,
    pub images: Option<Rc<LazyImageLoader>>,
}

impl Site {
    pub fn bootstrap(config: SiteConfig, page: Rc<dyn PageHost>, env: Environment) -> Self {
        let started = Instant::now();
        let bus = SiteBus::new();
        let registry = ComponentRegistry::new();

        let monitor = PerformanceMonitor::new(config.performance.clone(), page.clone(), env.capabilities);
        monitor.start(env.viewport);
        let sink: Rc<dyn ErrorSink> = monitor.clone();
        let boundaries = ErrorBoundaryManager::new(config.boundaries.clone(), page.clone(), sink.clone());

        let store = env.store.filter(|store| {
            let usable = monitor.is_feature_supported(Feature::DurableStorage) && probe_storage(store.as_ref());
            if !usable {
                tracing::warn!("Preference storage unusable; theme will not be remembered");
            }
            usable
        });

        let theme = boundaries.run(ComponentKind::Theme, || {
            Ok(ThemeController::init(
                &config.site,
                config.integration.transition(),
                store,
                env.prefers_dark,
                page.clone(),
                bus.clone(),
                sink.clone(),
            ))
        });
        if let Some(theme) = &theme {
            registry.register(theme.clone());
        }
        let initial_theme = theme.as_ref().map(|t| t.theme()).unwrap_or(config.site.default_theme);

        let leaves = if monitor.is_feature_supported(Feature::Canvas)
            && monitor.is_feature_supported(Feature::AnimationFrames)
        {
            boundaries.run_with_fallback(
                ComponentKind::Leaves,
                || {
                    let leaves = LeavesAnimation::new(config.leaves.clone(), initial_theme, env.viewport, env.seed)?;
                    leaves.attach(&bus);
                    leaves.start();
                    Ok(leaves)
                },
                |_| {
                    tracing::warn!("Falling leaves failed to initialize");
                    Ok(())
                },
            )
        } else {
            tracing::warn!("Canvas not supported, skipping animation");
            None
        };
        if let Some(leaves) = &leaves {
            registry.register(leaves.clone());
            let reducer: Rc<dyn LoadReducer> = leaves.clone();
            monitor.add_reducer(&reducer);
        }

        let observer = monitor.is_feature_supported(Feature::IntersectionObserver);

        let skills = boundaries.run(ComponentKind::Skills, || {
            let skills = SkillsPanel::new(config.skills.clone(), initial_theme, env.viewport.0)?;
            skills.attach(&bus);
            if !observer {
                skills.reveal_all();
            }
            Ok(skills)
        });
        if let Some(skills) = &skills {
            registry.register(skills.clone());
        }

        let contact = boundaries.run(ComponentKind::Contact, || ContactForm::new(config.contact.clone(), sink.clone()));
        if let Some(contact) = &contact {
            registry.register(contact.clone());
        }

        let coffee = boundaries.run(ComponentKind::Coffee, || CoffeeButton::new(config.coffee.clone()));
        if let Some(coffee) = &coffee {
            registry.register(coffee.clone());
        }

        let images = boundaries.run(ComponentKind::LazyImages, || {
            let images = LazyImageLoader::new(&config.images);
            if !observer {
                images.load_all();
            }
            Ok(images)
        });
        if let Some(images) = &images {
            registry.register(images.clone());
        }

        // A slow start means a slow host: drop to the lighter presentation.
        let weak_monitor = Rc::downgrade(&monitor);
        monitor.register_error_handler(SLOW_INTEGRATION, move |_| {
            if let Some(monitor) = weak_monitor.upgrade() {
                monitor.enable_fallbacks();
            }
            Ok(())
        });

        let integration = ComponentIntegration::new(
            config.integration.clone(),
            registry.clone(),
            bus.clone(),
            page,
            sink,
            theme.clone(),
        );
        integration.integrate(started.elapsed());

        tracing::info!(
            components = registry.registered().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Site bootstrapped"
        );

        Self {
            config,
            bus,
            registry,
            monitor,
            boundaries,
            integration,
            theme,
            leaves,
            skills,
            contact,
            coffee,
            images,
        }
    }

    pub fn current_theme(&self) -> Theme {
        self.theme.as_ref().map(|t| t.theme()).unwrap_or(self.config.site.default_theme)
    }

    pub fn toggle_theme(&self) -> Option<Theme> {
        let theme = self.theme.clone()?;
        self.boundaries.run(ComponentKind::Theme, move || Ok(theme.toggle_theme()))
    }

    pub fn system_scheme_changed(&self, dark: bool) {
        if let Some(theme) = &self.theme {
            theme.system_scheme_changed(dark);
        }
    }

    pub fn set_visible(&self, visible: bool) {
        self.bus.visibility.emit(&VisibilityChanged { visible });
    }

    pub fn resized(&self, width: f64, height: f64) {
        self.bus.resized.emit(&Resized { width, height });
    }

    /// One animation frame: sample the frame time, then advance the leaves
    /// inside their boundary.
    pub fn on_frame(&self, at: Instant) {
        self.monitor.record_frame(at);
        let Some(leaves) = self.leaves.clone() else { return };
        self.boundaries.run(ComponentKind::Leaves, move || {
            let frame_start = Instant::now();
            leaves.step();
            leaves.note_frame_cost(frame_start.elapsed());
            Ok(())
        });
    }

    pub fn sample_memory(&self, sample: MemorySample) {
        self.monitor.sample_memory(sample);
    }

    pub fn image_visible(&self, id: &str) {
        if let Some(images) = &self.images {
            if !self.boundaries.is_destroyed(ComponentKind::LazyImages) {
                images.on_visible(id);
            }
        }
    }

    /// Validates the contact form and moves it to Submitting. `None` when the
    /// form is missing or destroyed.
    pub fn begin_contact(&self) -> Option<ContactAttempt> {
        let contact = self.contact.as_ref()?;
        if self.boundaries.is_destroyed(ComponentKind::Contact) {
            return None;
        }
        let payload = contact.begin_submit();
        Some(ContactAttempt { attempt: contact.attempt(), payload })
    }

    pub async fn send_contact(&self, payload: &ContactRequest) -> Option<FormPhase> {
        let contact = self.contact.clone()?;
        Some(contact.send(payload).await)
    }

    /// The debug overlay's "Reset All Components" control.
    pub fn reset_all_components(&self) -> RecoveryOutcome {
        let outcome = self.boundaries.reset_all();
        if outcome == RecoveryOutcome::Reset {
            self.monitor.reset_emergency();
            if let Some(leaves) = &self.leaves {
                leaves.restart();
            }
        }
        outcome
    }

    pub fn auto_recover(&self) -> RecoveryOutcome {
        self.boundaries.auto_recover()
    }

    pub fn debug_snapshot(&self) -> DebugSnapshot {
        DebugSnapshot {
            performance: self.monitor.report(),
            boundaries: self.boundaries.states(),
            total_boundary_errors: self.boundaries.total_error_count(),
            integration: self.integration.status(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::page::HeadlessPage;
    use crate::services::performance::FALLBACK_MODE_CLASS;
    use crate::services::preferences::{MemoryPreferenceStore, THEME_KEY};
    use crate::widgets::Field;
    use std::time::Duration;

    fn env(capabilities: Capabilities) -> Environment {
        Environment {
            capabilities,
            prefers_dark: None,
            store: Some(Rc::new(MemoryPreferenceStore::new())),
            viewport: (1280.0, 720.0),
            seed: 99,
        }
    }

    fn boot(capabilities: Capabilities) -> (Site, Rc<HeadlessPage>) {
        let page = Rc::new(HeadlessPage::default());
        let site = Site::bootstrap(SiteConfig::load_default().unwrap(), page.clone(), env(capabilities));
        (site, page)
    }

    #[test]
    fn test_bootstrap_registers_every_widget() {
        let (site, page) = boot(Capabilities::all_supported());
        let status = site.integration.status();
        assert!(status.initialized);
        assert!(status.missing.is_empty());
        assert_eq!(status.components, ComponentKind::ALL.to_vec());
        assert_eq!(status.current_theme, Some(Theme::Light));
        assert_eq!(page.theme_attribute(), Some(Theme::Light));
        assert!(site.leaves.as_ref().unwrap().is_running());
    }

    #[test]
    fn test_theme_toggle_reaches_widgets() {
        let (site, _page) = boot(Capabilities::all_supported());
        assert_eq!(site.toggle_theme(), Some(Theme::Dark));
        assert_eq!(site.leaves.as_ref().unwrap().theme(), Theme::Dark);
        assert_eq!(site.skills.as_ref().unwrap().theme(), Theme::Dark);
    }

    #[test]
    fn test_missing_canvas_skips_leaves_and_loads_images_eagerly() {
        let caps = Capabilities::all_supported()
            .with(Feature::Canvas, false)
            .with(Feature::IntersectionObserver, false);
        let (site, page) = boot(caps);

        assert!(site.leaves.is_none());
        assert_eq!(site.integration.status().missing, vec![ComponentKind::Leaves]);
        assert!(page.has_body_class("no-canvas"));
        assert!(site.monitor.is_fallback_active());
        assert!(site.images.as_ref().unwrap().images().iter().all(|i| i.src().is_some()));
        assert!(site.skills.as_ref().unwrap().views().iter().all(|v| v.progress == v.level));
    }

    #[test]
    fn test_unusable_storage_is_skipped() {
        let caps = Capabilities::all_supported().with(Feature::DurableStorage, false);
        let store = Rc::new(MemoryPreferenceStore::new());
        let page = Rc::new(HeadlessPage::default());
        let site = Site::bootstrap(
            SiteConfig::load_default().unwrap(),
            page,
            Environment { store: Some(store.clone()), ..env(caps) },
        );
        site.toggle_theme();
        assert_eq!(store.get(THEME_KEY).unwrap(), None);
    }

    #[test]
    fn test_frames_and_visibility_drive_leaves() {
        let (site, _page) = boot(Capabilities::all_supported());
        let leaves = site.leaves.clone().unwrap();
        let before = leaves.sprites();

        let t0 = Instant::now();
        site.on_frame(t0);
        site.on_frame(t0 + Duration::from_millis(16));
        assert_ne!(leaves.sprites(), before);

        site.set_visible(false);
        assert!(!leaves.is_running());
        let frozen = leaves.sprites();
        site.on_frame(t0 + Duration::from_millis(32));
        assert_eq!(leaves.sprites(), frozen);

        site.set_visible(true);
        assert!(leaves.is_running());

        site.resized(640.0, 480.0);
        assert_eq!(leaves.viewport(), (640.0, 480.0));
    }

    #[test]
    fn test_debug_snapshot_serializes() {
        let (site, _page) = boot(Capabilities::all_supported());
        let json = serde_json::to_value(site.debug_snapshot()).unwrap();
        assert_eq!(json["performance"]["errorCount"], 0);
        assert_eq!(json["totalBoundaryErrors"], 0);
        assert_eq!(json["boundaries"][0]["errorCount"], 0);
        assert_eq!(json["integration"]["currentTheme"], "light");
        assert_eq!(json["integration"]["initialized"], true);
    }

    #[test]
    fn test_reset_all_restarts_halted_leaves() {
        let (site, _page) = boot(Capabilities::all_supported());
        for i in 0..5 {
            site.monitor.handle_error("Test Error", &anyhow::anyhow!("e{}", i), Default::default());
        }
        let leaves = site.leaves.clone().unwrap();
        assert!(site.monitor.is_emergency());
        assert!(!leaves.is_running());

        assert_eq!(site.reset_all_components(), RecoveryOutcome::Reset);
        assert!(!site.monitor.is_emergency());
        assert!(leaves.is_running());
    }

    #[test]
    fn test_slow_integration_enables_fallbacks() {
        let (site, page) = boot(Capabilities::all_supported());
        site.monitor.handle_error(SLOW_INTEGRATION, &anyhow::anyhow!("Integration took 1500ms"), Default::default());
        assert!(site.monitor.is_fallback_active());
        assert!(page.has_body_class(FALLBACK_MODE_CLASS));
        assert!(!site.monitor.is_emergency());
    }

    #[test]
    fn test_begin_contact_counts_attempts_and_stops_when_destroyed() {
        let (site, _page) = boot(Capabilities::all_supported());
        let first = site.begin_contact().unwrap();
        assert_eq!(first.payload, None);
        assert!(matches!(site.contact.as_ref().unwrap().phase(), FormPhase::Failed(_)));
        let second = site.begin_contact().unwrap();
        assert_eq!(second.attempt, first.attempt + 1);

        for _ in 0..3 {
            site.boundaries.run(ComponentKind::Contact, || -> anyhow::Result<()> { anyhow::bail!("form broke") });
        }
        assert!(site.boundaries.is_destroyed(ComponentKind::Contact));
        assert_eq!(site.begin_contact(), None);
    }

    #[tokio::test]
    async fn test_contact_submission_through_site() {
        use axum::routing::post;
        use axum::{Json, Router};

        let app = Router::new().route("/api/contact", post(|| async { Json(serde_json::json!({ "success": true })) }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let mut config = SiteConfig::load_default().unwrap();
        config.contact.endpoint = format!("http://{}/api/contact", addr);
        let site = Site::bootstrap(config, Rc::new(HeadlessPage::default()), env(Capabilities::all_supported()));
        let contact = site.contact.clone().unwrap();
        contact.update_field(Field::Name, "A");
        contact.update_field(Field::Email, "a@b.com");
        contact.update_field(Field::Message, "Hello");

        let started = site.begin_contact().unwrap();
        let payload = started.payload.clone().unwrap();
        assert_eq!(site.send_contact(&payload).await, Some(FormPhase::Succeeded));
        assert!(contact.dismiss_notice(started.attempt));
        assert_eq!(contact.phase(), FormPhase::Idle);
    }
}
