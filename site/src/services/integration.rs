// Cross-widget wiring, run once after every widget initializer has had its turn.
use crate::config::{IntegrationPolicy, Theme};
use crate::events::{Resized, SiteBus, ThemeChanged, VisibilityChanged};
use crate::services::page::{PageHost, Surface, TRANSITION_CLASS};
use crate::services::performance::{Details, ErrorSink};
use crate::state::{ComponentKind, ComponentRegistry, Directive, ThemeController};
use serde::Serialize;
use serde_json::json;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

/// Error kind reported when bootstrap took longer than the configured limit.
pub const SLOW_INTEGRATION: &str = "Slow Component Integration";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegrationStatus {
    pub initialized: bool,
    pub components: Vec<ComponentKind>,
    pub theme_controller: bool,
    pub current_theme: Option<Theme>,
    pub missing: Vec<ComponentKind>,
}

pub struct ComponentIntegration {
    policy: IntegrationPolicy,
    registry: Rc<ComponentRegistry>,
    bus: Rc<SiteBus>,
    page: Rc<dyn PageHost>,
    sink: Rc<dyn ErrorSink>,
    theme: Option<Rc<ThemeController>>,
    initialized: Cell<bool>,
    missing: RefCell<Vec<ComponentKind>>,
}

impl ComponentIntegration {
    pub fn new(
        policy: IntegrationPolicy,
        registry: Rc<ComponentRegistry>,
        bus: Rc<SiteBus>,
        page: Rc<dyn PageHost>,
        sink: Rc<dyn ErrorSink>,
        theme: Option<Rc<ThemeController>>,
    ) -> Rc<Self> {
        Rc::new(Self {
            policy,
            registry,
            bus,
            page,
            sink,
            theme,
            initialized: Cell::new(false),
            missing: RefCell::new(Vec::new()),
        })
    }

    fn expected(&self) -> Vec<ComponentKind> {
        self.policy
            .expected_components
            .iter()
            .filter_map(|key| {
                let kind = ComponentKind::from_key(key);
                if kind.is_none() {
                    tracing::warn!(component = %key, "Unknown expected component");
                }
                kind
            })
            .collect()
    }

    /// Records which widgets registered and subscribes to the bus. `elapsed` is
    /// the time since bootstrap started. Calling it again does nothing.
    pub fn integrate(self: &Rc<Self>, elapsed: Duration) {
        if self.initialized.replace(true) {
            return;
        }

        let registered = self.registry.registered();
        tracing::info!(count = registered.len(), components = ?registered, "Registered components");

        let missing = self.registry.missing(&self.expected());
        if missing.is_empty() {
            tracing::info!("All components integrated successfully");
        } else {
            let names: Vec<&str> = missing.iter().map(|k| k.display_name()).collect();
            tracing::warn!(missing = ?names, "Integration issues found");
        }
        *self.missing.borrow_mut() = missing;

        self.subscribe();

        if elapsed > self.policy.slow_integration() {
            let millis = elapsed.as_millis() as u64;
            tracing::warn!(integration_ms = millis, "Slow integration detected");
            let mut details = Details::new();
            details.insert("integrationMs".to_string(), json!(millis));
            self.sink.handle_error(
                SLOW_INTEGRATION,
                &anyhow::anyhow!("Integration took {}ms", millis),
                details,
            );
        }
    }

    fn subscribe(self: &Rc<Self>) {
        let weak: Weak<Self> = Rc::downgrade(self);
        let this = weak.clone();
        self.bus.theme_changed.subscribe(move |event: &ThemeChanged| {
            if let Some(this) = this.upgrade() {
                this.on_theme_changed(event);
            }
        });

        let this = weak.clone();
        self.bus.visibility.subscribe(move |event: &VisibilityChanged| {
            if let Some(this) = this.upgrade() {
                this.on_visibility(event.visible);
            }
        });

        let this = weak;
        self.bus.resized.subscribe(move |event: &Resized| {
            if let Some(this) = this.upgrade() {
                this.on_resize(event.width, event.height);
            }
        });
    }

    fn on_theme_changed(&self, event: &ThemeChanged) {
        tracing::debug!(theme = %event.theme, "Applying theme to components");
        for surface in Surface::THEMABLE {
            self.page.flash_class(surface, TRANSITION_CLASS, self.policy.transition());
        }
    }

    fn on_visibility(&self, visible: bool) {
        let Some(leaves) = self.registry.get(ComponentKind::Leaves) else { return };
        let directive = if visible { Directive::Resume } else { Directive::Pause };
        leaves.apply(&directive);
    }

    fn on_resize(&self, width: f64, height: f64) {
        let directive = Directive::RecomputeLayout { width, height };
        for widget in self.registry.widgets() {
            widget.apply(&directive);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.get()
    }

    pub fn status(&self) -> IntegrationStatus {
        IntegrationStatus {
            initialized: self.initialized.get(),
            components: self.registry.registered(),
            theme_controller: self.theme.is_some(),
            current_theme: self.theme.as_ref().map(|t| t.theme()),
            missing: self.missing.borrow().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::page::HeadlessPage;
    use crate::services::performance::NoopSink;
    use crate::state::Widget;

    struct Recorder {
        kind: ComponentKind,
        seen: RefCell<Vec<Directive>>,
    }

    impl Widget for Recorder {
        fn kind(&self) -> ComponentKind {
            self.kind
        }

        fn apply(&self, directive: &Directive) {
            self.seen.borrow_mut().push(*directive);
        }
    }

    #[derive(Default)]
    struct RecordingSink(RefCell<Vec<String>>);

    impl ErrorSink for RecordingSink {
        fn handle_error(&self, kind: &str, _error: &anyhow::Error, _details: Details) {
            self.0.borrow_mut().push(kind.to_string());
        }
    }

    fn recorder(kind: ComponentKind) -> Rc<Recorder> {
        Rc::new(Recorder { kind, seen: RefCell::new(Vec::new()) })
    }

    fn setup(sink: Rc<dyn ErrorSink>) -> (Rc<ComponentIntegration>, Rc<ComponentRegistry>, Rc<SiteBus>, Rc<HeadlessPage>) {
        let registry = ComponentRegistry::new();
        let bus = SiteBus::new();
        let page = Rc::new(HeadlessPage::default());
        let integration =
            ComponentIntegration::new(IntegrationPolicy::default(), registry.clone(), bus.clone(), page.clone(), sink, None);
        (integration, registry, bus, page)
    }

    #[test]
    fn test_directives_reach_registered_widgets() {
        let (integration, registry, bus, _page) = setup(Rc::new(NoopSink));
        let leaves = recorder(ComponentKind::Leaves);
        let skills = recorder(ComponentKind::Skills);
        registry.register(leaves.clone());
        registry.register(skills.clone());
        integration.integrate(Duration::from_millis(5));

        bus.visibility.emit(&VisibilityChanged { visible: false });
        bus.visibility.emit(&VisibilityChanged { visible: true });
        bus.resized.emit(&Resized { width: 800.0, height: 600.0 });

        let resize = Directive::RecomputeLayout { width: 800.0, height: 600.0 };
        assert_eq!(*leaves.seen.borrow(), vec![Directive::Pause, Directive::Resume, resize]);
        assert_eq!(*skills.seen.borrow(), vec![resize]);
    }

    #[test]
    fn test_missing_components_are_recorded_not_fixed() {
        let (integration, registry, _bus, _page) = setup(Rc::new(NoopSink));
        registry.register(recorder(ComponentKind::Leaves));
        integration.integrate(Duration::ZERO);

        let status = integration.status();
        assert!(status.initialized);
        assert_eq!(status.components, vec![ComponentKind::Leaves]);
        assert_eq!(
            status.missing,
            vec![ComponentKind::Theme, ComponentKind::Skills, ComponentKind::Contact, ComponentKind::Coffee]
        );
        assert!(!status.theme_controller);
        assert_eq!(status.current_theme, None);
    }

    #[test]
    fn test_theme_change_flashes_every_surface() {
        let (integration, _registry, bus, page) = setup(Rc::new(NoopSink));
        integration.integrate(Duration::ZERO);
        bus.theme_changed.emit(&ThemeChanged::new(Theme::Dark));

        let flashed: Vec<Surface> = page.flashes().into_iter().map(|(s, _)| s).collect();
        assert_eq!(flashed, Surface::THEMABLE.to_vec());
    }

    #[test]
    fn test_integrate_is_idempotent_and_reports_slowness() {
        let sink = Rc::new(RecordingSink::default());
        let (integration, _registry, bus, _page) = setup(sink.clone());
        integration.integrate(Duration::from_millis(1500));
        integration.integrate(Duration::from_millis(1500));

        assert_eq!(bus.theme_changed.listener_count(), 1);
        assert_eq!(*sink.0.borrow(), vec!["Slow Component Integration"]);
    }
}
