// Per-component failure counting and degradation.
//
// Every widget initializer and frame callback runs through the manager. A
// failure (an `Err` or a panic) is counted against the component's boundary;
// at the threshold the component's degraded view replaces it and the boundary
// stops running it until reset.
use crate::config::BoundaryPolicy;
use crate::services::page::PageHost;
use crate::services::performance::{Details, ErrorSink};
use crate::state::ComponentKind;
use serde::Serialize;
use serde_json::json;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundaryState {
    pub kind: ComponentKind,
    pub error_count: u32,
    pub destroyed: bool,
    pub degraded_shown: bool,
}

impl BoundaryState {
    fn new(kind: ComponentKind) -> Self {
        Self { kind, error_count: 0, destroyed: false, degraded_shown: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryOutcome {
    /// Error total was below the auto-reset threshold.
    Skipped,
    Reset,
    /// Boundaries were reset and a full reload was requested from the page.
    ReloadRequested,
}

pub struct ErrorBoundaryManager {
    policy: BoundaryPolicy,
    page: Rc<dyn PageHost>,
    sink: Rc<dyn ErrorSink>,
    boundaries: RefCell<BTreeMap<ComponentKind, BoundaryState>>,
    // Never reset; drives the reload escape hatch.
    lifetime_errors: Cell<u32>,
}

fn panic_to_error(payload: Box<dyn Any + Send>) -> anyhow::Error {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string());
    anyhow::anyhow!("panicked: {}", message)
}

/// Runs `f`, turning a panic into an error.
fn guarded<T>(f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
    catch_unwind(AssertUnwindSafe(f)).unwrap_or_else(|payload| Err(panic_to_error(payload)))
}

impl ErrorBoundaryManager {
    pub fn new(policy: BoundaryPolicy, page: Rc<dyn PageHost>, sink: Rc<dyn ErrorSink>) -> Rc<Self> {
        let boundaries = ComponentKind::ALL.into_iter().map(|kind| (kind, BoundaryState::new(kind))).collect();
        tracing::info!(count = ComponentKind::ALL.len(), "Error boundaries initialized");
        Rc::new(Self {
            policy,
            page,
            sink,
            boundaries: RefCell::new(boundaries),
            lifetime_errors: Cell::new(0),
        })
    }

    pub fn run<T>(&self, kind: ComponentKind, f: impl FnOnce() -> anyhow::Result<T>) -> Option<T> {
        self.execute(kind, f, None::<fn(&anyhow::Error) -> anyhow::Result<()>>)
    }

    pub fn run_with_fallback<T>(
        &self,
        kind: ComponentKind,
        f: impl FnOnce() -> anyhow::Result<T>,
        fallback: impl FnOnce(&anyhow::Error) -> anyhow::Result<()>,
    ) -> Option<T> {
        self.execute(kind, f, Some(fallback))
    }

    /// Returns `f` guarded by `kind`'s boundary. Each call yields `None` when the
    /// boundary is destroyed or `f` failed.
    pub fn wrap<T, F>(self: &Rc<Self>, kind: ComponentKind, mut f: F) -> impl FnMut() -> Option<T>
    where
        F: FnMut() -> anyhow::Result<T>,
    {
        let manager = Rc::clone(self);
        move || manager.run(kind, &mut f)
    }

    pub fn wrap_with_fallback<T, F, G>(
        self: &Rc<Self>,
        kind: ComponentKind,
        mut f: F,
        mut fallback: G,
    ) -> impl FnMut() -> Option<T>
    where
        F: FnMut() -> anyhow::Result<T>,
        G: FnMut(&anyhow::Error) -> anyhow::Result<()>,
    {
        let manager = Rc::clone(self);
        move || manager.run_with_fallback(kind, &mut f, &mut fallback)
    }

    fn execute<T, G>(&self, kind: ComponentKind, f: impl FnOnce() -> anyhow::Result<T>, fallback: Option<G>) -> Option<T>
    where
        G: FnOnce(&anyhow::Error) -> anyhow::Result<()>,
    {
        if self.is_destroyed(kind) {
            tracing::warn!(component = kind.display_name(), "Component is destroyed, skipping execution");
            return None;
        }

        match guarded(f) {
            Ok(value) => Some(value),
            Err(error) => {
                self.record_failure(kind, error, fallback);
                None
            }
        }
    }

    fn record_failure<G>(&self, kind: ComponentKind, error: anyhow::Error, fallback: Option<G>)
    where
        G: FnOnce(&anyhow::Error) -> anyhow::Result<()>,
    {
        self.lifetime_errors.set(self.lifetime_errors.get() + 1);
        let (error_count, reached_threshold) = {
            let mut boundaries = self.boundaries.borrow_mut();
            let state = boundaries.entry(kind).or_insert_with(|| BoundaryState::new(kind));
            state.error_count += 1;
            let reached = state.error_count >= self.policy.component_error_threshold && !state.destroyed;
            if reached {
                state.destroyed = true;
                state.degraded_shown = true;
            }
            (state.error_count, reached)
        };

        tracing::error!(component = kind.display_name(), error_count, error = %format!("{:#}", error), "Component error");

        if let Some(fallback) = fallback {
            if let Err(fallback_error) = guarded(|| fallback(&error)) {
                tracing::error!(
                    component = kind.display_name(),
                    error = %fallback_error,
                    "Fallback function failed"
                );
            }
        }

        if reached_threshold {
            self.page.show_degraded(kind, kind.degraded_view());
            self.page.set_body_class(&kind.error_marker(), true);
            tracing::warn!(component = kind.display_name(), "Component destroyed due to excessive errors");
        }

        let mut details = Details::new();
        details.insert("component".to_string(), json!(kind.key()));
        details.insert("errorCount".to_string(), json!(error_count));
        self.sink.handle_error(&format!("{} Error", kind.display_name()), &error, details);
    }

    /// Back to Active with a zero count; the degraded view and marker are removed.
    pub fn reset(&self, kind: ComponentKind) {
        self.boundaries.borrow_mut().insert(kind, BoundaryState::new(kind));
        self.page.clear_degraded(kind);
        self.page.set_body_class(&kind.error_marker(), false);
        tracing::info!(component = kind.display_name(), "Boundary reset");
    }

    pub fn reset_all(&self) -> RecoveryOutcome {
        for kind in ComponentKind::ALL {
            self.reset(kind);
        }

        let lifetime = self.lifetime_errors.get();
        if lifetime > self.policy.reload_threshold {
            tracing::warn!(lifetime_errors = lifetime, "Too many errors, reloading page");
            self.page.reload();
            RecoveryOutcome::ReloadRequested
        } else {
            RecoveryOutcome::Reset
        }
    }

    /// Runs once, `auto_recovery_delay` after startup.
    pub fn auto_recover(&self) -> RecoveryOutcome {
        let total = self.total_error_count();
        if total > self.policy.auto_reset_threshold {
            tracing::info!(total_errors = total, "Auto-recovery triggered");
            self.reset_all()
        } else {
            RecoveryOutcome::Skipped
        }
    }

    pub fn total_error_count(&self) -> u32 {
        self.boundaries.borrow().values().map(|b| b.error_count).sum()
    }

    pub fn lifetime_error_count(&self) -> u32 {
        self.lifetime_errors.get()
    }

    pub fn boundary(&self, kind: ComponentKind) -> BoundaryState {
        self.boundaries.borrow().get(&kind).copied().unwrap_or_else(|| BoundaryState::new(kind))
    }

    pub fn states(&self) -> Vec<BoundaryState> {
        self.boundaries.borrow().values().copied().collect()
    }

    pub fn is_destroyed(&self, kind: ComponentKind) -> bool {
        self.boundary(kind).destroyed
    }

    pub fn policy(&self) -> &BoundaryPolicy {
        &self.policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::page::HeadlessPage;

    #[derive(Default)]
    struct RecordingSink(RefCell<Vec<(String, String)>>);

    impl ErrorSink for RecordingSink {
        fn handle_error(&self, kind: &str, error: &anyhow::Error, _details: Details) {
            self.0.borrow_mut().push((kind.to_string(), error.to_string()));
        }
    }

    fn manager() -> (Rc<ErrorBoundaryManager>, Rc<HeadlessPage>, Rc<RecordingSink>) {
        let page = Rc::new(HeadlessPage::default());
        let sink = Rc::new(RecordingSink::default());
        let manager = ErrorBoundaryManager::new(BoundaryPolicy::default(), page.clone(), sink.clone());
        (manager, page, sink)
    }

    #[test]
    fn test_three_errors_destroy_and_fourth_call_is_noop() {
        let (manager, page, sink) = manager();
        let calls = Rc::new(Cell::new(0));
        let fallbacks = Rc::new(Cell::new(0));

        let c = calls.clone();
        let fb = fallbacks.clone();
        let mut init = manager.wrap_with_fallback(
            ComponentKind::Leaves,
            move || -> anyhow::Result<()> {
                c.set(c.get() + 1);
                anyhow::bail!("canvas context lost")
            },
            move |_| {
                fb.set(fb.get() + 1);
                Ok(())
            },
        );

        assert_eq!(init(), None);
        assert_eq!(init(), None);
        assert!(!manager.is_destroyed(ComponentKind::Leaves));
        assert_eq!(page.degraded_shown(ComponentKind::Leaves), 0);

        assert_eq!(init(), None);
        assert!(manager.is_destroyed(ComponentKind::Leaves));
        assert_eq!(page.degraded_shown(ComponentKind::Leaves), 1);
        assert!(page.has_body_class("fallingleaves-error"));

        assert_eq!(init(), None);
        assert_eq!(calls.get(), 3);
        assert_eq!(fallbacks.get(), 3);
        assert_eq!(manager.boundary(ComponentKind::Leaves).error_count, 3);
        assert_eq!(page.degraded_shown(ComponentKind::Leaves), 1);
        assert_eq!(sink.0.borrow().len(), 3);
        assert_eq!(sink.0.borrow()[0].0, "FallingLeaves Error");
    }

    #[test]
    fn test_reset_returns_boundary_to_active() {
        let (manager, page, _sink) = manager();
        for _ in 0..3 {
            manager.run(ComponentKind::Skills, || -> anyhow::Result<()> { anyhow::bail!("tooltip") });
        }
        assert!(manager.is_destroyed(ComponentKind::Skills));
        assert!(page.degraded(ComponentKind::Skills).is_some());

        manager.reset(ComponentKind::Skills);
        let state = manager.boundary(ComponentKind::Skills);
        assert!(!state.destroyed);
        assert_eq!(state.error_count, 0);
        assert!(page.degraded(ComponentKind::Skills).is_none());
        assert!(!page.has_body_class("skillsenhancement-error"));
        assert_eq!(manager.run(ComponentKind::Skills, || Ok(7)), Some(7));
    }

    #[test]
    fn test_panics_and_failing_fallbacks_are_contained() {
        let (manager, _page, sink) = manager();
        let result: Option<()> = manager.run_with_fallback(
            ComponentKind::Coffee,
            || panic!("press handler exploded"),
            |_| anyhow::bail!("fallback also broke"),
        );
        assert_eq!(result, None);
        assert_eq!(manager.boundary(ComponentKind::Coffee).error_count, 1);
        assert!(sink.0.borrow()[0].1.contains("press handler exploded"));

        let result: Option<()> = manager.run_with_fallback(
            ComponentKind::Coffee,
            || anyhow::bail!("again"),
            |_| panic!("fallback panicked"),
        );
        assert_eq!(result, None);
        assert_eq!(manager.boundary(ComponentKind::Coffee).error_count, 2);
    }

    #[test]
    fn test_boundaries_are_independent() {
        let (manager, _page, _sink) = manager();
        for _ in 0..3 {
            manager.run(ComponentKind::Contact, || -> anyhow::Result<()> { anyhow::bail!("x") });
        }
        assert!(manager.is_destroyed(ComponentKind::Contact));
        assert!(!manager.is_destroyed(ComponentKind::Theme));
        assert_eq!(manager.run(ComponentKind::Theme, || Ok("ok")), Some("ok"));
    }

    #[test]
    fn test_auto_recover_resets_above_threshold() {
        let (manager, page, _sink) = manager();
        for kind in [ComponentKind::Leaves, ComponentKind::Skills, ComponentKind::Contact, ComponentKind::Coffee] {
            for _ in 0..3 {
                manager.run(kind, || -> anyhow::Result<()> { anyhow::bail!("x") });
            }
        }
        // Destroyed boundaries stop counting, so the total is 12.
        assert_eq!(manager.total_error_count(), 12);

        assert_eq!(manager.auto_recover(), RecoveryOutcome::Reset);
        assert_eq!(manager.total_error_count(), 0);
        assert!(manager.states().iter().all(|s| !s.destroyed));
        assert_eq!(page.reloads(), 0);
        assert_eq!(manager.auto_recover(), RecoveryOutcome::Skipped);
    }

    #[test]
    fn test_reload_after_lifetime_errors_exceed_threshold() {
        let (manager, page, _sink) = manager();
        for _ in 0..7 {
            for kind in [ComponentKind::Leaves, ComponentKind::Skills, ComponentKind::Contact] {
                manager.run(kind, || -> anyhow::Result<()> { anyhow::bail!("x") });
            }
            manager.reset_all();
        }
        assert_eq!(manager.lifetime_error_count(), 21);
        assert_eq!(page.reloads(), 1);
    }
}
