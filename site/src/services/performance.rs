//! Page-lifetime health tracking.
//!
//! [`PerformanceMonitor`] owns the capability table, the rolling frame window,
//! the memory history and the global error counter. It is the [`ErrorSink`]
//! every other service reports into, and it degrades decorative load through
//! registered [`LoadReducer`]s without knowing which widgets sit behind them.

use crate::config::PerformancePolicy;
use crate::services::page::PageHost;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

pub const FALLBACK_MODE_CLASS: &str = "fallback-mode";
pub const LOW_PERFORMANCE_CLASS: &str = "low-performance";
pub const EMERGENCY_CLASS: &str = "emergency-fallback";

const RECENT_ERRORS: usize = 10;

pub type Details = Map<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Feature {
    AnimationFrames,
    Canvas,
    DurableStorage,
    IntersectionObserver,
    CustomProperties,
    Webgl,
    Transforms3d,
}

impl Feature {
    pub const ALL: [Feature; 7] = [
        Feature::AnimationFrames,
        Feature::Canvas,
        Feature::DurableStorage,
        Feature::IntersectionObserver,
        Feature::CustomProperties,
        Feature::Webgl,
        Feature::Transforms3d,
    ];

    /// Name used by host probes.
    pub fn key(self) -> &'static str {
        match self {
            Feature::AnimationFrames => "animationFrames",
            Feature::Canvas => "canvas",
            Feature::DurableStorage => "durableStorage",
            Feature::IntersectionObserver => "intersectionObserver",
            Feature::CustomProperties => "customProperties",
            Feature::Webgl => "webgl",
            Feature::Transforms3d => "transforms3d",
        }
    }

    // Body class applied when the feature is missing; only the features with a
    // dedicated fallback path have one.
    fn missing_class(self) -> Option<&'static str> {
        match self {
            Feature::AnimationFrames => Some("no-animation-frames"),
            Feature::Canvas => Some("no-canvas"),
            Feature::IntersectionObserver => Some("no-intersection-observer"),
            Feature::CustomProperties => Some("no-custom-properties"),
            _ => None,
        }
    }
}

/// Attempts to use a feature. `Ok(false)`, an error and a panic all mean "unsupported".
pub trait FeatureProbe {
    fn probe(&self, feature: Feature) -> anyhow::Result<bool>;
}

impl<F> FeatureProbe for F
where
    F: Fn(Feature) -> anyhow::Result<bool>,
{
    fn probe(&self, feature: Feature) -> anyhow::Result<bool> {
        self(feature)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    supported: BTreeMap<Feature, bool>,
}

impl Capabilities {
    pub fn detect(probe: &dyn FeatureProbe) -> Self {
        let supported = Feature::ALL
            .into_iter()
            .map(|feature| {
                let ok = match catch_unwind(AssertUnwindSafe(|| probe.probe(feature))) {
                    Ok(Ok(ok)) => ok,
                    Ok(Err(e)) => {
                        tracing::debug!(?feature, error = %e, "Feature probe failed");
                        false
                    }
                    Err(_) => {
                        tracing::debug!(?feature, "Feature probe panicked");
                        false
                    }
                };
                (feature, ok)
            })
            .collect();
        Self { supported }
    }

    pub fn all_supported() -> Self {
        Self { supported: Feature::ALL.into_iter().map(|f| (f, true)).collect() }
    }

    pub fn with(mut self, feature: Feature, supported: bool) -> Self {
        self.supported.insert(feature, supported);
        self
    }

    pub fn is_supported(&self, feature: Feature) -> bool {
        self.supported.get(&feature).copied().unwrap_or(false)
    }

    pub fn unsupported(&self) -> Vec<Feature> {
        self.supported.iter().filter(|(_, ok)| !**ok).map(|(f, _)| *f).collect()
    }
}

/// Receives error reports. Services hold an `Rc<dyn ErrorSink>`; [`NoopSink`]
/// stands in when no monitor is wired.
pub trait ErrorSink {
    fn handle_error(&self, kind: &str, error: &anyhow::Error, details: Details);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ErrorSink for NoopSink {
    fn handle_error(&self, _kind: &str, _error: &anyhow::Error, _details: Details) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reduction {
    /// Frame rate fell below the threshold.
    LowPerformance,
    /// Heap usage crossed the ratio threshold.
    Memory,
    /// Too many errors: stop all decorative animation.
    Emergency,
}

/// Something whose decorative load can be turned down.
pub trait LoadReducer {
    fn reduce(&self, reduction: Reduction);
}

#[derive(Debug, Clone)]
pub struct FrameWindow {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl FrameWindow {
    pub fn new(capacity: usize) -> Self {
        Self { samples: VecDeque::with_capacity(capacity), capacity: capacity.max(1) }
    }

    pub fn push(&mut self, frame: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(frame);
    }

    /// Keeps only the newest `keep` samples.
    pub fn trim_to(&mut self, keep: usize) {
        while self.samples.len() > keep {
            self.samples.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn samples(&self) -> impl Iterator<Item = &Duration> {
        self.samples.iter()
    }

    /// Moving-average frame rate, `None` until a non-zero sample exists.
    pub fn average_fps(&self) -> Option<f64> {
        if self.samples.is_empty() {
            return None;
        }
        let total: f64 = self.samples.iter().map(|d| d.as_secs_f64()).sum();
        let avg = total / self.samples.len() as f64;
        (avg > 0.0).then(|| 1.0 / avg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MemorySample {
    pub used: u64,
    pub total: u64,
    pub limit: u64,
    pub at: DateTime<Utc>,
}

impl MemorySample {
    pub fn ratio(&self) -> Option<f64> {
        (self.limit > 0).then(|| self.used as f64 / self.limit as f64)
    }
}

/// One reported error, as logged and as shown in the debug overlay.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub chain: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub details: Details,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceReport {
    pub average_fps: f64,
    pub error_count: u32,
    pub is_low_performance: bool,
    pub emergency: bool,
    pub fallbacks_enabled: bool,
    pub uptime_ms: u64,
    pub memory_usage: Option<MemorySample>,
    pub browser_support: Capabilities,
    pub recent_errors: Vec<ErrorRecord>,
}

type ErrorHandler = Rc<dyn Fn(&ErrorRecord) -> anyhow::Result<()>>;

pub struct PerformanceMonitor {
    policy: PerformancePolicy,
    page: Rc<dyn PageHost>,
    capabilities: Capabilities,
    started: Instant,
    error_count: Cell<u32>,
    recent_errors: RefCell<VecDeque<ErrorRecord>>,
    frames: RefCell<FrameWindow>,
    last_frame: Cell<Option<Instant>>,
    memory: RefCell<VecDeque<MemorySample>>,
    low_performance: Cell<bool>,
    emergency: Cell<bool>,
    fallbacks_enabled: Cell<bool>,
    reducers: RefCell<Vec<Weak<dyn LoadReducer>>>,
    handlers: RefCell<HashMap<String, Vec<ErrorHandler>>>,
}

impl PerformanceMonitor {
    pub fn new(policy: PerformancePolicy, page: Rc<dyn PageHost>, capabilities: Capabilities) -> Rc<Self> {
        let frames = FrameWindow::new(policy.frame_window);
        Rc::new(Self {
            policy,
            page,
            capabilities,
            started: Instant::now(),
            error_count: Cell::new(0),
            recent_errors: RefCell::new(VecDeque::new()),
            frames: RefCell::new(frames),
            last_frame: Cell::new(None),
            memory: RefCell::new(VecDeque::new()),
            low_performance: Cell::new(false),
            emergency: Cell::new(false),
            fallbacks_enabled: Cell::new(false),
            reducers: RefCell::new(Vec::new()),
            handlers: RefCell::new(HashMap::new()),
        })
    }

    /// Logs the system info and switches on the permanent fallback paths for
    /// every missing feature.
    pub fn start(&self, viewport: (f64, f64)) {
        tracing::info!(
            viewport = %format!("{}x{}", viewport.0, viewport.1),
            features = ?self.capabilities.supported,
            "System info"
        );

        let mut degraded = false;
        for feature in self.capabilities.unsupported() {
            if let Some(class) = feature.missing_class() {
                self.page.set_body_class(class, true);
                degraded = true;
            }
        }
        if degraded {
            tracing::warn!(unsupported = ?self.capabilities.unsupported(), "Unsupported features detected");
            self.enable_fallbacks();
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn add_reducer(&self, reducer: &Rc<dyn LoadReducer>) {
        self.reducers.borrow_mut().push(Rc::downgrade(reducer));
    }

    pub fn register_error_handler(
        &self,
        kind: impl Into<String>,
        handler: impl Fn(&ErrorRecord) -> anyhow::Result<()> + 'static,
    ) {
        self.handlers.borrow_mut().entry(kind.into()).or_default().push(Rc::new(handler));
    }

    fn apply_reduction(&self, reduction: Reduction) {
        let live: Vec<Rc<dyn LoadReducer>> = {
            let mut reducers = self.reducers.borrow_mut();
            reducers.retain(|r| r.strong_count() > 0);
            reducers.iter().filter_map(Weak::upgrade).collect()
        };
        for reducer in live {
            reducer.reduce(reduction);
        }
    }

    pub fn record_frame(&self, at: Instant) {
        if let Some(previous) = self.last_frame.replace(Some(at)) {
            self.frames.borrow_mut().push(at.saturating_duration_since(previous));
            self.check_frame_rate();
        }
    }

    /// Pushes a frame duration directly, for shells that measure their own ticks.
    pub fn record_frame_time(&self, frame: Duration) {
        self.frames.borrow_mut().push(frame);
        self.check_frame_rate();
    }

    fn check_frame_rate(&self) {
        let Some(fps) = self.average_fps() else { return };
        if fps < self.policy.low_fps_threshold && !self.low_performance.get() {
            self.low_performance.set(true);
            tracing::warn!(fps = %format!("{:.1}", fps), "Low frame rate; reducing decorative load");
            self.page.set_body_class(LOW_PERFORMANCE_CLASS, true);
            self.apply_reduction(Reduction::LowPerformance);
        }
    }

    pub fn average_fps(&self) -> Option<f64> {
        self.frames.borrow().average_fps()
    }

    pub fn frame_samples(&self) -> Vec<Duration> {
        self.frames.borrow().samples().copied().collect()
    }

    pub fn sample_memory(&self, sample: MemorySample) {
        {
            let mut history = self.memory.borrow_mut();
            history.push_back(sample);
            while history.len() > self.policy.memory_history {
                history.pop_front();
            }
        }

        if let Some(ratio) = sample.ratio() {
            if ratio > self.policy.memory_ratio_threshold {
                tracing::warn!(usage_percent = %format!("{:.2}", ratio * 100.0), "High memory usage detected");
                self.frames.borrow_mut().trim_to(self.policy.memory_trim_frames);
                self.apply_reduction(Reduction::Memory);
            }
        }
    }

    pub fn latest_memory(&self) -> Option<MemorySample> {
        self.memory.borrow().back().copied()
    }

    pub fn enable_fallbacks(&self) {
        if !self.fallbacks_enabled.replace(true) {
            self.page.set_body_class(FALLBACK_MODE_CLASS, true);
            tracing::info!("Graceful degradation enabled");
        }
    }

    fn enable_emergency(&self) {
        if self.emergency.replace(true) {
            return;
        }
        self.page.set_body_class(EMERGENCY_CLASS, true);
        self.apply_reduction(Reduction::Emergency);
        tracing::error!(error_count = self.error_count.get(), "Emergency fallbacks enabled due to excessive errors");
    }

    /// Clears emergency mode and the error counter. The low-performance flag stays.
    pub fn reset_emergency(&self) {
        self.error_count.set(0);
        if self.emergency.replace(false) {
            self.page.set_body_class(EMERGENCY_CLASS, false);
            tracing::info!("Emergency fallbacks cleared");
        }
    }

    pub fn error_count(&self) -> u32 {
        self.error_count.get()
    }

    pub fn is_low_performance(&self) -> bool {
        self.low_performance.get() || self.emergency.get()
    }

    pub fn is_emergency(&self) -> bool {
        self.emergency.get()
    }

    pub fn is_fallback_active(&self) -> bool {
        self.fallbacks_enabled.get() || self.emergency.get()
    }

    pub fn is_feature_supported(&self, feature: Feature) -> bool {
        self.capabilities.is_supported(feature)
    }

    pub fn report(&self) -> PerformanceReport {
        PerformanceReport {
            average_fps: self.average_fps().unwrap_or(0.0),
            error_count: self.error_count.get(),
            is_low_performance: self.low_performance.get(),
            emergency: self.emergency.get(),
            fallbacks_enabled: self.fallbacks_enabled.get(),
            uptime_ms: self.started.elapsed().as_millis() as u64,
            memory_usage: self.latest_memory(),
            browser_support: self.capabilities.clone(),
            recent_errors: self.recent_errors.borrow().iter().cloned().collect(),
        }
    }
}

impl ErrorSink for PerformanceMonitor {
    fn handle_error(&self, kind: &str, error: &anyhow::Error, details: Details) {
        let count = self.error_count.get() + 1;
        self.error_count.set(count);

        let record = ErrorRecord {
            kind: kind.to_string(),
            message: error.to_string(),
            chain: error.chain().skip(1).map(|cause| cause.to_string()).collect(),
            timestamp: Utc::now(),
            url: self.page.location(),
            details,
        };
        tracing::error!(
            kind = %record.kind,
            message = %record.message,
            chain = ?record.chain,
            timestamp = %record.timestamp.to_rfc3339(),
            url = %record.url,
            details = %serde_json::Value::Object(record.details.clone()),
            error_count = count,
            "Error reported"
        );

        {
            let mut recent = self.recent_errors.borrow_mut();
            recent.push_back(record.clone());
            while recent.len() > RECENT_ERRORS {
                recent.pop_front();
            }
        }

        if count >= self.policy.global_error_threshold {
            self.enable_emergency();
        }

        let handlers = self.handlers.borrow().get(kind).cloned().unwrap_or_default();
        for handler in handlers {
            if let Err(e) = handler(&record) {
                tracing::error!(kind, error = %e, "Error handler failed");
            }
        }
    }
}
