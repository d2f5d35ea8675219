// What the webview can do, asked once at startup, plus the page event feed.
use dioxus::prelude::*;
use portfolio_site::services::performance::{Capabilities, Feature, MemorySample};
use portfolio_site::Site;
use serde::Deserialize;
use serde_json::Value;
use std::rc::Rc;

const DEFAULT_VIEWPORT: (f64, f64) = (1280.0, 800.0);

// Each probe actually exercises the feature; a throw counts as unsupported.
const PROBE_SCRIPT: &str = r#"
const probe = (f) => { try { return !!f(); } catch (e) { return false; } };
return {
    animationFrames: probe(() => typeof window.requestAnimationFrame === 'function'),
    canvas: probe(() => document.createElement('canvas').getContext('2d')),
    intersectionObserver: probe(() => 'IntersectionObserver' in window),
    customProperties: probe(() => window.CSS && CSS.supports('color', 'var(--probe)')),
    webgl: probe(() => document.createElement('canvas').getContext('webgl')),
    transforms3d: probe(() => window.CSS && CSS.supports('transform', 'translate3d(0, 0, 0)')),
    prefersDark: window.matchMedia ? window.matchMedia('(prefers-color-scheme: dark)').matches : null,
    width: window.innerWidth,
    height: window.innerHeight
};
"#;

const EVENTS_SCRIPT: &str = r#"
document.addEventListener('visibilitychange', () => dioxus.send({ kind: 'visibility', visible: !document.hidden }));
window.addEventListener('resize', () => dioxus.send({ kind: 'resize', width: window.innerWidth, height: window.innerHeight }));
if (window.matchMedia) {
    window.matchMedia('(prefers-color-scheme: dark)')
        .addEventListener('change', (e) => dioxus.send({ kind: 'scheme', dark: e.matches }));
}
await new Promise(() => {});
"#;

// Only Chromium-based webviews expose `performance.memory`.
const MEMORY_SCRIPT: &str = r#"
const m = window.performance && performance.memory;
return m ? { used: m.usedJSHeapSize, total: m.totalJSHeapSize, limit: m.jsHeapSizeLimit } : null;
"#;

#[derive(Debug, Clone, PartialEq)]
pub struct HostReport {
    probes: Value,
}

impl HostReport {
    pub async fn probe() -> Self {
        match eval(PROBE_SCRIPT).join().await {
            Ok(probes) => Self { probes },
            Err(e) => {
                tracing::warn!(error = ?e, "Host probe failed; assuming a bare host");
                Self { probes: Value::Null }
            }
        }
    }

    /// Durable storage is the preference file, not the webview's storage.
    pub fn capabilities(&self, durable_storage: bool) -> Capabilities {
        Capabilities::detect(&|feature: Feature| -> anyhow::Result<bool> {
            if feature == Feature::DurableStorage {
                return Ok(durable_storage);
            }
            self.probes
                .get(feature.key())
                .and_then(Value::as_bool)
                .ok_or_else(|| anyhow::anyhow!("no probe result for {}", feature.key()))
        })
    }

    pub fn prefers_dark(&self) -> Option<bool> {
        self.probes.get("prefersDark").and_then(Value::as_bool)
    }

    pub fn viewport(&self) -> (f64, f64) {
        let width = self.probes.get("width").and_then(Value::as_f64);
        let height = self.probes.get("height").and_then(Value::as_f64);
        match (width, height) {
            (Some(w), Some(h)) if w > 0.0 && h > 0.0 => (w, h),
            _ => DEFAULT_VIEWPORT,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum PageEvent {
    Visibility { visible: bool },
    Resize { width: f64, height: f64 },
    Scheme { dark: bool },
}

/// Forwards webview events to the site until the page goes away.
pub async fn pump_page_events(site: Rc<Site>, mut on_change: impl FnMut()) {
    let mut events = eval(EVENTS_SCRIPT);
    loop {
        let raw = match events.recv().await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::debug!(error = ?e, "Page event feed closed");
                return;
            }
        };
        match serde_json::from_value::<PageEvent>(raw) {
            Ok(PageEvent::Visibility { visible }) => site.set_visible(visible),
            Ok(PageEvent::Resize { width, height }) => site.resized(width, height),
            Ok(PageEvent::Scheme { dark }) => site.system_scheme_changed(dark),
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring unknown page event");
                continue;
            }
        }
        on_change();
    }
}

#[derive(Debug, Deserialize)]
struct HeapUsage {
    used: u64,
    total: u64,
    limit: u64,
}

pub async fn read_memory() -> Option<MemorySample> {
    let raw = eval(MEMORY_SCRIPT).join().await.ok()?;
    let heap: HeapUsage = serde_json::from_value(raw).ok()?;
    Some(MemorySample { used: heap.used, total: heap.total, limit: heap.limit, at: chrono::Utc::now() })
}
