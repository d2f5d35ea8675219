#![allow(non_snake_case)]
// Live readout shown when the page location carries `debug=true`.
use super::UiTick;
use dioxus::prelude::*;
use portfolio_site::Site;
use std::rc::Rc;

const MIB: f64 = 1024.0 * 1024.0;

#[component]
pub fn DebugOverlay() -> Element {
    let site = use_context::<Rc<Site>>();
    let tick = use_context::<UiTick>();
    if !site.config.debug {
        return None;
    }
    tick.watch();
    tick.watch_frames();

    let snapshot = site.debug_snapshot();
    let perf = &snapshot.performance;
    let fps = format!("{:.1}", perf.average_fps);
    let memory = match perf.memory_usage {
        Some(sample) => format!("{:.1} / {:.1} MiB", sample.used as f64 / MIB, sample.limit as f64 / MIB),
        None => "n/a".to_string(),
    };
    let mode = if perf.emergency {
        "emergency"
    } else if perf.is_low_performance {
        "low performance"
    } else if perf.fallbacks_enabled {
        "fallbacks"
    } else {
        "normal"
    };
    let boundaries: Vec<String> = snapshot
        .boundaries
        .iter()
        .map(|b| {
            let state = if b.destroyed { " (destroyed)" } else { "" };
            format!("{}: {}{}", b.kind.display_name(), b.error_count, state)
        })
        .collect();
    let errors: Vec<String> =
        perf.recent_errors.iter().map(|e| format!("{}: {}", e.kind, e.message)).collect();
    let missing = snapshot.integration.missing.iter().map(|k| k.key()).collect::<Vec<_>>().join(", ");
    let error_count = perf.error_count;
    let total_boundary_errors = snapshot.total_boundary_errors;

    rsx! {
        aside { class: "debug-overlay",
            div { "FPS: {fps}" }
            div { "Memory: {memory}" }
            div { "Mode: {mode}" }
            div { "Errors: {error_count} (boundaries: {total_boundary_errors})" }
            if !missing.is_empty() {
                div { "Missing: {missing}" }
            }
            ul { class: "debug-boundaries",
                for line in boundaries {
                    li { "{line}" }
                }
            }
            if !errors.is_empty() {
                ul { class: "debug-errors",
                    for line in errors {
                        li { "{line}" }
                    }
                }
            }
            button {
                class: "debug-reset",
                onclick: move |_| {
                    let outcome = site.reset_all_components();
                    tracing::info!(?outcome, "Reset all components from debug overlay");
                    tick.touch();
                },
                "Reset All Components"
            }
        }
    }
}
