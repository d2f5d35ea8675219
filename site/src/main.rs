// Desktop entry point: loads the embedded config and opens the portfolio window.
#![allow(non_snake_case)] // Common for Dioxus components

use dioxus::prelude::*;
use dioxus_desktop::{Config as DesktopConfig, LogicalSize, WindowBuilder};
use portfolio_site::SiteConfig;
use tracing_subscriber::EnvFilter;

mod app;
mod components;
mod shell;

use app::{App, LaunchOptions};

const DEFAULT_LOCATION: &str = "app://portfolio/";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // First argument overrides the page location, e.g. `app://portfolio/?debug=true`.
    let location = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_LOCATION.to_string());

    let config = match SiteConfig::load_default() {
        Ok(cfg) => {
            tracing::info!("Loaded default configuration version {}.", cfg.version);
            cfg.with_location(&location)
        }
        Err(e) => {
            tracing::error!("Failed to load default configuration: {}. Exiting.", e);
            std::process::exit(1);
        }
    };
    tracing::info!(%location, debug = config.debug, "Starting portfolio site");

    let desktop_config = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title(config.site.title.clone())
            .with_inner_size(LogicalSize::new(1280.0, 800.0)),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_config)
        .with_context(LaunchOptions { config, location })
        .launch(App);
}
