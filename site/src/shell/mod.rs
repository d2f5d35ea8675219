// Desktop glue: the PageHost backed by Dioxus signals and the webview probes.
pub mod host_probe;
pub mod page_host;

pub use host_probe::HostReport;
pub use page_host::{DesktopPage, PageSignals};
