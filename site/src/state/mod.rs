// Page-lifetime state: the active theme and the registry of live widgets.
pub mod registry;
pub mod theme_controller;

pub use registry::{ComponentKind, ComponentRegistry, Directive, Widget};
pub use theme_controller::{ThemeController, ThemeSnapshot, ToggleButton};
