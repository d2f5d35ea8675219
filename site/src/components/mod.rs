// Portfolio components. Each one reads the shared `Site` from context and
// re-renders when the UiTick it watches moves.
pub mod coffee_link;
pub mod contact_section;
pub mod debug_overlay;
pub mod gallery;
pub mod leaves_canvas;
pub mod skills_section;
pub mod theme_toggle;

pub use coffee_link::CoffeeLink;
pub use contact_section::ContactSection;
pub use debug_overlay::DebugOverlay;
pub use gallery::Gallery;
pub use leaves_canvas::LeavesCanvas;
pub use skills_section::SkillsSection;
pub use theme_toggle::ThemeToggle;

use dioxus::prelude::*;

/// The runtime keeps its state behind `Rc`/`Cell`, not signals, so components
/// subscribe to these counters instead.
#[derive(Clone, Copy, PartialEq)]
pub struct UiTick {
    pub frame: Signal<u64>,
    pub revision: Signal<u64>,
}

impl UiTick {
    pub fn use_new() -> Self {
        Self { frame: use_signal(|| 0), revision: use_signal(|| 0) }
    }

    /// Something the user did changed runtime state.
    pub fn touch(&self) {
        let mut revision = self.revision;
        revision += 1;
    }

    pub fn next_frame(&self) {
        let mut frame = self.frame;
        frame += 1;
    }

    pub fn watch(&self) -> u64 {
        *self.revision.read()
    }

    pub fn watch_frames(&self) -> u64 {
        *self.frame.read()
    }
}
