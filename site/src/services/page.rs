// The seam between the runtime services and whatever actually draws the page.
// Services only ever talk to a `PageHost`; the desktop shell implements it with
// Dioxus signals, `HeadlessPage` records the calls for headless runs and tests.
use crate::config::Theme;
use crate::state::ComponentKind;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

pub const TRANSITION_CLASS: &str = "theme-transitioning";

/// Themable regions of the page, addressed by the class/id the markup gives them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Surface {
    Body,
    SkillTooltips,
    ContactForm,
    GlassCards,
    ProjectCards,
    Terminals,
    CoffeeButton,
}

impl Surface {
    pub const THEMABLE: [Surface; 7] = [
        Surface::SkillTooltips,
        Surface::ContactForm,
        Surface::CoffeeButton,
        Surface::GlassCards,
        Surface::ProjectCards,
        Surface::Terminals,
        Surface::Body,
    ];

    pub fn selector(self) -> &'static str {
        match self {
            Surface::Body => "body",
            Surface::SkillTooltips => ".skill-tooltip",
            Surface::ContactForm => "#contact-form",
            Surface::GlassCards => ".glass-card",
            Surface::ProjectCards => ".project-card",
            Surface::Terminals => ".terminal",
            Surface::CoffeeButton => ".coffee-button",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BasicSkill {
    pub name: &'static str,
    pub level: u8,
}

/// Static stand-in rendered in place of a destroyed component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DegradedView {
    ThemeToggle { notice: &'static str },
    StaticBackdrop { gradient: &'static str },
    BasicSkills(Vec<BasicSkill>),
    PlainContactForm,
    PlainCoffeeLink { label: &'static str },
    EagerImages,
}

/// Timed classes currently applied to surfaces. Each `begin` hands out a
/// ticket; only the holder of the latest ticket for a class may remove it, so
/// an earlier timer never cuts a later flash short.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlashSet {
    active: BTreeMap<(Surface, &'static str), u64>,
    issued: u64,
}

impl FlashSet {
    pub fn begin(&mut self, surface: Surface, class: &'static str) -> u64 {
        self.issued += 1;
        self.active.insert((surface, class), self.issued);
        self.issued
    }

    /// Removes the class if `ticket` is still the latest for it.
    pub fn end(&mut self, surface: Surface, class: &'static str, ticket: u64) -> bool {
        if self.active.get(&(surface, class)) != Some(&ticket) {
            return false;
        }
        self.active.remove(&(surface, class));
        true
    }

    pub fn classes(&self, surface: Surface) -> impl Iterator<Item = &'static str> + '_ {
        self.active.keys().filter(move |(s, _)| *s == surface).map(|(_, class)| *class)
    }

    pub fn clear(&mut self) {
        self.active.clear();
    }
}

pub trait PageHost {
    /// Location used in error reports.
    fn location(&self) -> String;
    /// `data-theme` on the document root.
    fn set_theme_attribute(&self, theme: Theme);
    /// Browser chrome color hint (`<meta name="theme-color">`).
    fn set_chrome_color(&self, color: &str);
    /// Adds `class` to `surface` and removes it again after `duration`.
    fn flash_class(&self, surface: Surface, class: &'static str, duration: Duration);
    fn set_body_class(&self, class: &str, enabled: bool);
    fn show_degraded(&self, kind: ComponentKind, view: DegradedView);
    fn clear_degraded(&self, kind: ComponentKind);
    /// Full page reload; the last-resort recovery path.
    fn reload(&self);
}

#[derive(Debug, Default)]
struct HeadlessState {
    theme_attribute: Option<Theme>,
    chrome_color: Option<String>,
    flashes: Vec<(Surface, &'static str)>,
    body_classes: BTreeSet<String>,
    degraded: BTreeMap<ComponentKind, DegradedView>,
    degraded_shown: BTreeMap<ComponentKind, usize>,
    reloads: usize,
}

/// A page that keeps everything in memory. Flashes are recorded, not timed.
#[derive(Debug)]
pub struct HeadlessPage {
    location: String,
    state: RefCell<HeadlessState>,
}

impl Default for HeadlessPage {
    fn default() -> Self {
        Self::new("app://portfolio/")
    }
}

impl HeadlessPage {
    pub fn new(location: impl Into<String>) -> Self {
        Self { location: location.into(), state: RefCell::new(HeadlessState::default()) }
    }

    pub fn theme_attribute(&self) -> Option<Theme> {
        self.state.borrow().theme_attribute
    }

    pub fn chrome_color(&self) -> Option<String> {
        self.state.borrow().chrome_color.clone()
    }

    pub fn flashes(&self) -> Vec<(Surface, &'static str)> {
        self.state.borrow().flashes.clone()
    }

    pub fn has_body_class(&self, class: &str) -> bool {
        self.state.borrow().body_classes.contains(class)
    }

    pub fn degraded(&self, kind: ComponentKind) -> Option<DegradedView> {
        self.state.borrow().degraded.get(&kind).cloned()
    }

    /// How many times `show_degraded` was called for `kind`.
    pub fn degraded_shown(&self, kind: ComponentKind) -> usize {
        self.state.borrow().degraded_shown.get(&kind).copied().unwrap_or(0)
    }

    pub fn reloads(&self) -> usize {
        self.state.borrow().reloads
    }
}

impl PageHost for HeadlessPage {
    fn location(&self) -> String {
        self.location.clone()
    }

    fn set_theme_attribute(&self, theme: Theme) {
        self.state.borrow_mut().theme_attribute = Some(theme);
    }

    fn set_chrome_color(&self, color: &str) {
        self.state.borrow_mut().chrome_color = Some(color.to_string());
    }

    fn flash_class(&self, surface: Surface, class: &'static str, _duration: Duration) {
        self.state.borrow_mut().flashes.push((surface, class));
    }

    fn set_body_class(&self, class: &str, enabled: bool) {
        let mut state = self.state.borrow_mut();
        if enabled {
            state.body_classes.insert(class.to_string());
        } else {
            state.body_classes.remove(class);
        }
    }

    fn show_degraded(&self, kind: ComponentKind, view: DegradedView) {
        let mut state = self.state.borrow_mut();
        state.degraded.insert(kind, view);
        *state.degraded_shown.entry(kind).or_insert(0) += 1;
    }

    fn clear_degraded(&self, kind: ComponentKind) {
        self.state.borrow_mut().degraded.remove(&kind);
    }

    fn reload(&self) {
        self.state.borrow_mut().reloads += 1;
    }
}
