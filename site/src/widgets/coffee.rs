// "Buy me a coffee" button: press feedback, hover scale, focus marker and
// keyboard activation.
use crate::config::CoffeeSettings;
use crate::state::{ComponentKind, Widget};
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const ARIA_LABEL: &str = "Support me by buying me a coffee - opens in new tab";
pub const TITLE: &str = "Buy me a coffee ☕";

const PRESSED_SCALE: f64 = 0.95;
const HOVER_SCALE: f64 = 1.05;

pub struct CoffeeButton {
    settings: CoffeeSettings,
    pressed_until: Cell<Option<Instant>>,
    hovered: Cell<bool>,
    focused: Cell<bool>,
    disabled: Cell<bool>,
    clicks: Cell<u32>,
}

impl CoffeeButton {
    pub fn new(settings: CoffeeSettings) -> anyhow::Result<Rc<Self>> {
        anyhow::ensure!(!settings.url.is_empty(), "coffee link has no URL");
        Ok(Rc::new(Self {
            settings,
            pressed_until: Cell::new(None),
            hovered: Cell::new(false),
            focused: Cell::new(false),
            disabled: Cell::new(false),
            clicks: Cell::new(0),
        }))
    }

    pub fn url(&self) -> &str {
        &self.settings.url
    }

    pub fn press_duration(&self) -> Duration {
        Duration::from_millis(self.settings.press_ms)
    }

    /// Returns whether the click counted; a disabled button ignores it.
    pub fn click(&self, now: Instant) -> bool {
        if self.disabled.get() {
            return false;
        }
        self.pressed_until.set(Some(now + self.press_duration()));
        let clicks = self.clicks.get() + 1;
        self.clicks.set(clicks);
        tracing::info!(clicks, url = %self.settings.url, "Coffee button clicked");
        true
    }

    /// Enter and Space activate the button like a click.
    pub fn key_down(&self, key: &str, now: Instant) -> bool {
        match key {
            "Enter" | " " => self.click(now),
            _ => false,
        }
    }

    pub fn set_hovered(&self, hovered: bool) {
        self.hovered.set(hovered);
    }

    pub fn set_focused(&self, focused: bool) {
        self.focused.set(focused);
    }

    pub fn is_focused(&self) -> bool {
        self.focused.get()
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.get()
    }

    pub fn clicks(&self) -> u32 {
        self.clicks.get()
    }

    pub fn scale(&self, now: Instant) -> f64 {
        match self.pressed_until.get() {
            Some(until) if now < until => PRESSED_SCALE,
            _ if self.hovered.get() => HOVER_SCALE,
            _ => 1.0,
        }
    }
}

impl Widget for CoffeeButton {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Coffee
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn button() -> Rc<CoffeeButton> {
        CoffeeButton::new(CoffeeSettings { url: "https://www.buymeacoffee.com/".into(), press_ms: 150 }).unwrap()
    }

    #[test]
    fn test_press_feedback_lasts_press_duration() {
        let button = button();
        let t0 = Instant::now();
        assert!(button.click(t0));
        assert_eq!(button.scale(t0 + Duration::from_millis(100)), PRESSED_SCALE);
        assert_eq!(button.scale(t0 + Duration::from_millis(151)), 1.0);

        button.set_hovered(true);
        assert_eq!(button.scale(t0 + Duration::from_millis(200)), HOVER_SCALE);
    }

    #[test]
    fn test_keyboard_activation() {
        let button = button();
        let now = Instant::now();
        assert!(button.key_down("Enter", now));
        assert!(button.key_down(" ", now));
        assert!(!button.key_down("a", now));
        assert_eq!(button.clicks(), 2);
    }

    #[test]
    fn test_disabled_button_ignores_clicks() {
        let button = button();
        button.set_disabled(true);
        assert!(!button.click(Instant::now()));
        assert_eq!(button.clicks(), 0);
        assert!(CoffeeButton::new(CoffeeSettings { url: String::new(), press_ms: 150 }).is_err());
    }
}
