// Skills panel: level bars that animate in when scrolled into view, and one
// tooltip at a time positioned to stay inside the viewport.
use crate::config::{SkillSpec, Theme};
use crate::events::{SiteBus, ThemeChanged};
use crate::state::{ComponentKind, Directive, Widget};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

pub const TOOLTIP_WIDTH: f64 = 288.0;
const EDGE_GAP: f64 = 10.0;
const TOP_CLEARANCE: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Vertical {
    Top,
    Bottom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Horizontal {
    /// Pinned to the left edge.
    Left,
    Center,
    /// Pinned to the right edge.
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TooltipPlacement {
    pub vertical: Vertical,
    pub horizontal: Horizontal,
}

/// Above the anchor unless there is no room, centered unless that would clip.
pub fn place_tooltip(anchor: Rect, tooltip_height: f64, viewport_width: f64) -> TooltipPlacement {
    let vertical = if anchor.top - tooltip_height - TOP_CLEARANCE < 0.0 { Vertical::Bottom } else { Vertical::Top };
    let center_x = anchor.left + anchor.width / 2.0;
    let horizontal = if center_x - TOOLTIP_WIDTH / 2.0 < EDGE_GAP {
        Horizontal::Left
    } else if center_x + TOOLTIP_WIDTH / 2.0 > viewport_width - EDGE_GAP {
        Horizontal::Right
    } else {
        Horizontal::Center
    };
    TooltipPlacement { vertical, horizontal }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkillView {
    pub name: String,
    pub level: u8,
    pub category: String,
    pub description: String,
    /// Width of the level bar in percent; zero until the skill has been seen.
    pub progress: u8,
    pub tooltip: Option<TooltipPlacement>,
}

#[derive(Debug, Clone, Copy)]
struct OpenTooltip {
    index: usize,
    anchor: Rect,
    height: f64,
    placement: TooltipPlacement,
}

pub struct SkillsPanel {
    skills: Vec<SkillSpec>,
    revealed: RefCell<Vec<bool>>,
    open: Cell<Option<OpenTooltip>>,
    viewport_width: Cell<f64>,
    theme: Cell<Theme>,
}

impl SkillsPanel {
    pub fn new(skills: Vec<SkillSpec>, theme: Theme, viewport_width: f64) -> anyhow::Result<Rc<Self>> {
        anyhow::ensure!(!skills.is_empty(), "no skills configured");
        if let Some(bad) = skills.iter().find(|s| s.level > 100) {
            anyhow::bail!("skill '{}' has level {} above 100", bad.name, bad.level);
        }
        tracing::info!(skills = skills.len(), "Skills panel rendered");
        let revealed = RefCell::new(vec![false; skills.len()]);
        Ok(Rc::new(Self {
            skills,
            revealed,
            open: Cell::new(None),
            viewport_width: Cell::new(viewport_width),
            theme: Cell::new(theme),
        }))
    }

    pub fn attach(self: &Rc<Self>, bus: &SiteBus) {
        let weak: Weak<Self> = Rc::downgrade(self);
        bus.theme_changed.subscribe(move |event: &ThemeChanged| {
            if let Some(panel) = weak.upgrade() {
                panel.theme.set(event.theme);
            }
        });
    }

    pub fn theme(&self) -> Theme {
        self.theme.get()
    }

    /// Tooltip background follows the active palette's card color.
    pub fn tooltip_background(&self) -> String {
        self.theme.get().data().colors.card_bg
    }

    pub fn len(&self) -> usize {
        self.skills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    /// The skill scrolled into view; its bar animates to its level.
    pub fn reveal(&self, index: usize) {
        if let Some(seen) = self.revealed.borrow_mut().get_mut(index) {
            *seen = true;
        }
    }

    /// Fallback when visibility cannot be observed.
    pub fn reveal_all(&self) {
        self.revealed.borrow_mut().iter_mut().for_each(|seen| *seen = true);
    }

    pub fn show_tooltip(&self, index: usize, anchor: Rect, tooltip_height: f64) -> anyhow::Result<TooltipPlacement> {
        anyhow::ensure!(index < self.skills.len(), "no skill at index {}", index);
        let placement = place_tooltip(anchor, tooltip_height, self.viewport_width.get());
        self.open.set(Some(OpenTooltip { index, anchor, height: tooltip_height, placement }));
        Ok(placement)
    }

    pub fn hide_tooltip(&self) {
        self.open.set(None);
    }

    pub fn open_tooltip(&self) -> Option<(usize, TooltipPlacement)> {
        self.open.get().map(|t| (t.index, t.placement))
    }

    fn recompute_tooltip(&self) {
        if let Some(mut open) = self.open.get() {
            open.placement = place_tooltip(open.anchor, open.height, self.viewport_width.get());
            self.open.set(Some(open));
        }
    }

    pub fn views(&self) -> Vec<SkillView> {
        let revealed = self.revealed.borrow();
        let open = self.open.get();
        self.skills
            .iter()
            .enumerate()
            .map(|(i, skill)| SkillView {
                name: skill.name.clone(),
                level: skill.level,
                category: skill.category.clone(),
                description: skill.description.clone(),
                progress: if revealed[i] { skill.level } else { 0 },
                tooltip: open.filter(|t| t.index == i).map(|t| t.placement),
            })
            .collect()
    }
}

impl Widget for SkillsPanel {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Skills
    }

    fn apply(&self, directive: &Directive) {
        if let Directive::RecomputeLayout { width, .. } = *directive {
            self.viewport_width.set(width);
            self.recompute_tooltip();
        }
    }
}
