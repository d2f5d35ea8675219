//! Falling-leaves background.
//!
//! The simulation is plain data: [`LeavesAnimation::step`] advances every leaf
//! once and the shell draws [`LeafSprite`]s. Leaves are placed with a seeded
//! xorshift32 generator, so a given seed always produces the same scene.

use crate::config::{LeafConfig, Theme};
use crate::events::{SiteBus, ThemeChanged};
use crate::services::performance::{LoadReducer, Reduction};
use crate::state::{ComponentKind, Directive, Widget};
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::f64::consts::TAU;
use std::rc::{Rc, Weak};
use std::time::Duration;

const LIGHT_LEAVES: [&str; 5] = ["#8b4513", "#a0522d", "#cd853f", "#daa520", "#b8860b"];
const DARK_LEAVES: [&str; 5] = ["#2f1b14", "#3d2817", "#4a3728", "#5d4037", "#6d4c41"];
const DARK_OPACITY: f64 = 0.7;
// Leaves respawn this far above the top edge and wrap this far past the sides.
const MARGIN: f64 = 50.0;
const LOW_PERFORMANCE_LIMIT: usize = 8;
const MEMORY_STEP: usize = 3;

fn xorshift32(state: &mut u32) -> u32 {
    let mut x = *state;
    x ^= x << 13;
    x ^= x >> 17;
    x ^= x << 5;
    *state = x;
    x
}

fn unit(state: &mut u32) -> f64 {
    xorshift32(state) as f64 / u32::MAX as f64
}

fn palette(theme: Theme) -> &'static [&'static str; 5] {
    match theme {
        Theme::Light => &LIGHT_LEAVES,
        Theme::Dark => &DARK_LEAVES,
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Leaf {
    x: f64,
    y: f64,
    origin_x: f64,
    size: f64,
    speed: f64,
    rotation: f64,
    rotation_speed: f64,
    sway_offset: f64,
    base_opacity: f64,
    opacity: f64,
    color: &'static str,
}

/// What the shell needs to draw one leaf.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeafSprite {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation_deg: f64,
    pub opacity: f64,
    pub color: &'static str,
    pub stem_color: &'static str,
}

struct Scene {
    leaves: Vec<Leaf>,
    rng: u32,
    width: f64,
    height: f64,
    theme: Theme,
    limit: usize,
}

impl Scene {
    fn spawn(&mut self, config: &LeafConfig) -> Leaf {
        let rng = &mut self.rng;
        let x = unit(rng) * self.width;
        let base_opacity = 0.3 + unit(rng) * 0.4;
        let mut leaf = Leaf {
            x,
            y: -MARGIN,
            origin_x: x,
            size: config.min_size + unit(rng) * (config.max_size - config.min_size),
            speed: config.min_speed + unit(rng) * (config.max_speed - config.min_speed),
            rotation: unit(rng) * TAU,
            rotation_speed: (unit(rng) - 0.5) * 0.05,
            sway_offset: unit(rng) * TAU,
            base_opacity,
            opacity: base_opacity,
            color: LIGHT_LEAVES[0],
        };
        self.paint(&mut leaf);
        leaf
    }

    fn paint(&mut self, leaf: &mut Leaf) {
        let colors = palette(self.theme);
        let pick = (xorshift32(&mut self.rng) as usize) % colors.len();
        leaf.color = colors[pick];
        leaf.opacity = match self.theme {
            Theme::Light => leaf.base_opacity,
            Theme::Dark => leaf.base_opacity * DARK_OPACITY,
        };
    }

    fn populate(&mut self, config: &LeafConfig) {
        self.leaves.clear();
        for _ in 0..self.limit {
            let mut leaf = self.spawn(config);
            // Half start somewhere on screen so the first frame is not empty.
            if unit(&mut self.rng) > 0.5 {
                leaf.y = unit(&mut self.rng) * self.height;
            }
            self.leaves.push(leaf);
        }
    }

    fn advance(&mut self, config: &LeafConfig) {
        for i in 0..self.leaves.len() {
            let mut leaf = self.leaves[i].clone();
            leaf.y += leaf.speed;
            leaf.x = leaf.origin_x + (leaf.y * config.sway_frequency + leaf.sway_offset).sin() * config.sway_amplitude;
            leaf.rotation += leaf.rotation_speed;

            if leaf.y > self.height + MARGIN {
                leaf = self.spawn(config);
            }
            if leaf.x < -MARGIN {
                leaf.origin_x = self.width + MARGIN;
            } else if leaf.x > self.width + MARGIN {
                leaf.origin_x = -MARGIN;
            }
            self.leaves[i] = leaf;
        }
    }
}

pub struct LeavesAnimation {
    config: LeafConfig,
    scene: RefCell<Scene>,
    running: Cell<bool>,
    // Set by Directive::Pause so Resume only restarts what visibility stopped.
    paused: Cell<bool>,
    // Set by the emergency reduction; nothing but restart() clears it.
    halted: Cell<bool>,
}

impl LeavesAnimation {
    pub fn new(config: LeafConfig, theme: Theme, viewport: (f64, f64), seed: u32) -> anyhow::Result<Rc<Self>> {
        anyhow::ensure!(config.min_size <= config.max_size, "leaf size range is inverted");
        anyhow::ensure!(config.min_speed <= config.max_speed, "leaf speed range is inverted");
        anyhow::ensure!(viewport.0 > 0.0 && viewport.1 > 0.0, "viewport has no area");

        let mut scene = Scene {
            leaves: Vec::new(),
            rng: seed | 1,
            width: viewport.0,
            height: viewport.1,
            theme,
            limit: config.leaf_count,
        };
        scene.populate(&config);
        tracing::info!(leaves = scene.leaves.len(), theme = %theme, "Falling leaves created");

        Ok(Rc::new(Self {
            config,
            scene: RefCell::new(scene),
            running: Cell::new(false),
            paused: Cell::new(false),
            halted: Cell::new(false),
        }))
    }

    /// Follows theme changes on the bus for as long as the animation lives.
    pub fn attach(self: &Rc<Self>, bus: &SiteBus) {
        let weak: Weak<Self> = Rc::downgrade(self);
        bus.theme_changed.subscribe(move |event: &ThemeChanged| {
            if let Some(leaves) = weak.upgrade() {
                leaves.set_theme(event.theme);
            }
        });
    }

    /// Returns false when already running or halted.
    pub fn start(&self) -> bool {
        if self.running.get() || self.halted.get() {
            return false;
        }
        self.running.set(true);
        true
    }

    pub fn stop(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn is_halted(&self) -> bool {
        self.halted.get()
    }

    /// One frame. A stopped animation does nothing.
    pub fn step(&self) {
        if !self.running.get() {
            return;
        }
        self.scene.borrow_mut().advance(&self.config);
    }

    /// Drops a leaf when the last frame blew the budget, down to the floor.
    pub fn note_frame_cost(&self, cost: Duration) {
        if cost.as_secs_f64() * 1000.0 <= self.config.frame_budget_ms {
            return;
        }
        let mut scene = self.scene.borrow_mut();
        if scene.leaves.len() > self.config.min_leaves {
            scene.leaves.pop();
            tracing::debug!(leaves = scene.leaves.len(), cost_ms = cost.as_millis() as u64, "Slow frame; dropped a leaf");
        }
    }

    pub fn restart(&self) {
        self.stop();
        self.halted.set(false);
        {
            let mut scene = self.scene.borrow_mut();
            scene.limit = self.config.leaf_count;
            scene.populate(&self.config);
        }
        self.start();
    }

    pub fn resize(&self, width: f64, height: f64) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let mut scene = self.scene.borrow_mut();
        scene.width = width;
        scene.height = height;
    }

    pub fn set_theme(&self, theme: Theme) {
        let mut scene = self.scene.borrow_mut();
        scene.theme = theme;
        let mut leaves = std::mem::take(&mut scene.leaves);
        for leaf in &mut leaves {
            scene.paint(leaf);
        }
        scene.leaves = leaves;
    }

    pub fn theme(&self) -> Theme {
        self.scene.borrow().theme
    }

    /// Caps the leaf count; extra leaves are removed now, not at the next restart.
    pub fn set_leaf_limit(&self, limit: usize) {
        let mut scene = self.scene.borrow_mut();
        scene.limit = limit;
        scene.leaves.truncate(limit);
    }

    pub fn leaf_limit(&self) -> usize {
        self.scene.borrow().limit
    }

    pub fn leaf_count(&self) -> usize {
        self.scene.borrow().leaves.len()
    }

    pub fn viewport(&self) -> (f64, f64) {
        let scene = self.scene.borrow();
        (scene.width, scene.height)
    }

    pub fn sprites(&self) -> Vec<LeafSprite> {
        let scene = self.scene.borrow();
        let stem_color = match scene.theme {
            Theme::Light => "#8b4513",
            Theme::Dark => "#2d1b14",
        };
        scene
            .leaves
            .iter()
            .map(|leaf| LeafSprite {
                x: leaf.x,
                y: leaf.y,
                width: leaf.size,
                height: leaf.size * 1.5,
                rotation_deg: leaf.rotation.to_degrees(),
                opacity: leaf.opacity,
                color: leaf.color,
                stem_color,
            })
            .collect()
    }
}

impl Widget for LeavesAnimation {
    fn kind(&self) -> ComponentKind {
        ComponentKind::Leaves
    }

    fn apply(&self, directive: &Directive) {
        match *directive {
            Directive::Pause => {
                if self.running.get() {
                    self.stop();
                    self.paused.set(true);
                }
            }
            Directive::Resume => {
                if self.paused.replace(false) {
                    self.start();
                }
            }
            Directive::RecomputeLayout { width, height } => self.resize(width, height),
        }
    }
}

impl LoadReducer for LeavesAnimation {
    fn reduce(&self, reduction: Reduction) {
        match reduction {
            Reduction::LowPerformance => {
                let limit = self.leaf_limit().min(LOW_PERFORMANCE_LIMIT);
                self.set_leaf_limit(limit);
            }
            Reduction::Memory => {
                let limit = self.leaf_limit().saturating_sub(MEMORY_STEP).max(self.config.min_leaves);
                self.set_leaf_limit(limit);
            }
            Reduction::Emergency => {
                self.stop();
                self.halted.set(true);
                tracing::warn!("Falling leaves halted");
            }
        }
        tracing::debug!(?reduction, leaves = self.leaf_count(), "Falling leaves reduced");
    }
}
