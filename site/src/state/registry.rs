// Registry of live widgets. Each widget registers itself synchronously while the
// site boots; the integration coordinator only ever reads from it afterwards.
use crate::services::page::{BasicSkill, DegradedView};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentKind {
    Theme,
    Leaves,
    Skills,
    Contact,
    Coffee,
    #[serde(rename = "lazy")]
    LazyImages,
}

impl ComponentKind {
    pub const ALL: [ComponentKind; 6] = [
        ComponentKind::Theme,
        ComponentKind::Leaves,
        ComponentKind::Skills,
        ComponentKind::Contact,
        ComponentKind::Coffee,
        ComponentKind::LazyImages,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ComponentKind::Theme => "theme",
            ComponentKind::Leaves => "leaves",
            ComponentKind::Skills => "skills",
            ComponentKind::Contact => "contact",
            ComponentKind::Coffee => "coffee",
            ComponentKind::LazyImages => "lazy",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ComponentKind::Theme => "ThemeController",
            ComponentKind::Leaves => "FallingLeaves",
            ComponentKind::Skills => "SkillsEnhancement",
            ComponentKind::Contact => "ContactAnimations",
            ComponentKind::Coffee => "CoffeeButton",
            ComponentKind::LazyImages => "LazyLoading",
        }
    }

    /// Body class set while this component shows its degraded presentation.
    pub fn error_marker(self) -> String {
        format!("{}-error", self.display_name().to_lowercase())
    }

    /// The simplified static UI substituted for this component once it is destroyed.
    pub fn degraded_view(self) -> DegradedView {
        match self {
            ComponentKind::Theme => DegradedView::ThemeToggle { notice: "Theme system unavailable" },
            ComponentKind::Leaves => DegradedView::StaticBackdrop {
                gradient: "linear-gradient(45deg, #2d221b 0%, #1a1a1a 100%)",
            },
            ComponentKind::Skills => DegradedView::BasicSkills(vec![
                BasicSkill { name: "Python", level: 90 },
                BasicSkill { name: "React", level: 85 },
                BasicSkill { name: "Three.js", level: 80 },
                BasicSkill { name: "Backend", level: 88 },
            ]),
            ComponentKind::Contact => DegradedView::PlainContactForm,
            ComponentKind::Coffee => DegradedView::PlainCoffeeLink { label: "☕ Buy me a coffee" },
            ComponentKind::LazyImages => DegradedView::EagerImages,
        }
    }
}

/// Instructions the coordinator forwards to widgets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Directive {
    Pause,
    Resume,
    RecomputeLayout { width: f64, height: f64 },
}

pub trait Widget {
    fn kind(&self) -> ComponentKind;

    // Most widgets ignore directives.
    fn apply(&self, _directive: &Directive) {}
}

#[derive(Default)]
pub struct ComponentRegistry {
    entries: RefCell<BTreeMap<ComponentKind, Rc<dyn Widget>>>,
}

impl ComponentRegistry {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn register(&self, widget: Rc<dyn Widget>) {
        let kind = widget.kind();
        if self.entries.borrow_mut().insert(kind, widget).is_some() {
            tracing::warn!(component = kind.display_name(), "Component registered twice; keeping the newest instance");
        } else {
            tracing::debug!(component = kind.display_name(), "Component registered");
        }
    }

    pub fn get(&self, kind: ComponentKind) -> Option<Rc<dyn Widget>> {
        self.entries.borrow().get(&kind).cloned()
    }

    pub fn contains(&self, kind: ComponentKind) -> bool {
        self.entries.borrow().contains_key(&kind)
    }

    pub fn registered(&self) -> Vec<ComponentKind> {
        self.entries.borrow().keys().copied().collect()
    }

    pub fn widgets(&self) -> Vec<Rc<dyn Widget>> {
        self.entries.borrow().values().cloned().collect()
    }

    pub fn missing(&self, expected: &[ComponentKind]) -> Vec<ComponentKind> {
        expected.iter().copied().filter(|kind| !self.contains(*kind)).collect()
    }
}
