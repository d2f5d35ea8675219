// Decorative widgets. Each registers itself with the ComponentRegistry during
// bootstrap and listens to the bus on its own.
pub mod coffee;
pub mod contact_form;
pub mod lazy_images;
pub mod leaves;
pub mod skills;

pub use coffee::CoffeeButton;
pub use contact_form::{ContactForm, Field, FormPhase, Notice, NoticeKind};
pub use lazy_images::{ImageState, LazyImage, LazyImageLoader};
pub use leaves::{LeafSprite, LeavesAnimation};
pub use skills::{Rect, SkillView, SkillsPanel, TooltipPlacement};
