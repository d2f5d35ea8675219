// Deferred image loading. Images start Pending and are requested once visible;
// without visibility observation every image is requested up front.
use crate::config::ImageSpec;
use crate::state::{ComponentKind, Widget};
use serde::Serialize;
use std::cell::RefCell;
use std::rc::Rc;

pub const PLACEHOLDER_TEXT: &str = "Brewing...";
pub const ERROR_TEXT: &str = "Image unavailable";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageState {
    Pending,
    Loading,
    Loaded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LazyImage {
    pub id: String,
    pub data_src: String,
    pub alt: String,
    pub state: ImageState,
}

impl LazyImage {
    /// The `src` to render: nothing until a load has been requested.
    pub fn src(&self) -> Option<&str> {
        match self.state {
            ImageState::Pending => None,
            _ => Some(&self.data_src),
        }
    }
}

pub struct LazyImageLoader {
    images: RefCell<Vec<LazyImage>>,
}

impl LazyImageLoader {
    pub fn new(specs: &[ImageSpec]) -> Rc<Self> {
        let images = specs
            .iter()
            .map(|spec| LazyImage {
                id: spec.id.clone(),
                data_src: spec.src.clone(),
                alt: spec.alt.clone(),
                state: ImageState::Pending,
            })
            .collect();
        Rc::new(Self { images: RefCell::new(images) })
    }

    fn transition(&self, id: &str, from: &[ImageState], to: ImageState) -> bool {
        let mut images = self.images.borrow_mut();
        match images.iter_mut().find(|img| img.id == id) {
            Some(img) if from.contains(&img.state) => {
                img.state = to;
                true
            }
            _ => false,
        }
    }

    /// The image scrolled into view; start loading it once.
    pub fn on_visible(&self, id: &str) -> bool {
        self.transition(id, &[ImageState::Pending], ImageState::Loading)
    }

    pub fn on_loaded(&self, id: &str) -> bool {
        self.transition(id, &[ImageState::Loading], ImageState::Loaded)
    }

    pub fn on_error(&self, id: &str) -> bool {
        let failed = self.transition(id, &[ImageState::Loading], ImageState::Failed);
        if failed {
            tracing::warn!(image = id, "Image failed to load");
        }
        failed
    }

    /// Requests every pending image now.
    pub fn load_all(&self) -> usize {
        let mut images = self.images.borrow_mut();
        let mut started = 0;
        for img in images.iter_mut().filter(|img| img.state == ImageState::Pending) {
            img.state = ImageState::Loading;
            started += 1;
        }
        tracing::debug!(started, "Loading all images eagerly");
        started
    }

    pub fn images(&self) -> Vec<LazyImage> {
        self.images.borrow().clone()
    }

    pub fn state(&self, id: &str) -> Option<ImageState> {
        self.images.borrow().iter().find(|img| img.id == id).map(|img| img.state)
    }
}

impl Widget for LazyImageLoader {
    fn kind(&self) -> ComponentKind {
        ComponentKind::LazyImages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loader() -> Rc<LazyImageLoader> {
        let specs: Vec<ImageSpec> = ["a", "b"]
            .iter()
            .map(|id| ImageSpec { id: id.to_string(), src: format!("https://img/{}.png", id), alt: String::new() })
            .collect();
        LazyImageLoader::new(&specs)
    }

    #[test]
    fn test_visible_image_loads_once() {
        let loader = loader();
        assert_eq!(loader.images()[0].src(), None);
        assert!(loader.on_visible("a"));
        assert!(!loader.on_visible("a"));
        assert_eq!(loader.images()[0].src(), Some("https://img/a.png"));
        assert!(loader.on_loaded("a"));
        assert_eq!(loader.state("a"), Some(ImageState::Loaded));
        assert_eq!(loader.state("b"), Some(ImageState::Pending));
    }

    #[test]
    fn test_errors_only_from_loading() {
        let loader = loader();
        assert!(!loader.on_error("a"));
        loader.on_visible("a");
        assert!(loader.on_error("a"));
        assert_eq!(loader.state("a"), Some(ImageState::Failed));
        assert!(!loader.on_visible("missing"));
    }

    #[test]
    fn test_load_all_starts_pending_only() {
        let loader = loader();
        loader.on_visible("a");
        loader.on_loaded("a");
        assert_eq!(loader.load_all(), 1);
        assert_eq!(loader.state("b"), Some(ImageState::Loading));
    }
}
