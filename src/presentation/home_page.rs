// Home page feature panels driven by the section tracker
use crate::application::section_tracker::{SectionTracker, VisibilityWatcher};
use crate::domain::section::SectionId;

/// A product section on the home page and how it is presented when current.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureSection {
    pub id: &'static str,
    pub accent: &'static str,
    pub preview: &'static str,
}

pub static FEATURE_SECTIONS: [FeatureSection; 3] = [
    FeatureSection {
        id: "observability",
        accent: "sky-500",
        preview: "Monitor every request",
    },
    FeatureSection {
        id: "rate",
        accent: "pink-500",
        preview: "Rate limit per user",
    },
    FeatureSection {
        id: "bucket",
        accent: "purple-500",
        preview: "Cache responses in buckets",
    },
];

const INITIAL_SECTION: &str = "observability";

/// What the page draws for the current section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelPresentation {
    pub highlighted: Option<&'static str>,
    pub connector_accent: Option<&'static str>,
    pub preview: Option<&'static str>,
}

pub struct HomePage<W: VisibilityWatcher> {
    tracker: SectionTracker<W>,
}

impl<W: VisibilityWatcher> HomePage<W> {
    pub fn mount(watcher: W) -> Self {
        Self {
            tracker: SectionTracker::new(watcher, Some(SectionId::from(INITIAL_SECTION))),
        }
    }

    /// Register whichever anchors are rendered; call again after re-renders.
    pub fn render<F>(&mut self, mut anchor: F) -> usize
    where
        F: FnMut(&str) -> Option<W::Element>,
    {
        let elements: Vec<(SectionId, Option<W::Element>)> = FEATURE_SECTIONS
            .iter()
            .map(|s| (SectionId::from(s.id), anchor(s.id)))
            .collect();

        self.tracker
            .register(elements.iter().map(|(id, el)| (id.clone(), el.as_ref())))
    }

    pub fn current_section(&self) -> Option<SectionId> {
        self.tracker.current()
    }

    pub fn presentation(&self) -> PanelPresentation {
        let section = self
            .tracker
            .current()
            .and_then(|id| FEATURE_SECTIONS.iter().find(|s| s.id == id.as_str()));

        PanelPresentation {
            highlighted: section.map(|s| s.id),
            connector_accent: section.map(|s| s.accent),
            preview: section.map(|s| s.preview),
        }
    }

    pub fn unmount(mut self) {
        self.tracker.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::section_tracker::{BatchCallback, WatchError};
    use crate::domain::section::IntersectionEntry;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Inner {
        observed: Vec<SectionId>,
        callback: Option<BatchCallback>,
    }

    #[derive(Clone, Default)]
    struct ScriptedWatcher(Arc<Mutex<Inner>>);

    impl ScriptedWatcher {
        fn scroll(&self, entries: &[IntersectionEntry]) {
            if let Some(cb) = self.0.lock().unwrap().callback.as_mut() {
                cb(entries);
            }
        }
    }

    impl VisibilityWatcher for ScriptedWatcher {
        type Element = ();

        fn observe(&mut self, id: &SectionId, _element: &()) -> Result<(), WatchError> {
            self.0.lock().unwrap().observed.push(id.clone());
            Ok(())
        }

        fn unobserve(&mut self, id: &SectionId) {
            self.0.lock().unwrap().observed.retain(|o| o != id);
        }

        fn on_batch(&mut self, callback: BatchCallback) {
            self.0.lock().unwrap().callback = Some(callback);
        }
    }

    #[test]
    fn test_starts_on_observability() {
        let page = HomePage::mount(ScriptedWatcher::default());

        assert_eq!(
            page.presentation(),
            PanelPresentation {
                highlighted: Some("observability"),
                connector_accent: Some("sky-500"),
                preview: Some("Monitor every request"),
            }
        );
    }

    #[test]
    fn test_scroll_moves_connector() {
        let watcher = ScriptedWatcher::default();
        let mut page = HomePage::mount(watcher.clone());
        assert_eq!(page.render(|_| Some(())), 3);

        watcher.scroll(&[
            IntersectionEntry::leaving("observability"),
            IntersectionEntry::entering("rate"),
            IntersectionEntry::entering("bucket"),
        ]);

        let presentation = page.presentation();
        assert_eq!(presentation.highlighted, Some("bucket"));
        assert_eq!(presentation.connector_accent, Some("purple-500"));
    }

    #[test]
    fn test_conditional_anchor_registered_later() {
        let watcher = ScriptedWatcher::default();
        let mut page = HomePage::mount(watcher.clone());

        assert_eq!(page.render(|id| (id != "rate").then_some(())), 2);
        watcher.scroll(&[IntersectionEntry::entering("rate")]);
        assert_eq!(page.current_section(), Some(SectionId::from("observability")));

        assert_eq!(page.render(|_| Some(())), 1);
        watcher.scroll(&[IntersectionEntry::entering("rate")]);
        assert_eq!(page.current_section(), Some(SectionId::from("rate")));
    }

    #[test]
    fn test_unmount_releases_sections() {
        let watcher = ScriptedWatcher::default();
        let mut page = HomePage::mount(watcher.clone());
        page.render(|_| Some(()));

        page.unmount();

        assert!(watcher.0.lock().unwrap().observed.is_empty());
    }
}
