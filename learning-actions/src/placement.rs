//! Opening the placement test
//!
//! The placement section is rendered on navigation, so its markup does not
//! exist when the action is dispatched. The flow navigates, waits two frames
//! for the render to land, and only starts the test once every element the
//! test drives is present.

use std::sync::Arc;

use ui_dispatch::{
    lock, settle, Arg, Collaborators, FrameScheduler, HookError, Notice, Notifier, SharedDocument,
};

use crate::names::Collaborator;

pub const PLACEMENT_SECTION: &str = "placement";

/// Element ids the placement test needs before it can start
pub const PLACEMENT_ELEMENTS: [&str; 4] = [
    "placement-test",
    "placement-question",
    "placement-options",
    "placement-progress",
];

pub const PLACEMENT_UNAVAILABLE: &str = "The placement test could not be opened. Please try again.";

/// Everything the flow needs, owned so it can outlive the dispatch turn
pub struct PlacementFlow {
    pub collaborators: Collaborators<Collaborator>,
    pub document: SharedDocument,
    pub frames: Arc<dyn FrameScheduler>,
    pub notifier: Notifier,
}

impl PlacementFlow {
    pub async fn run(self) -> Result<(), HookError> {
        if let Err(error) = self
            .collaborators
            .call_async(Collaborator::Navigate, vec![Arg::text(PLACEMENT_SECTION)])
            .await
        {
            self.notifier.show(Notice::error(PLACEMENT_UNAVAILABLE));
            return Err(error);
        }

        settle(self.frames.as_ref()).await;

        let missing = missing_elements(&self.document);
        if !missing.is_empty() {
            self.notifier.show(Notice::error(PLACEMENT_UNAVAILABLE));
            return Err(HookError::new(format!(
                "placement test is not rendered; missing {}",
                missing.join(", ")
            )));
        }

        tracing::debug!("placement test rendered, starting");
        self.collaborators
            .call_async(Collaborator::StartPlacement, Vec::new())
            .await
    }
}

/// Required placement elements absent from `document`
pub fn missing_elements(document: &SharedDocument) -> Vec<&'static str> {
    let doc = lock(document);
    PLACEMENT_ELEMENTS
        .into_iter()
        .filter(|id| doc.element_by_id(id).is_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ui_dispatch::{share, Document, ElementSpec};

    #[test]
    fn test_missing_elements() {
        let mut doc = Document::new();
        let root = doc.root();
        doc.insert(root, ElementSpec::new("section").id("placement-test"))
            .unwrap();
        doc.insert(root, ElementSpec::new("div").id("placement-options"))
            .unwrap();
        let doc = share(doc);
        assert_eq!(
            missing_elements(&doc),
            vec!["placement-question", "placement-progress"]
        );
    }
}
