use tracing::debug;

use crate::{
    composition::{
        model::{ComponentId, SceneComponent},
        property::ComponentProperty,
    },
    foundation::error::EditorResult,
};

/// Detached working copy of the one component open for property editing.
///
/// Edits never reach the [`SceneStore`](crate::SceneStore) on their own; the caller commits the
/// copy explicitly (see [`EditorContext::commit_overlay`](crate::EditorContext::commit_overlay)) or
/// drops it with [`OverlayStore::hide_overlay`].
#[derive(Clone, Debug, Default)]
pub struct OverlayStore {
    visible_overlay_id: Option<ComponentId>,
    overlay_object: Option<SceneComponent>,
    edited: bool,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the overlay on a snapshot of `component`, replacing any open overlay.
    pub fn show_overlay(&mut self, component: &SceneComponent) {
        self.visible_overlay_id = Some(component.id.clone());
        self.overlay_object = Some(component.clone());
        self.edited = false;
        debug!(component = %component.id, "overlay shown");
    }

    /// Apply a property to the working copy only. Returns `Ok(false)` when no overlay is open.
    pub fn update_overlay_property(&mut self, property: ComponentProperty) -> EditorResult<bool> {
        let Some(copy) = self.overlay_object.as_mut() else {
            return Ok(false);
        };
        property.apply(copy)?;
        self.edited = true;
        Ok(true)
    }

    /// Close the overlay, discarding uncommitted edits.
    pub fn hide_overlay(&mut self) {
        if let Some(id) = self.visible_overlay_id.take() {
            debug!(component = %id, discarded = self.edited, "overlay hidden");
        }
        self.overlay_object = None;
        self.edited = false;
    }

    pub fn overlay_data(&self) -> Option<&SceneComponent> {
        self.overlay_object.as_ref()
    }

    pub fn visible_overlay_id(&self) -> Option<&str> {
        self.visible_overlay_id.as_deref()
    }

    /// Whether the working copy has edits not yet committed.
    pub fn has_pending_edits(&self) -> bool {
        self.edited
    }

    /// Snapshot of the working copy for committing; marks the copy clean.
    pub fn take_commit(&mut self) -> Option<SceneComponent> {
        let copy = self.overlay_object.clone()?;
        self.edited = false;
        Some(copy)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/overlay.rs"]
mod tests;
