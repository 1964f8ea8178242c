//! The editor's state container.
//!
//! [`EditorContext`] owns every store for one mounted editor and is passed explicitly to the code
//! that needs it. Mutations go through the context so the playback duration and the auto-save
//! coordinator observe each committed change in the same call.

use std::time::Instant;

use tracing::{debug, info};

use crate::{
    bridge::player::{Player, PlayerBridge},
    composition::{
        model::{
            ComponentDraft, ComponentId, Project, ProjectDocument, SceneComponent, SceneId,
            SceneTemplate,
        },
        property::ComponentProperty,
    },
    editor::config::EditorConfig,
    foundation::{
        coords::{frame_from_pixel_x, reference_pixels_per_frame},
        core::{FrameIndex, Point},
        error::EditorResult,
    },
    input::keyboard::{KeyEvent, KeyOutcome, KeyboardHandler},
    persist::{
        autosave::{AutoSaveCoordinator, SaveNotice},
        backend::SceneBackend,
    },
    store::{
        overlay::OverlayStore,
        playback::PlaybackStore,
        scenes::{ScenePatch, SceneStore},
    },
};

/// Work done by one [`EditorContext::tick`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Player events applied.
    pub events_applied: usize,
    /// Saves issued to the backend.
    pub saves_issued: usize,
}

/// All editor state for one mount cycle.
pub struct EditorContext {
    config: EditorConfig,
    project: Option<Project>,
    scenes: SceneStore,
    overlay: OverlayStore,
    playback: PlaybackStore,
    bridge: PlayerBridge,
    autosave: AutoSaveCoordinator,
    keyboard: KeyboardHandler,
}

impl EditorContext {
    /// Create a mounted editor with an empty project.
    pub fn create(config: EditorConfig) -> EditorResult<Self> {
        config.validate()?;
        let mut keyboard = KeyboardHandler::new();
        keyboard.mount();
        info!(fps = config.fps.as_f64(), "editor context created");
        Ok(Self {
            playback: PlaybackStore::new(config.playhead_width_px),
            bridge: PlayerBridge::new(config.player_event_capacity),
            autosave: AutoSaveCoordinator::new(config.autosave_debounce()),
            config,
            project: None,
            scenes: SceneStore::new(),
            overlay: OverlayStore::new(),
            keyboard,
        })
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn project(&self) -> Option<&Project> {
        self.project.as_ref()
    }

    pub fn scenes(&self) -> &SceneStore {
        &self.scenes
    }

    pub fn overlay(&self) -> &OverlayStore {
        &self.overlay
    }

    pub fn playback(&self) -> &PlaybackStore {
        &self.playback
    }

    pub fn keyboard(&self) -> &KeyboardHandler {
        &self.keyboard
    }

    /// "Saving…" indicator.
    pub fn is_updating(&self) -> bool {
        self.autosave.is_updating()
    }

    /// Failed-save notices since the last call.
    pub fn take_notices(&mut self) -> Vec<SaveNotice> {
        self.autosave.take_notices()
    }

    /// Current project with the store's scenes, in timeline order.
    pub fn document(&self) -> Option<ProjectDocument> {
        let mut project = self.project.clone()?;
        project.scene_ids = self.scenes.scenes().iter().map(|s| s.id.clone()).collect();
        Some(ProjectDocument {
            project,
            scenes: self.scenes.scenes().to_vec(),
        })
    }

    /// Replace the open project. Invalid documents are rejected without touching state.
    pub fn load_project(&mut self, doc: ProjectDocument) -> EditorResult<()> {
        doc.validate()?;
        self.reset();
        for scene in &doc.scenes {
            self.autosave.mark_loaded(scene);
        }
        self.scenes.load(doc.scenes);
        self.scenes.take_dirty();
        self.scenes.take_order_dirty();
        self.playback.sync_duration(&self.scenes);
        info!(project = %doc.project.id, scenes = self.scenes.scenes().len(), "project loaded");
        self.project = Some(doc.project);
        Ok(())
    }

    /// Fetch a project from `backend` and open it.
    pub fn load_from_backend(
        &mut self,
        backend: &mut dyn SceneBackend,
        project_id: &str,
    ) -> EditorResult<()> {
        let doc = backend.fetch_project(project_id)?;
        self.load_project(doc)
    }

    /// Clear scenes, selection, overlay and cursor (project switch).
    ///
    /// Unsaved and in-flight saves of the previous project are discarded; call
    /// [`EditorContext::flush`] first to keep them.
    pub fn reset(&mut self) {
        self.autosave.clear();
        self.scenes.reset();
        self.overlay.hide_overlay();
        self.playback.reset();
        self.project = None;
    }

    /// Detach the player, stop listening for keys and discard outstanding save results.
    pub fn teardown(&mut self) {
        if self.autosave.is_torn_down() {
            return;
        }
        self.bridge.detach();
        self.keyboard.unmount();
        self.overlay.hide_overlay();
        self.autosave.teardown();
        info!("editor context torn down");
    }

    pub fn add_scene(&mut self, template: Option<&SceneTemplate>) -> Option<SceneId> {
        let id = self.scenes.add_scene(template);
        self.commit_changes(Instant::now());
        id
    }

    pub fn update_scene(&mut self, id: &str, patch: ScenePatch) -> bool {
        let changed = self.scenes.update_scene(id, patch);
        self.commit_changes(Instant::now());
        changed
    }

    pub fn delete_scene(&mut self, id: &str) -> bool {
        let closes_overlay = self
            .overlay
            .visible_overlay_id()
            .is_some_and(|oid| self.scenes.scene(id).is_some_and(|s| s.component(oid).is_some()));
        let deleted = self.scenes.delete_scene(id);
        if deleted {
            if closes_overlay {
                self.overlay.hide_overlay();
            }
            self.autosave.forget(id);
            if self.playback.isolated_scene() == Some(id) {
                self.playback.isolate_scene(None, &self.scenes);
            }
        }
        self.commit_changes(Instant::now());
        deleted
    }

    pub fn restore_scene(&mut self, id: &str) -> bool {
        let restored = self.scenes.restore_scene(id);
        self.commit_changes(Instant::now());
        restored
    }

    pub fn duplicate_scene(&mut self, id: &str) -> Option<SceneId> {
        let copy = self.scenes.duplicate_scene(id);
        self.commit_changes(Instant::now());
        copy
    }

    /// Move a scene to `to_index` on the timeline.
    pub fn move_scene(&mut self, id: &str, to_index: usize) -> bool {
        let moved = self.scenes.move_scene(id, to_index);
        self.commit_changes(Instant::now());
        moved
    }

    pub fn select_scene(&mut self, id: Option<&str>) {
        self.scenes.select_scene(id);
    }

    pub fn select_component(&mut self, id: Option<&str>) {
        self.scenes.select_component(id);
    }

    /// Add a component to the selected scene.
    pub fn add_component(&mut self, draft: ComponentDraft) -> EditorResult<Option<ComponentId>> {
        let id = self.scenes.add_component(draft)?;
        self.commit_changes(Instant::now());
        Ok(id)
    }

    pub fn add_component_to_scene(
        &mut self,
        scene_id: &str,
        draft: ComponentDraft,
    ) -> EditorResult<Option<ComponentId>> {
        let id = self.scenes.add_component_to_scene(scene_id, draft)?;
        self.commit_changes(Instant::now());
        Ok(id)
    }

    pub fn update_component_property(
        &mut self,
        component_id: &str,
        property: ComponentProperty,
    ) -> EditorResult<bool> {
        let applied = self
            .scenes
            .update_component_property(component_id, property)?;
        self.commit_changes(Instant::now());
        Ok(applied)
    }

    pub fn move_component(&mut self, component_id: &str, to_index: usize) -> bool {
        let moved = self.scenes.move_component(component_id, to_index);
        self.commit_changes(Instant::now());
        moved
    }

    /// Delete the selected component, closing its overlay if open.
    pub fn delete_selected_component(&mut self) -> Option<ComponentId> {
        let deleted = self.scenes.delete_selected_component();
        self.after_component_delete(deleted.as_deref());
        deleted
    }

    /// Open the overlay on a component from the store. Unknown ids are a no-op.
    pub fn show_overlay(&mut self, component_id: &str) -> bool {
        let Some((_, component)) = self.scenes.find_component(component_id) else {
            return false;
        };
        self.overlay.show_overlay(component);
        true
    }

    pub fn update_overlay_property(&mut self, property: ComponentProperty) -> EditorResult<bool> {
        self.overlay.update_overlay_property(property)
    }

    pub fn hide_overlay(&mut self) {
        self.overlay.hide_overlay();
    }

    /// Write the overlay's working copy back into the store. The overlay stays open.
    ///
    /// Returns `false` when no overlay is open or its component has since been deleted.
    pub fn commit_overlay(&mut self) -> bool {
        let Some(copy) = self.overlay.take_commit() else {
            return false;
        };
        let committed = self.scenes.replace_component(copy);
        if committed {
            // Re-snapshot so the working copy reflects clamping done by the store.
            if let Some(id) = self.overlay.visible_overlay_id().map(str::to_string)
                && let Some((_, stored)) = self.scenes.find_component(&id)
            {
                self.overlay.show_overlay(stored);
            }
        }
        self.commit_changes(Instant::now());
        committed
    }

    /// Route a global key press. Only active while mounted.
    pub fn handle_key(&mut self, event: &KeyEvent) -> KeyOutcome {
        let outcome = self.keyboard.handle(event, &mut self.scenes);
        self.after_component_delete(outcome.deleted.as_deref());
        outcome
    }

    /// Attach a player for this mount cycle, returning the one it replaces.
    pub fn attach_player(&mut self, player: Box<dyn Player>) -> Option<Box<dyn Player>> {
        self.playback.sync_duration(&self.scenes);
        self.bridge.attach(player, &mut self.playback)
    }

    pub fn detach_player(&mut self) -> Option<Box<dyn Player>> {
        self.bridge.detach()
    }

    pub fn seek(&mut self, frame: FrameIndex) -> FrameIndex {
        self.bridge.seek(frame, &mut self.playback)
    }

    pub fn scrub_to_pixel(&mut self, x: f64) -> FrameIndex {
        self.bridge.scrub_to_pixel(x, &mut self.playback)
    }

    pub fn resize_container(&mut self, width: f64) {
        self.playback.set_container_width(width);
    }

    /// Preview one scene alone (`Some`) or the whole timeline (`None`).
    pub fn isolate_scene(&mut self, scene_id: Option<&str>) {
        self.playback
            .isolate_scene(scene_id.map(str::to_string), &self.scenes);
    }

    /// Topmost component of a scene under a canvas point at a scene-local frame.
    ///
    /// Points outside the configured canvas never hit anything.
    pub fn component_at(
        &self,
        scene_id: &str,
        frame: FrameIndex,
        point: Point,
    ) -> Option<&SceneComponent> {
        if !self.config.canvas.bounds().contains(point) {
            return None;
        }
        self.scenes.component_at(scene_id, frame, point)
    }

    /// Frame under `x` at the fixed pixels-per-second reference scale.
    pub fn timeline_frame_at_x(&self, x: f64) -> FrameIndex {
        let fps = self.config.fps;
        let duration_secs = fps.frames_to_secs(self.playback.duration_in_frames());
        frame_from_pixel_x(x, duration_secs, fps, self.config.pixels_per_second)
    }

    /// Width in pixels of one frame at the reference scale.
    pub fn reference_pixels_per_frame(&self) -> f64 {
        reference_pixels_per_frame(self.config.fps, self.config.pixels_per_second)
    }

    /// Apply queued player events and perform due saves.
    pub fn tick(&mut self, now: Instant, backend: &mut dyn SceneBackend) -> TickReport {
        let events_applied = self.bridge.pump(&mut self.playback, &self.scenes);
        let saves_issued = self.autosave.run_due(now, backend);
        TickReport {
            events_applied,
            saves_issued,
        }
    }

    /// Perform every pending save now, ignoring debounce.
    pub fn flush(&mut self, backend: &mut dyn SceneBackend) -> usize {
        self.autosave.flush_with(backend)
    }

    /// Hand scenes mutated since the last call to the auto-save coordinator.
    pub fn commit_changes(&mut self, now: Instant) {
        self.playback.sync_duration(&self.scenes);
        if self.scenes.take_order_dirty()
            && let Some(project) = &self.project
        {
            let ids = self.scenes.scenes().iter().map(|s| s.id.clone()).collect();
            self.autosave.record_order(&project.id, ids, now);
        }
        let dirty = self.scenes.take_dirty();
        if dirty.is_empty() {
            return;
        }
        for id in &dirty {
            if let Some(scene) = self.scenes.scene(id) {
                self.autosave.record(scene, now);
            }
        }
        debug!(scenes = dirty.len(), "changes recorded for auto-save");
    }

    fn after_component_delete(&mut self, deleted: Option<&str>) {
        if let Some(id) = deleted
            && self.overlay.visible_overlay_id() == Some(id)
        {
            self.overlay.hide_overlay();
        }
        self.commit_changes(Instant::now());
    }
}

impl Drop for EditorContext {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/editor/context.rs"]
mod tests;
