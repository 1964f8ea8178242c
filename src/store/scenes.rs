//! Ordered scene list, per-scene components and the single selection.
//!
//! Every mutator keeps `0 <= from < to <= duration_in_frames` for each component by clamping.
//! Operations that target an id that no longer exists are silent no-ops: UI events routinely race
//! deletions.

use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    composition::{
        model::{ComponentDraft, ComponentId, Scene, SceneComponent, SceneId, SceneTemplate},
        property::ComponentProperty,
    },
    foundation::{
        coords::pixel_x_from_frame,
        core::{FrameIndex, Point},
        error::{EditorResult, Precondition},
        ids::IdGen,
    },
};

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Partial update applied by [`SceneStore::update_scene`].
pub struct ScenePatch {
    /// New title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// New duration; clamped to `>= 1`, contained components are truncated to fit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_in_frames: Option<u64>,
    /// New narration script.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
/// Horizontal extent of one scene on the timeline.
pub struct SceneBlock {
    /// Scene identifier.
    pub scene_id: SceneId,
    /// First frame of the scene on the combined timeline.
    pub start: FrameIndex,
    /// Left edge in pixels.
    pub x: f64,
    /// Width in pixels.
    pub width: f64,
}

/// Owner of the scene list and selection ids.
#[derive(Clone, Debug, Default)]
pub struct SceneStore {
    scenes: Vec<Scene>,
    trash: Vec<Scene>,
    selected_scene_id: Option<SceneId>,
    selected_object_id: Option<ComponentId>,
    ids: IdGen,
    dirty: BTreeSet<SceneId>,
    order_dirty: bool,
}

impl SceneStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all scenes with a loaded set.
    ///
    /// Components are clamped; selection and trash are cleared.
    pub fn load(&mut self, scenes: Vec<Scene>) {
        self.reset();
        for mut scene in scenes {
            self.ids.observe(&scene.id);
            scene.duration_in_frames = scene.duration_in_frames.max(1);
            for c in &mut scene.components {
                self.ids.observe(&c.id);
                c.clamp_to(scene.duration_in_frames);
            }
            self.scenes.push(scene);
        }
        debug!(scenes = self.scenes.len(), "scenes loaded");
    }

    /// Drop all scenes, trash and selection.
    pub fn reset(&mut self) {
        self.scenes.clear();
        self.trash.clear();
        self.selected_scene_id = None;
        self.selected_object_id = None;
        self.dirty.clear();
        self.order_dirty = false;
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// Soft-deleted scenes, most recent last.
    pub fn trash(&self) -> &[Scene] {
        &self.trash
    }

    pub fn selected_scene_id(&self) -> Option<&str> {
        self.selected_scene_id.as_deref()
    }

    pub fn selected_object_id(&self) -> Option<&str> {
        self.selected_object_id.as_deref()
    }

    /// The selected component together with its owning scene.
    pub fn selected_component(&self) -> Option<(&Scene, &SceneComponent)> {
        let id = self.selected_object_id.as_deref()?;
        self.find_component(id)
    }

    /// Find a component anywhere in the project together with its owning scene.
    pub fn find_component(&self, id: &str) -> Option<(&Scene, &SceneComponent)> {
        let (si, ci) = self.locate(id)?;
        let scene = &self.scenes[si];
        Some((scene, &scene.components[ci]))
    }

    /// Append a scene instantiated from `template`. `None` is a no-op.
    pub fn add_scene(&mut self, template: Option<&SceneTemplate>) -> Option<SceneId> {
        let template = template?;
        let id = self.ids.next("scene");
        let duration = template.duration_in_frames.max(1);
        let components = template
            .components
            .iter()
            .cloned()
            .map(|draft| self.instantiate(draft, duration))
            .collect();
        self.scenes.push(Scene {
            id: id.clone(),
            title: template.title.clone(),
            duration_in_frames: duration,
            components,
            script: template.script.clone(),
        });
        self.dirty.insert(id.clone());
        self.order_dirty = true;
        debug!(scene = %id, "scene added");
        Some(id)
    }

    /// Merge title/duration/script changes. Returns `false` when the scene no longer exists.
    ///
    /// Shrinking the duration truncates every component that ends past the new duration; none are
    /// deleted.
    pub fn update_scene(&mut self, id: &str, patch: ScenePatch) -> bool {
        let Some(scene) = self.scenes.iter_mut().find(|s| s.id == id) else {
            debug!(scene = %id, "update_scene on missing scene ignored");
            return false;
        };
        if let Some(title) = patch.title {
            scene.title = title;
        }
        if let Some(script) = patch.script {
            scene.script = script;
        }
        if let Some(duration) = patch.duration_in_frames {
            scene.duration_in_frames = duration.max(1);
            let mut truncated = 0usize;
            for c in &mut scene.components {
                if c.clamp_to(scene.duration_in_frames) {
                    truncated += 1;
                }
            }
            if truncated > 0 {
                debug!(scene = %id, truncated, "components clamped to new scene duration");
            }
        }
        self.dirty.insert(scene.id.clone());
        true
    }

    /// Move a scene to the trash. Clears any selection that pointed into it.
    pub fn delete_scene(&mut self, id: &str) -> bool {
        let Some(idx) = self.scenes.iter().position(|s| s.id == id) else {
            return false;
        };
        let scene = self.scenes.remove(idx);
        if self.selected_scene_id.as_deref() == Some(id) {
            self.selected_scene_id = None;
        }
        let owned_selection = self
            .selected_object_id
            .as_deref()
            .is_some_and(|obj| scene.component(obj).is_some());
        if owned_selection {
            self.selected_object_id = None;
        }
        self.dirty.remove(id);
        self.order_dirty = true;
        debug!(scene = %id, "scene moved to trash");
        self.trash.push(scene);
        true
    }

    /// Bring a trashed scene back to the end of the timeline.
    pub fn restore_scene(&mut self, id: &str) -> bool {
        let Some(idx) = self.trash.iter().position(|s| s.id == id) else {
            return false;
        };
        let scene = self.trash.remove(idx);
        self.dirty.insert(scene.id.clone());
        self.order_dirty = true;
        self.scenes.push(scene);
        true
    }

    /// Permanently drop trashed scenes. Returns how many were dropped.
    pub fn empty_trash(&mut self) -> usize {
        let n = self.trash.len();
        self.trash.clear();
        n
    }

    /// Clone a scene with fresh ids and insert it right after the source.
    pub fn duplicate_scene(&mut self, id: &str) -> Option<SceneId> {
        let idx = self.scenes.iter().position(|s| s.id == id)?;
        let mut copy = self.scenes[idx].clone();
        copy.id = self.ids.next("scene");
        for c in &mut copy.components {
            c.id = self.ids.next("cmp");
        }
        let new_id = copy.id.clone();
        self.scenes.insert(idx + 1, copy);
        self.dirty.insert(new_id.clone());
        self.order_dirty = true;
        Some(new_id)
    }

    /// Move a scene to `to_index` on the timeline (clamped to the last slot).
    pub fn move_scene(&mut self, id: &str, to_index: usize) -> bool {
        let Some(idx) = self.scenes.iter().position(|s| s.id == id) else {
            return false;
        };
        let scene = self.scenes.remove(idx);
        let to = to_index.min(self.scenes.len());
        self.scenes.insert(to, scene);
        self.order_dirty = true;
        true
    }

    /// Select a scene, or clear the scene selection with `None`. Unknown ids are ignored.
    pub fn select_scene(&mut self, id: Option<&str>) {
        match id {
            None => self.selected_scene_id = None,
            Some(id) if self.scene(id).is_some() => self.selected_scene_id = Some(id.to_string()),
            Some(id) => debug!(scene = %id, "select_scene on missing scene ignored"),
        }
    }

    /// Select a component anywhere in the project, or clear with `None`. Unknown ids are ignored.
    pub fn select_component(&mut self, id: Option<&str>) {
        match id {
            None => self.selected_object_id = None,
            Some(id) if self.locate(id).is_some() => {
                self.selected_object_id = Some(id.to_string())
            }
            Some(id) => debug!(component = %id, "select_component on missing component ignored"),
        }
    }

    /// Append a component to `scene_id`.
    ///
    /// Fails with [`Precondition::NoSceneSelected`] when no scene is selected. Returns `Ok(None)`
    /// when `scene_id` no longer exists.
    pub fn add_component_to_scene(
        &mut self,
        scene_id: &str,
        draft: ComponentDraft,
    ) -> EditorResult<Option<ComponentId>> {
        if self.selected_scene_id.is_none() {
            return Err(Precondition::NoSceneSelected.into());
        }
        let Some(idx) = self.scenes.iter().position(|s| s.id == scene_id) else {
            debug!(scene = %scene_id, "add_component_to_scene on missing scene ignored");
            return Ok(None);
        };
        let duration = self.scenes[idx].duration_in_frames;
        let component = self.instantiate(draft, duration);
        let id = component.id.clone();
        self.scenes[idx].components.push(component);
        self.dirty.insert(scene_id.to_string());
        debug!(scene = %scene_id, component = %id, "component added");
        Ok(Some(id))
    }

    /// Append a component to the selected scene.
    pub fn add_component(&mut self, draft: ComponentDraft) -> EditorResult<Option<ComponentId>> {
        let scene_id = self
            .selected_scene_id
            .clone()
            .ok_or(Precondition::NoSceneSelected)?;
        self.add_component_to_scene(&scene_id, draft)
    }

    /// Apply one typed property write. Missing components are a no-op (`Ok(false)`).
    ///
    /// A key that does not belong to the component's variant is rejected without mutation.
    pub fn update_component_property(
        &mut self,
        component_id: &str,
        property: ComponentProperty,
    ) -> EditorResult<bool> {
        let Some((si, ci)) = self.locate(component_id) else {
            debug!(component = %component_id, "property update on missing component ignored");
            return Ok(false);
        };
        let scene = &mut self.scenes[si];
        let mut updated = scene.components[ci].clone();
        property.apply(&mut updated)?;
        updated.clamp_to(scene.duration_in_frames);
        scene.components[ci] = updated;
        self.dirty.insert(scene.id.clone());
        Ok(true)
    }

    /// Overwrite a component with an edited copy carrying the same id. Missing ids are a no-op.
    pub fn replace_component(&mut self, mut component: SceneComponent) -> bool {
        let Some((si, ci)) = self.locate(&component.id) else {
            debug!(component = %component.id, "replace on missing component ignored");
            return false;
        };
        let scene = &mut self.scenes[si];
        component.clamp_to(scene.duration_in_frames);
        scene.components[ci] = component;
        self.dirty.insert(scene.id.clone());
        true
    }

    /// Remove the selected component and clear the selection. No-op when nothing is selected.
    pub fn delete_selected_component(&mut self) -> Option<ComponentId> {
        let id = self.selected_object_id.take()?;
        self.remove_component(&id).then_some(id)
    }

    /// Remove a component. The selection is cleared only if it pointed at this component.
    pub fn delete_component(&mut self, id: &str) -> bool {
        if self.selected_object_id.as_deref() == Some(id) {
            self.selected_object_id = None;
        }
        self.remove_component(id)
    }

    /// Move a component to `to_index` within its scene (clamped to the last slot).
    pub fn move_component(&mut self, id: &str, to_index: usize) -> bool {
        let Some((si, ci)) = self.locate(id) else {
            return false;
        };
        let scene = &mut self.scenes[si];
        let component = scene.components.remove(ci);
        let to = to_index.min(scene.components.len());
        scene.components.insert(to, component);
        self.dirty.insert(scene.id.clone());
        true
    }

    /// Sum of all scene durations.
    pub fn total_duration_in_frames(&self) -> u64 {
        self.scenes.iter().map(|s| s.duration_in_frames).sum()
    }

    /// First frame of a scene on the combined timeline.
    pub fn scene_start_frame(&self, id: &str) -> Option<FrameIndex> {
        let mut start = 0u64;
        for s in &self.scenes {
            if s.id == id {
                return Some(FrameIndex(start));
            }
            start += s.duration_in_frames;
        }
        None
    }

    /// The scene covering a combined-timeline frame and the scene-local frame.
    ///
    /// The final frame (`total`) maps to the last frame of the last scene.
    pub fn scene_at_frame(&self, frame: FrameIndex) -> Option<(&Scene, FrameIndex)> {
        let mut start = 0u64;
        for s in &self.scenes {
            let end = start + s.duration_in_frames;
            if frame.0 < end {
                return Some((s, FrameIndex(frame.0 - start)));
            }
            start = end;
        }
        let last = self.scenes.last()?;
        Some((last, FrameIndex(last.duration_in_frames - 1)))
    }

    /// Horizontal blocks for every scene, sized proportionally to duration.
    pub fn scene_blocks(&self, pixels_per_frame: f64) -> Vec<SceneBlock> {
        let mut start = 0u64;
        self.scenes
            .iter()
            .map(|s| {
                let block = SceneBlock {
                    scene_id: s.id.clone(),
                    start: FrameIndex(start),
                    x: pixel_x_from_frame(FrameIndex(start), pixels_per_frame),
                    width: pixel_x_from_frame(FrameIndex(s.duration_in_frames), pixels_per_frame),
                };
                start += s.duration_in_frames;
                block
            })
            .collect()
    }

    /// Topmost component of `scene_id` visible at a local frame whose box contains `point`.
    pub fn component_at(
        &self,
        scene_id: &str,
        frame: FrameIndex,
        point: Point,
    ) -> Option<&SceneComponent> {
        self.scene(scene_id)?
            .components
            .iter()
            .rev()
            .find(|c| c.is_visible_at(frame) && c.bounds().contains(point))
    }

    /// Scene ids mutated since the last call.
    pub fn take_dirty(&mut self) -> Vec<SceneId> {
        std::mem::take(&mut self.dirty).into_iter().collect()
    }

    /// Whether scenes were added, removed or reordered since the last call.
    pub fn take_order_dirty(&mut self) -> bool {
        std::mem::take(&mut self.order_dirty)
    }

    fn instantiate(&mut self, draft: ComponentDraft, duration: u64) -> SceneComponent {
        let mut component = SceneComponent::from_draft(self.ids.next("cmp"), draft);
        component.clamp_to(duration);
        component
    }

    fn locate(&self, component_id: &str) -> Option<(usize, usize)> {
        self.scenes.iter().enumerate().find_map(|(si, s)| {
            s.components
                .iter()
                .position(|c| c.id == component_id)
                .map(|ci| (si, ci))
        })
    }

    fn remove_component(&mut self, id: &str) -> bool {
        let Some((si, ci)) = self.locate(id) else {
            debug!(component = %id, "delete on missing component ignored");
            return false;
        };
        let scene = &mut self.scenes[si];
        scene.components.remove(ci);
        self.dirty.insert(scene.id.clone());
        debug!(component = %id, "component deleted");
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/scenes.rs"]
mod tests;
