//! Debounced, coalescing auto-save of edited scenes.
//!
//! `AutoSaveCoordinator` owns no thread or timer. The host records edits, polls with the current
//! time and performs the returned [`SaveRequest`]s however it likes (blocking or awaited),
//! reporting each outcome back through [`AutoSaveCoordinator::complete`].
//!
//! Each scene, plus the project's scene list, has one pending slot holding the latest unsaved
//! state and at most one request in flight. Edits arriving while a save is in flight overwrite the
//! slot, so exactly one follow-up save carrying the newest state is issued once the in-flight save
//! completes.

use std::{
    collections::BTreeMap,
    time::{Duration, Instant},
};

use tracing::{debug, info, warn};

use crate::{
    composition::model::{Scene, SceneId},
    foundation::error::EditorResult,
    persist::backend::SceneBackend,
};

/// Default debounce window.
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Identifies one issued save.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SaveTicket(u64);

/// What an issued save must write.
#[derive(Clone, Debug, PartialEq)]
pub enum SaveTarget {
    /// Upsert one scene with its components.
    Scene {
        /// Snapshot to persist.
        scene: Scene,
        /// Whether the script text differs from the last successfully saved one.
        script_changed: bool,
    },
    /// Replace the project's scene list. Scenes missing from it were deleted.
    SceneOrder {
        /// Owning project.
        project_id: String,
        /// Live scenes in timeline order.
        scene_ids: Vec<SceneId>,
    },
}

/// A save the host must perform. Requests returned by one poll are performed in order.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveRequest {
    /// Ticket to report back to [`AutoSaveCoordinator::complete`].
    pub ticket: SaveTicket,
    /// Data to persist.
    pub target: SaveTarget,
}

impl SaveRequest {
    /// The scene snapshot, for scene saves.
    pub fn scene(&self) -> Option<&Scene> {
        match &self.target {
            SaveTarget::Scene { scene, .. } => Some(scene),
            SaveTarget::SceneOrder { .. } => None,
        }
    }

    fn key(&self) -> SlotKey {
        match &self.target {
            SaveTarget::Scene { scene, .. } => SlotKey::Scene(scene.id.clone()),
            SaveTarget::SceneOrder { .. } => SlotKey::Order,
        }
    }
}

/// User-visible report of a failed save. Local state is kept as-is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SaveNotice {
    /// Scene whose save failed; `None` for the scene list.
    pub scene_id: Option<SceneId>,
    /// Human-readable reason.
    pub message: String,
}

// Scene slots sort before the order slot, so content is written before the list referencing it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum SlotKey {
    Scene(SceneId),
    Order,
}

#[derive(Clone, Debug)]
enum Pending {
    Scene(Scene),
    Order {
        project_id: String,
        scene_ids: Vec<SceneId>,
    },
}

#[derive(Clone, Debug, Default)]
struct Slot {
    pending: Option<Pending>,
    due_at: Option<Instant>,
    in_flight: Option<SaveTicket>,
}

impl Slot {
    fn is_idle(&self) -> bool {
        self.pending.is_none() && self.in_flight.is_none()
    }
}

#[derive(Debug)]
pub struct AutoSaveCoordinator {
    debounce: Duration,
    slots: BTreeMap<SlotKey, Slot>,
    saved_scripts: BTreeMap<SceneId, String>,
    notices: Vec<SaveNotice>,
    next_ticket: u64,
    torn_down: bool,
}

impl Default for AutoSaveCoordinator {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DEBOUNCE_MS))
    }
}

impl AutoSaveCoordinator {
    pub fn new(debounce: Duration) -> Self {
        Self {
            debounce,
            slots: BTreeMap::new(),
            saved_scripts: BTreeMap::new(),
            notices: Vec::new(),
            next_ticket: 0,
            torn_down: false,
        }
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Remember the persisted script of a freshly loaded scene.
    pub fn mark_loaded(&mut self, scene: &Scene) {
        self.saved_scripts
            .insert(scene.id.clone(), scene.script.clone());
    }

    /// Record the latest committed state of a scene. Restarts that scene's debounce window.
    pub fn record(&mut self, scene: &Scene, now: Instant) {
        self.stage(SlotKey::Scene(scene.id.clone()), Pending::Scene(scene.clone()), now);
    }

    /// Record the latest scene list of a project after scenes were added, removed or reordered.
    pub fn record_order(&mut self, project_id: &str, scene_ids: Vec<SceneId>, now: Instant) {
        let pending = Pending::Order {
            project_id: project_id.to_string(),
            scene_ids,
        };
        self.stage(SlotKey::Order, pending, now);
    }

    fn stage(&mut self, key: SlotKey, pending: Pending, now: Instant) {
        if self.torn_down {
            return;
        }
        let slot = self.slots.entry(key).or_default();
        slot.pending = Some(pending);
        slot.due_at = Some(now + self.debounce);
    }

    /// Drop any pending (not in-flight) save for a scene, e.g. after it was deleted.
    pub fn forget(&mut self, scene_id: &str) {
        let key = SlotKey::Scene(scene_id.to_string());
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.pending = None;
            slot.due_at = None;
            if slot.is_idle() {
                self.slots.remove(&key);
            }
        }
    }

    /// Forget everything about the current project: pending saves, in-flight tickets, saved
    /// scripts and notices. Late completions of discarded tickets are ignored.
    pub fn clear(&mut self) {
        let dropped = self.slots.values().filter(|s| s.pending.is_some()).count();
        let in_flight = self.slots.values().filter(|s| s.in_flight.is_some()).count();
        self.slots.clear();
        self.saved_scripts.clear();
        self.notices.clear();
        if dropped > 0 || in_flight > 0 {
            info!(dropped, in_flight, "auto-save state cleared");
        }
    }

    /// Issue saves whose debounce window has elapsed and that have nothing in flight.
    pub fn poll(&mut self, now: Instant) -> Vec<SaveRequest> {
        self.issue(|slot| slot.due_at.is_some_and(|due| due <= now))
    }

    /// Issue every pending save immediately, ignoring debounce.
    pub fn flush(&mut self) -> Vec<SaveRequest> {
        self.issue(|_| true)
    }

    fn issue(&mut self, ready: impl Fn(&Slot) -> bool) -> Vec<SaveRequest> {
        if self.torn_down {
            return Vec::new();
        }
        // The scene list waits for scene saves issued by earlier polls.
        let scenes_in_flight = self
            .slots
            .iter()
            .any(|(k, s)| matches!(k, SlotKey::Scene(_)) && s.in_flight.is_some());
        let mut out = Vec::new();
        for (key, slot) in &mut self.slots {
            if slot.in_flight.is_some() || slot.pending.is_none() || !ready(&*slot) {
                continue;
            }
            if *key == SlotKey::Order && scenes_in_flight {
                continue;
            }
            let Some(pending) = slot.pending.take() else {
                continue;
            };
            slot.due_at = None;
            self.next_ticket += 1;
            let ticket = SaveTicket(self.next_ticket);
            slot.in_flight = Some(ticket);
            let target = match pending {
                Pending::Scene(scene) => SaveTarget::Scene {
                    script_changed: self.saved_scripts.get(&scene.id) != Some(&scene.script),
                    scene,
                },
                Pending::Order {
                    project_id,
                    scene_ids,
                } => SaveTarget::SceneOrder {
                    project_id,
                    scene_ids,
                },
            };
            debug!(?key, ?ticket, "save issued");
            out.push(SaveRequest { ticket, target });
        }
        out
    }

    /// Report the outcome of an issued save.
    ///
    /// Returns `false` when the ticket is unknown or the coordinator was torn down; the outcome is
    /// discarded in that case. Failures become [`SaveNotice`]s; no local state is rolled back.
    pub fn complete(&mut self, request: &SaveRequest, result: EditorResult<()>) -> bool {
        if self.torn_down {
            debug!(ticket = ?request.ticket, "save completed after teardown; discarded");
            return false;
        }
        let key = request.key();
        let Some(slot) = self.slots.get_mut(&key) else {
            return false;
        };
        if slot.in_flight != Some(request.ticket) {
            return false;
        }
        slot.in_flight = None;
        let scene_id = request.scene().map(|s| s.id.clone());
        match result {
            Ok(()) => {
                if let Some(scene) = request.scene() {
                    self.saved_scripts
                        .insert(scene.id.clone(), scene.script.clone());
                }
                debug!(?key, ticket = ?request.ticket, "save completed");
            }
            Err(e) => {
                warn!(?key, error = %e, "save failed");
                self.notices.push(SaveNotice {
                    scene_id,
                    message: e.to_string(),
                });
            }
        }
        if slot.is_idle() {
            self.slots.remove(&key);
        }
        true
    }

    /// Poll and perform due saves synchronously against `backend`. Returns how many were issued.
    pub fn run_due(&mut self, now: Instant, backend: &mut dyn SceneBackend) -> usize {
        let requests = self.poll(now);
        self.perform(requests, backend)
    }

    /// Flush and perform every pending save synchronously against `backend`.
    pub fn flush_with(&mut self, backend: &mut dyn SceneBackend) -> usize {
        let requests = self.flush();
        self.perform(requests, backend)
    }

    fn perform(&mut self, requests: Vec<SaveRequest>, backend: &mut dyn SceneBackend) -> usize {
        let n = requests.len();
        for req in requests {
            let result = match &req.target {
                SaveTarget::Scene {
                    scene,
                    script_changed,
                } => backend.update_scene(scene).and_then(|()| {
                    if *script_changed {
                        backend.update_scene_script(&scene.id, &scene.script)
                    } else {
                        Ok(())
                    }
                }),
                SaveTarget::SceneOrder {
                    project_id,
                    scene_ids,
                } => backend.update_project_scenes(project_id, scene_ids),
            };
            self.complete(&req, result);
        }
        n
    }

    /// Whether any save is in flight ("Saving…").
    pub fn is_updating(&self) -> bool {
        self.slots.values().any(|s| s.in_flight.is_some())
    }

    /// Whether any edit has not been issued yet.
    pub fn has_pending(&self) -> bool {
        self.slots.values().any(|s| s.pending.is_some())
    }

    /// Earliest debounce deadline among pending edits, for scheduling the next poll.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.values().filter_map(|s| s.due_at).min()
    }

    /// Take failure notices accumulated since the last call.
    pub fn take_notices(&mut self) -> Vec<SaveNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Stop issuing saves and discard the results of any still in flight.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        let dropped = self.slots.values().filter(|s| s.pending.is_some()).count();
        self.slots.clear();
        self.notices.clear();
        self.torn_down = true;
        info!(dropped, "auto-save coordinator torn down");
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }
}

#[cfg(test)]
#[path = "../../tests/unit/persist/autosave.rs"]
mod tests;
