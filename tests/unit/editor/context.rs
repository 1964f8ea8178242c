use std::{cell::RefCell, rc::Rc, time::Duration};

use super::*;
use crate::{
    bridge::player::{PlayerEvent, PlayerEvents},
    composition::{
        dsl::TemplateBuilder,
        model::{ComponentKind, Scene},
    },
    foundation::error::{EditorError, Precondition},
    input::keyboard::{FocusTarget, Key},
    persist::backend::SceneScript,
};

#[derive(Default)]
struct MemoryBackend {
    doc: Option<ProjectDocument>,
    saved: Vec<Scene>,
    orders: Vec<(String, Vec<SceneId>)>,
}

impl SceneBackend for MemoryBackend {
    fn fetch_project(&mut self, project_id: &str) -> EditorResult<ProjectDocument> {
        self.doc
            .clone()
            .filter(|d| d.project.id == project_id)
            .ok_or_else(|| EditorError::persistence(format!("project '{project_id}' not found")))
    }

    fn fetch_project_scripts(&mut self, _project_id: &str) -> EditorResult<Vec<SceneScript>> {
        Ok(Vec::new())
    }

    fn update_scene_script(&mut self, _scene_id: &str, _text: &str) -> EditorResult<()> {
        Ok(())
    }

    fn update_scene(&mut self, scene: &Scene) -> EditorResult<()> {
        self.saved.push(scene.clone());
        Ok(())
    }

    fn update_project_scenes(
        &mut self,
        project_id: &str,
        scene_ids: &[SceneId],
    ) -> EditorResult<()> {
        self.orders.push((project_id.to_string(), scene_ids.to_vec()));
        Ok(())
    }
}

#[derive(Clone, Default)]
struct FakePlayer(Rc<RefCell<(Option<PlayerEvents>, Vec<FrameIndex>)>>);

impl FakePlayer {
    fn emit(&self, event: PlayerEvent) {
        if let Some(tx) = self.0.borrow().0.as_ref() {
            tx.emit(event);
        }
    }
}

impl Player for FakePlayer {
    fn current_frame(&self) -> FrameIndex {
        FrameIndex::ZERO
    }

    fn seek(&mut self, frame: FrameIndex) {
        self.0.borrow_mut().1.push(frame);
    }

    fn subscribe(&mut self, events: PlayerEvents) {
        self.0.borrow_mut().0 = Some(events);
    }

    fn unsubscribe(&mut self) {
        self.0.borrow_mut().0 = None;
    }
}

fn later() -> Instant {
    Instant::now() + Duration::from_secs(5)
}

fn editor_with_text(duration: u64) -> (EditorContext, SceneId, ComponentId) {
    let mut ed = EditorContext::create(EditorConfig::default()).unwrap();
    let t = TemplateBuilder::new("Intro", duration).build().unwrap();
    let sid = ed.add_scene(Some(&t)).unwrap();
    ed.select_scene(Some(sid.as_str()));
    let cid = ed
        .add_component(ComponentDraft::text("hello", duration))
        .unwrap()
        .unwrap();
    (ed, sid, cid)
}

fn blank_scene(id: &str, duration: u64) -> Scene {
    Scene {
        id: id.to_string(),
        title: format!("Scene {id}"),
        duration_in_frames: duration,
        components: vec![],
        script: String::new(),
    }
}

fn project_doc(id: &str, scenes: Vec<Scene>) -> ProjectDocument {
    ProjectDocument {
        project: Project {
            id: id.to_string(),
            name: "Demo".to_string(),
            scene_ids: scenes.iter().map(|s| s.id.clone()).collect(),
            ..Project::default()
        },
        scenes,
    }
}

fn text_of(ed: &EditorContext, cid: &str) -> String {
    match &ed.scenes().find_component(cid).unwrap().1.kind {
        ComponentKind::Text(t) => t.text.clone(),
        ComponentKind::Media(_) => panic!("expected text"),
    }
}

#[test]
fn create_rejects_invalid_config_and_mounts_keyboard() {
    let bad = EditorConfig {
        pixels_per_second: 0.0,
        ..EditorConfig::default()
    };
    assert!(EditorContext::create(bad).is_err());
    let ed = EditorContext::create(EditorConfig::default()).unwrap();
    assert!(ed.keyboard().is_mounted());
    assert!(ed.project().is_none());
}

#[test]
fn overlay_hidden_without_commit_leaves_store_untouched() {
    let (mut ed, _, cid) = editor_with_text(60);
    let mut backend = MemoryBackend::default();
    ed.flush(&mut backend);
    let saves_before = backend.saved.len();

    assert!(ed.show_overlay(&cid));
    ed.update_overlay_property(ComponentProperty::Text("draft".to_string()))
        .unwrap();
    ed.hide_overlay();

    assert_eq!(text_of(&ed, &cid), "hello");
    assert_eq!(ed.tick(later(), &mut backend).saves_issued, 0);
    assert_eq!(backend.saved.len(), saves_before);
}

#[test]
fn commit_overlay_writes_clamped_copy_back() {
    let (mut ed, _, cid) = editor_with_text(60);
    ed.show_overlay(&cid);
    ed.update_overlay_property(ComponentProperty::Text("final".to_string()))
        .unwrap();
    ed.update_overlay_property(ComponentProperty::To(500)).unwrap();
    assert!(ed.commit_overlay());

    assert_eq!(text_of(&ed, &cid), "final");
    assert_eq!(ed.scenes().find_component(&cid).unwrap().1.to, 60);
    assert_eq!(ed.overlay().overlay_data().unwrap().to, 60);
    assert!(!ed.overlay().has_pending_edits());
}

#[test]
fn delete_key_closes_overlay_of_deleted_component() {
    let (mut ed, _, cid) = editor_with_text(60);
    ed.select_component(Some(cid.as_str()));
    ed.show_overlay(&cid);

    let out = ed.handle_key(&KeyEvent::new(Key::Delete, FocusTarget::Body));
    assert_eq!(out.deleted, Some(cid.clone()));
    assert_eq!(ed.overlay().visible_overlay_id(), None);
    assert!(!ed.commit_overlay());
}

#[test]
fn backspace_in_text_field_keeps_component() {
    let (mut ed, _, cid) = editor_with_text(60);
    ed.select_component(Some(cid.as_str()));
    let out = ed.handle_key(&KeyEvent::new(Key::Backspace, FocusTarget::TextInput));
    assert!(!out.prevent_default);
    assert!(ed.scenes().find_component(&cid).is_some());
}

#[test]
fn rapid_edits_produce_one_save_with_final_state() {
    let (mut ed, sid, cid) = editor_with_text(60);
    let mut backend = MemoryBackend::default();
    for text in ["a", "ab", "abc"] {
        ed.update_component_property(&cid, ComponentProperty::Text(text.to_string()))
            .unwrap();
    }
    assert_eq!(ed.tick(Instant::now(), &mut backend).saves_issued, 0);

    let report = ed.tick(later(), &mut backend);
    assert_eq!(report.saves_issued, 1);
    assert_eq!(backend.saved.len(), 1);
    assert_eq!(backend.saved[0].id, sid);
    let ComponentKind::Text(t) = &backend.saved[0].components[0].kind else {
        panic!("expected text");
    };
    assert_eq!(t.text, "abc");
    assert!(!ed.is_updating());
    assert!(ed.take_notices().is_empty());
}

#[test]
fn add_component_without_selected_scene_fails() {
    let mut ed = EditorContext::create(EditorConfig::default()).unwrap();
    let t = TemplateBuilder::new("s", 30).build().unwrap();
    ed.add_scene(Some(&t)).unwrap();
    let err = ed.add_component(ComponentDraft::text("x", 10)).unwrap_err();
    assert_eq!(err.precondition(), Some(&Precondition::NoSceneSelected));
}

#[test]
fn shrinking_scene_updates_playback_duration_and_components() {
    let (mut ed, sid, cid) = editor_with_text(150);
    assert_eq!(ed.playback().duration_in_frames(), 150);
    ed.update_scene(
        &sid,
        ScenePatch {
            duration_in_frames: Some(90),
            ..ScenePatch::default()
        },
    );
    assert_eq!(ed.playback().duration_in_frames(), 90);
    assert_eq!(ed.scenes().find_component(&cid).unwrap().1.to, 90);
}

#[test]
fn deleting_scene_clears_overlay_isolation_and_pending_save() {
    let (mut ed, sid, cid) = editor_with_text(60);
    let t = TemplateBuilder::new("Outro", 30).build().unwrap();
    ed.add_scene(Some(&t)).unwrap();
    ed.show_overlay(&cid);
    ed.isolate_scene(Some(sid.as_str()));
    assert_eq!(ed.playback().duration_in_frames(), 60);

    assert!(ed.delete_scene(&sid));
    assert_eq!(ed.overlay().visible_overlay_id(), None);
    assert_eq!(ed.playback().isolated_scene(), None);
    assert_eq!(ed.playback().duration_in_frames(), 30);

    let mut backend = MemoryBackend::default();
    ed.tick(later(), &mut backend);
    assert!(backend.saved.iter().all(|s| s.id != sid));

    assert!(ed.restore_scene(&sid));
    assert_eq!(ed.playback().duration_in_frames(), 90);
}

#[test]
fn player_events_flow_through_tick() {
    let (mut ed, _, _) = editor_with_text(120);
    let player = FakePlayer::default();
    assert!(ed.attach_player(Box::new(player.clone())).is_none());

    player.emit(PlayerEvent::Play);
    player.emit(PlayerEvent::FrameUpdate(FrameIndex(42)));
    let report = ed.tick(Instant::now(), &mut MemoryBackend::default());
    assert_eq!(report.events_applied, 2);
    assert_eq!(ed.playback().frame(), FrameIndex(42));
    assert!(ed.playback().is_playing());
    assert!(player.0.borrow().1.is_empty());

    assert_eq!(ed.seek(FrameIndex(10)), FrameIndex(10));
    assert_eq!(player.0.borrow().1, vec![FrameIndex(10)]);
    assert!(!ed.playback().animations_enabled());
}

#[test]
fn timeline_reference_scale_maps_pixels_to_frames() {
    let (ed, _, _) = editor_with_text(90);
    assert!((ed.reference_pixels_per_frame() - 100.0 / 30.0).abs() < 1e-9);
    assert_eq!(ed.timeline_frame_at_x(110.0), FrameIndex(33));
    assert_eq!(ed.timeline_frame_at_x(-4.0), FrameIndex::ZERO);
    assert_eq!(ed.timeline_frame_at_x(1.0e6), FrameIndex(90));
}

#[test]
fn scrub_uses_container_scale() {
    let (mut ed, _, _) = editor_with_text(100);
    ed.resize_container(402.0);
    assert_eq!(ed.scrub_to_pixel(200.0), FrameIndex(50));
    assert_eq!(ed.playback().frame(), FrameIndex(50));
}

#[test]
fn load_project_replaces_state_and_rejects_invalid_documents() {
    let (mut source, _, _) = editor_with_text(60);
    let scenes = source.scenes().scenes().to_vec();
    source.teardown();
    let doc = ProjectDocument {
        project: Project {
            id: "p1".to_string(),
            name: "Demo".to_string(),
            scene_ids: scenes.iter().map(|s| s.id.clone()).collect(),
            ..Project::default()
        },
        scenes,
    };

    let mut backend = MemoryBackend {
        doc: Some(doc.clone()),
        ..MemoryBackend::default()
    };
    let mut ed = EditorContext::create(EditorConfig::default()).unwrap();
    ed.load_from_backend(&mut backend, "p1").unwrap();
    assert_eq!(ed.scenes().scenes().len(), 1);
    assert_eq!(ed.playback().duration_in_frames(), 60);
    assert_eq!(ed.document().unwrap(), doc);
    assert_eq!(ed.tick(later(), &mut backend).saves_issued, 0);

    assert!(ed.load_from_backend(&mut backend, "p2").is_err());
    let mut broken = doc;
    broken.scenes[0].duration_in_frames = 0;
    assert!(ed.load_project(broken).is_err());
    assert_eq!(ed.scenes().scenes().len(), 1);
}

#[test]
fn teardown_detaches_and_stops_everything() {
    let (mut ed, _, cid) = editor_with_text(60);
    let player = FakePlayer::default();
    ed.attach_player(Box::new(player.clone()));
    ed.update_component_property(&cid, ComponentProperty::Left(4.0))
        .unwrap();

    ed.teardown();
    ed.teardown();
    assert!(player.0.borrow().0.is_none());
    assert!(!ed.keyboard().is_mounted());
    let mut backend = MemoryBackend::default();
    assert_eq!(ed.tick(later(), &mut backend).saves_issued, 0);
    assert!(backend.saved.is_empty());
}

#[test]
fn switching_projects_discards_unsaved_edits_of_previous_project() {
    let (mut ed, sid, cid) = editor_with_text(60);
    assert_eq!(sid, "scene-1");
    ed.update_component_property(&cid, ComponentProperty::Text("project a".to_string()))
        .unwrap();

    let other = project_doc("p2", vec![blank_scene("scene-1", 30)]);
    ed.load_project(other.clone()).unwrap();

    let mut backend = MemoryBackend::default();
    assert_eq!(ed.tick(later(), &mut backend).saves_issued, 0);
    assert_eq!(ed.flush(&mut backend), 0);
    assert!(backend.saved.is_empty());
    assert!(backend.orders.is_empty());
    assert!(!ed.is_updating());
    assert_eq!(ed.document().unwrap(), other);
}

#[test]
fn scene_list_edits_save_project_order_after_scene_content() {
    let mut ed = EditorContext::create(EditorConfig::default()).unwrap();
    ed.load_project(project_doc(
        "p1",
        vec![blank_scene("scene-1", 30), blank_scene("scene-2", 30)],
    ))
    .unwrap();

    let copy = ed.duplicate_scene("scene-1").unwrap();
    assert!(ed.delete_scene("scene-2"));
    assert!(ed.move_scene(&copy, 0));
    assert_eq!(ed.playback().duration_in_frames(), 60);

    let mut backend = MemoryBackend::default();
    assert_eq!(ed.tick(later(), &mut backend).saves_issued, 2);
    assert_eq!(backend.saved.len(), 1);
    assert_eq!(backend.saved[0].id, copy);
    assert_eq!(
        backend.orders,
        vec![("p1".to_string(), vec![copy.clone(), "scene-1".to_string()])]
    );

    assert!(ed.restore_scene("scene-2"));
    assert_eq!(ed.flush(&mut backend), 2);
    assert_eq!(backend.saved.last().unwrap().id, "scene-2");
    assert_eq!(backend.orders.last().unwrap().1, vec![copy, "scene-1".into(), "scene-2".into()]);
}

#[test]
fn scene_list_edits_without_project_are_not_ordered() {
    let (mut ed, sid, _) = editor_with_text(30);
    ed.duplicate_scene(&sid).unwrap();
    let mut backend = MemoryBackend::default();
    ed.flush(&mut backend);
    assert!(backend.orders.is_empty());
}

#[test]
fn hit_testing_is_limited_to_canvas() {
    let (mut ed, sid, cid) = editor_with_text(60);
    for property in [
        ComponentProperty::Left(1800.0),
        ComponentProperty::Top(0.0),
        ComponentProperty::Width(400.0),
        ComponentProperty::Height(100.0),
    ] {
        ed.update_component_property(&cid, property).unwrap();
    }

    let hit = ed.component_at(&sid, FrameIndex(10), Point::new(1900.0, 50.0));
    assert_eq!(hit.map(|c| c.id.as_str()), Some(cid.as_str()));
    assert!(ed.component_at(&sid, FrameIndex(10), Point::new(2100.0, 50.0)).is_none());
    assert!(ed.component_at(&sid, FrameIndex(10), Point::new(1900.0, -5.0)).is_none());
}
