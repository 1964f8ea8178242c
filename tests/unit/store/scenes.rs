use super::*;
use crate::composition::{
    dsl::TemplateBuilder,
    model::{ComponentKind, MediaKind},
};
use proptest::prelude::*;

fn template(duration: u64) -> SceneTemplate {
    TemplateBuilder::new("Intro", duration).build().unwrap()
}

fn store_with_scene(duration: u64) -> (SceneStore, SceneId) {
    let mut store = SceneStore::new();
    let id = store.add_scene(Some(&template(duration))).unwrap();
    store.select_scene(Some(id.as_str()));
    (store, id)
}

fn assert_invariants(store: &SceneStore) {
    for s in store.scenes() {
        assert!(s.duration_in_frames >= 1);
        for c in &s.components {
            assert!(c.from < c.to, "{} from {} to {}", c.id, c.from, c.to);
            assert!(c.to <= s.duration_in_frames);
        }
    }
}

#[test]
fn add_scene_without_template_is_noop() {
    let mut store = SceneStore::new();
    assert_eq!(store.add_scene(None), None);
    assert!(store.scenes().is_empty());
}

#[test]
fn add_scene_instantiates_template_components_with_fresh_ids() {
    let t = TemplateBuilder::new("Title", 60)
        .component(ComponentDraft::text("a", 60))
        .component(ComponentDraft::media(MediaKind::Image, "bg.png", 30))
        .build()
        .unwrap();
    let mut store = SceneStore::new();
    let a = store.add_scene(Some(&t)).unwrap();
    let b = store.add_scene(Some(&t)).unwrap();
    assert_ne!(a, b);
    let ids: BTreeSet<_> = store
        .scenes()
        .iter()
        .flat_map(|s| s.components.iter().map(|c| c.id.clone()))
        .collect();
    assert_eq!(ids.len(), 4);
}

#[test]
fn shrinking_duration_truncates_text_component() {
    let (mut store, sid) = store_with_scene(150);
    let cid = store
        .add_component_to_scene(&sid, ComponentDraft::text("hello", 150).range(0, 150))
        .unwrap()
        .unwrap();

    assert!(store.update_scene(
        &sid,
        ScenePatch {
            duration_in_frames: Some(90),
            ..ScenePatch::default()
        }
    ));
    let (scene, c) = store.find_component(&cid).unwrap();
    assert_eq!(scene.duration_in_frames, 90);
    assert_eq!(c.to, 90);
    assert_eq!(scene.components.len(), 1);
}

#[test]
fn duration_is_clamped_to_one_frame() {
    let (mut store, sid) = store_with_scene(30);
    store.add_component(ComponentDraft::text("t", 30)).unwrap();
    store.update_scene(
        &sid,
        ScenePatch {
            duration_in_frames: Some(0),
            title: Some("Short".to_string()),
            ..ScenePatch::default()
        },
    );
    let scene = store.scene(&sid).unwrap();
    assert_eq!(scene.duration_in_frames, 1);
    assert_eq!(scene.title, "Short");
    assert_eq!((scene.components[0].from, scene.components[0].to), (0, 1));
}

#[test]
fn add_component_requires_selected_scene() {
    let mut store = SceneStore::new();
    let sid = store.add_scene(Some(&template(30))).unwrap();
    let err = store
        .add_component_to_scene(&sid, ComponentDraft::text("t", 10))
        .unwrap_err();
    assert_eq!(err.precondition(), Some(&Precondition::NoSceneSelected));
    assert!(store.scene(&sid).unwrap().components.is_empty());
    assert!(store.add_component(ComponentDraft::text("t", 10)).is_err());
}

#[test]
fn add_component_clamps_out_of_range_draft() {
    let (mut store, sid) = store_with_scene(30);
    let cid = store
        .add_component_to_scene(&sid, ComponentDraft::text("t", 500).range(40, 500))
        .unwrap()
        .unwrap();
    let (_, c) = store.find_component(&cid).unwrap();
    assert_eq!((c.from, c.to), (29, 30));
}

#[test]
fn add_component_to_missing_scene_is_stale_noop() {
    let (mut store, _) = store_with_scene(30);
    assert_eq!(
        store
            .add_component_to_scene("scene-99", ComponentDraft::text("t", 10))
            .unwrap(),
        None
    );
}

#[test]
fn property_update_on_missing_component_is_noop() {
    let (mut store, _) = store_with_scene(30);
    assert!(!store
        .update_component_property("cmp-404", ComponentProperty::Left(1.0))
        .unwrap());
}

#[test]
fn property_update_is_clamped_and_typed() {
    let (mut store, _) = store_with_scene(30);
    let cid = store
        .add_component(ComponentDraft::text("t", 30))
        .unwrap()
        .unwrap();
    assert!(store
        .update_component_property(&cid, ComponentProperty::To(999))
        .unwrap());
    assert_eq!(store.find_component(&cid).unwrap().1.to, 30);

    let err = store
        .update_component_property(&cid, ComponentProperty::Src("x.mp4".to_string()))
        .unwrap_err();
    assert!(err.precondition().is_some());

    store
        .update_component_property(&cid, ComponentProperty::Text("changed".to_string()))
        .unwrap();
    let ComponentKind::Text(t) = &store.find_component(&cid).unwrap().1.kind else {
        panic!("expected text");
    };
    assert_eq!(t.text, "changed");
}

#[test]
fn deleting_selected_component_clears_selection() {
    let (mut store, _) = store_with_scene(30);
    let a = store.add_component(ComponentDraft::text("a", 30)).unwrap().unwrap();
    store.select_component(Some(a.as_str()));
    assert_eq!(store.delete_selected_component(), Some(a.clone()));
    assert_eq!(store.selected_object_id(), None);
    assert!(store.find_component(&a).is_none());
    assert_eq!(store.delete_selected_component(), None);
}

#[test]
fn deleting_unselected_component_keeps_selection() {
    let (mut store, _) = store_with_scene(30);
    let a = store.add_component(ComponentDraft::text("a", 30)).unwrap().unwrap();
    let b = store.add_component(ComponentDraft::text("b", 30)).unwrap().unwrap();
    store.select_component(Some(a.as_str()));
    assert!(store.delete_component(&b));
    assert_eq!(store.selected_object_id(), Some(a.as_str()));
}

#[test]
fn selecting_component_resolves_parent_without_scene_selection() {
    let (mut store, sid) = store_with_scene(30);
    let a = store.add_component(ComponentDraft::text("a", 30)).unwrap().unwrap();
    store.select_scene(None);
    store.select_component(Some(a.as_str()));
    let (scene, c) = store.selected_component().unwrap();
    assert_eq!(scene.id, sid);
    assert_eq!(c.id, a);
    assert_eq!(store.selected_scene_id(), None);

    store.select_component(Some("cmp-404"));
    assert_eq!(store.selected_object_id(), Some(a.as_str()));
}

#[test]
fn delete_scene_moves_to_trash_and_clears_selection() {
    let (mut store, sid) = store_with_scene(30);
    let a = store.add_component(ComponentDraft::text("a", 30)).unwrap().unwrap();
    store.select_component(Some(a.as_str()));
    assert!(store.delete_scene(&sid));
    assert_eq!(store.selected_scene_id(), None);
    assert_eq!(store.selected_object_id(), None);
    assert_eq!(store.trash().len(), 1);
    assert!(!store.delete_scene(&sid));

    assert!(store.restore_scene(&sid));
    assert!(store.scene(&sid).is_some());
    assert!(store.trash().is_empty());
    assert_eq!(store.empty_trash(), 0);
}

#[test]
fn duplicate_scene_gets_fresh_ids_after_source() {
    let (mut store, sid) = store_with_scene(30);
    let other = store.add_scene(Some(&template(10))).unwrap();
    let a = store.add_component(ComponentDraft::text("a", 30)).unwrap().unwrap();
    let copy = store.duplicate_scene(&sid).unwrap();
    let order: Vec<_> = store.scenes().iter().map(|s| s.id.clone()).collect();
    assert_eq!(order, vec![sid.clone(), copy.clone(), other]);
    let dup = store.scene(&copy).unwrap();
    assert_eq!(dup.components.len(), 1);
    assert_ne!(dup.components[0].id, a);
}

#[test]
fn move_component_reorders_within_scene() {
    let (mut store, sid) = store_with_scene(30);
    let a = store.add_component(ComponentDraft::text("a", 30)).unwrap().unwrap();
    let b = store.add_component(ComponentDraft::text("b", 30)).unwrap().unwrap();
    assert!(store.move_component(&b, 0));
    let ids: Vec<_> = store.scene(&sid).unwrap().components.iter().map(|c| c.id.clone()).collect();
    assert_eq!(ids, vec![b, a.clone()]);
    assert!(store.move_component(&a, 99));
    assert_eq!(store.scene(&sid).unwrap().components[1].id, a);
}

#[test]
fn timeline_queries_span_scenes() {
    let mut store = SceneStore::new();
    let a = store.add_scene(Some(&template(30))).unwrap();
    let b = store.add_scene(Some(&template(60))).unwrap();
    assert_eq!(store.total_duration_in_frames(), 90);
    assert_eq!(store.scene_start_frame(&b), Some(FrameIndex(30)));
    assert_eq!(store.scene_start_frame("nope"), None);

    let (s, local) = store.scene_at_frame(FrameIndex(29)).unwrap();
    assert_eq!((s.id.as_str(), local), (a.as_str(), FrameIndex(29)));
    let (s, local) = store.scene_at_frame(FrameIndex(30)).unwrap();
    assert_eq!((s.id.as_str(), local), (b.as_str(), FrameIndex(0)));
    let (s, local) = store.scene_at_frame(FrameIndex(90)).unwrap();
    assert_eq!((s.id.as_str(), local), (b.as_str(), FrameIndex(59)));

    let blocks = store.scene_blocks(2.0);
    assert_eq!(blocks[1].x, 60.0);
    assert_eq!(blocks[1].width, 120.0);
}

#[test]
fn component_at_returns_topmost_visible() {
    let (mut store, sid) = store_with_scene(30);
    let under = store
        .add_component(ComponentDraft::text("under", 30).at(0.0, 0.0).size(500.0, 500.0))
        .unwrap()
        .unwrap();
    let over = store
        .add_component(
            ComponentDraft::text("over", 30)
                .range(10, 20)
                .at(100.0, 100.0)
                .size(100.0, 100.0),
        )
        .unwrap()
        .unwrap();
    let p = Point::new(150.0, 150.0);
    assert_eq!(store.component_at(&sid, FrameIndex(15), p).unwrap().id, over);
    assert_eq!(store.component_at(&sid, FrameIndex(5), p).unwrap().id, under);
    assert!(store.component_at(&sid, FrameIndex(5), Point::new(900.0, 900.0)).is_none());
}

#[test]
fn dirty_tracking_reports_each_scene_once() {
    let (mut store, sid) = store_with_scene(30);
    let a = store.add_component(ComponentDraft::text("a", 30)).unwrap().unwrap();
    store.update_component_property(&a, ComponentProperty::Top(5.0)).unwrap();
    assert_eq!(store.take_dirty(), vec![sid]);
    assert!(store.take_dirty().is_empty());
}

#[test]
fn load_observes_ids_and_reset_clears_everything() {
    let mut store = SceneStore::new();
    let mut scene = Scene {
        id: "scene-7".to_string(),
        title: "Loaded".to_string(),
        duration_in_frames: 10,
        components: vec![],
        script: String::new(),
    };
    scene.components.push(SceneComponent::from_draft(
        "cmp-12".to_string(),
        ComponentDraft::text("x", 50),
    ));
    store.load(vec![scene]);
    assert_eq!(store.scenes()[0].components[0].to, 10);
    store.select_scene(Some("scene-7"));
    let cid = store.add_component(ComponentDraft::text("y", 5)).unwrap().unwrap();
    assert_eq!(cid, "cmp-13");

    store.reset();
    assert!(store.scenes().is_empty());
    assert_eq!(store.selected_scene_id(), None);
}

#[test]
fn scene_list_changes_are_flagged_once() {
    let (mut store, sid) = store_with_scene(30);
    assert!(store.take_order_dirty());
    assert!(!store.take_order_dirty());

    store.add_component(ComponentDraft::text("a", 30)).unwrap();
    assert!(!store.take_order_dirty());

    let other = store.add_scene(Some(&template(10))).unwrap();
    store.take_order_dirty();
    assert!(store.move_scene(&other, 0));
    assert!(store.take_order_dirty());
    let order: Vec<_> = store.scenes().iter().map(|s| s.id.clone()).collect();
    assert_eq!(order, vec![other, sid.clone()]);

    assert!(!store.move_scene("scene-404", 0));
    assert!(!store.take_order_dirty());
    store.delete_scene(&sid);
    assert!(store.take_order_dirty());
    store.restore_scene(&sid);
    assert!(store.take_order_dirty());
    store.duplicate_scene(&sid);
    assert!(store.take_order_dirty());
}

#[test]
fn loaded_maximum_id_does_not_break_new_ids() {
    let mut store = SceneStore::new();
    store.load(vec![Scene {
        id: format!("scene-{}", u64::MAX),
        title: "Loaded".to_string(),
        duration_in_frames: 10,
        components: vec![],
        script: String::new(),
    }]);
    let a = store.add_scene(Some(&template(10))).unwrap();
    let b = store.add_scene(Some(&template(10))).unwrap();
    let ids: BTreeSet<_> = store.scenes().iter().map(|s| s.id.clone()).collect();
    assert_eq!(ids.len(), 3);
    assert_ne!(a, b);
}

#[derive(Clone, Debug)]
enum Op {
    Add { from: u64, to: u64 },
    SetFrom(usize, u64),
    SetTo(usize, u64),
    Duration(u64),
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u64..400, 0u64..400).prop_map(|(from, to)| Op::Add { from, to }),
        (0usize..8, 0u64..400).prop_map(|(i, v)| Op::SetFrom(i, v)),
        (0usize..8, 0u64..400).prop_map(|(i, v)| Op::SetTo(i, v)),
        (0u64..300).prop_map(Op::Duration),
        (0usize..8).prop_map(Op::Delete),
    ]
}

proptest! {
    #[test]
    fn prop_component_ranges_stay_within_scene(ops in prop::collection::vec(op(), 0..60)) {
        let (mut store, sid) = store_with_scene(150);
        for op in ops {
            let ids: Vec<_> = store
                .scene(&sid)
                .unwrap()
                .components
                .iter()
                .map(|c| c.id.clone())
                .collect();
            let pick = |i: usize| ids.get(i % ids.len().max(1)).cloned();
            match op {
                Op::Add { from, to } => {
                    store
                        .add_component(ComponentDraft::text("p", to).range(from, to))
                        .unwrap();
                }
                Op::SetFrom(i, v) => {
                    if let Some(id) = pick(i) {
                        store.update_component_property(&id, ComponentProperty::From(v)).unwrap();
                    }
                }
                Op::SetTo(i, v) => {
                    if let Some(id) = pick(i) {
                        store.update_component_property(&id, ComponentProperty::To(v)).unwrap();
                    }
                }
                Op::Duration(d) => {
                    let patch = ScenePatch {
                        duration_in_frames: Some(d),
                        ..ScenePatch::default()
                    };
                    store.update_scene(&sid, patch);
                }
                Op::Delete(i) => {
                    if let Some(id) = pick(i) {
                        store.delete_component(&id);
                    }
                }
            }
            assert_invariants(&store);
        }
    }
}
