//! scenecraft is the state engine behind a scene-based video composition editor.
//!
//! It owns the ordered list of scenes and their timed, positioned components, keeps a playback
//! cursor in step with an external player, manages single-component overlay editing and persists
//! edits through a debounced, coalescing auto-saver. It renders nothing itself.
//!
//! # Data flow
//!
//! 1. **Mutate**: user actions go through [`EditorContext`] into the [`SceneStore`] and
//!    [`OverlayStore`].
//! 2. **Derive**: the [`PlaybackStore`] recomputes duration and pixels-per-frame.
//! 3. **Sync**: the [`PlayerBridge`] drains player events into the playback store and forwards user
//!    seeks to the player.
//! 4. **Persist**: the [`AutoSaveCoordinator`] batches committed scene changes into one save per
//!    scene with at most one in flight.
//!
//! Design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Clamp, don't reject**: out-of-range frames, durations and geometry are clamped.
//! - **Stale ids are no-ops**: operations on deleted ids succeed without effect.
//! - **Single-threaded**: stores are plain owned values; the player bridge is the only channel.
#![forbid(unsafe_code)]

mod bridge;
mod composition;
mod editor;
mod foundation;
mod input;
mod persist;
mod store;

pub use bridge::player::{
    DEFAULT_EVENT_CAPACITY, EmitOutcome, Player, PlayerBridge, PlayerEvent, PlayerEvents, reduce,
};
pub use composition::dsl::{DEFAULT_FONT_FAMILY, TemplateBuilder};
pub use composition::model::{
    Animation, AnimationPhase, ComponentDraft, ComponentId, ComponentKind, FitMode, MediaKind,
    Project, ProjectDocument, Scene, SceneComponent, SceneId, SceneMedia, SceneTemplate, SceneText,
    TextAlign,
};
pub use composition::property::ComponentProperty;
pub use editor::config::EditorConfig;
pub use editor::context::{EditorContext, TickReport};
pub use foundation::coords::{
    PIXELS_PER_SECOND, PLAYHEAD_WIDTH_PX, frame_from_pixel_x, frame_from_scaled_x,
    pixel_x_from_frame, pixels_per_frame, reference_pixels_per_frame,
};
pub use foundation::core::{Canvas, Fps, FrameIndex, Point, Rect, Rgba8};
pub use foundation::error::{EditorError, EditorResult, Precondition};
pub use foundation::ids::IdGen;
pub use input::keyboard::{FocusTarget, Key, KeyEvent, KeyOutcome, KeyboardHandler};
pub use persist::autosave::{
    AutoSaveCoordinator, DEFAULT_DEBOUNCE_MS, SaveNotice, SaveRequest, SaveTarget, SaveTicket,
};
pub use persist::backend::{JsonFileBackend, SceneBackend, SceneScript, read_project_json};
pub use store::overlay::OverlayStore;
pub use store::playback::{PlaybackMode, PlaybackStore};
pub use store::scenes::{SceneBlock, ScenePatch, SceneStore};
