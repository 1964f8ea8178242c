//! Playback cursor, transport mode and the timeline geometry derived from them.

use crate::{
    composition::model::SceneId,
    foundation::{
        coords::{PLAYHEAD_WIDTH_PX, frame_from_scaled_x, pixel_x_from_frame, pixels_per_frame},
        core::FrameIndex,
    },
    store::scenes::SceneStore,
};

/// Current transport mode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PlaybackMode {
    /// Not advancing.
    #[default]
    Paused,
    /// The player is advancing frames.
    Playing,
}

/// Playback state mirrored from the external player.
///
/// `frame` is written from player events; the store never pushes frames to the player itself.
#[derive(Clone, Debug)]
pub struct PlaybackStore {
    mode: PlaybackMode,
    frame: FrameIndex,
    container_width: f64,
    playhead_width: f64,
    duration_in_frames: u64,
    animations_enabled: bool,
    isolated_scene: Option<SceneId>,
}

impl Default for PlaybackStore {
    fn default() -> Self {
        Self::new(PLAYHEAD_WIDTH_PX)
    }
}

impl PlaybackStore {
    pub fn new(playhead_width: f64) -> Self {
        Self {
            mode: PlaybackMode::Paused,
            frame: FrameIndex::ZERO,
            container_width: 0.0,
            playhead_width,
            duration_in_frames: 0,
            animations_enabled: false,
            isolated_scene: None,
        }
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_playing(&self) -> bool {
        self.mode == PlaybackMode::Playing
    }

    pub fn frame(&self) -> FrameIndex {
        self.frame
    }

    pub fn container_width(&self) -> f64 {
        self.container_width
    }

    pub fn duration_in_frames(&self) -> u64 {
        self.duration_in_frames
    }

    /// Whether enter/exit animations should render. Off until the first play, and while scrubbing.
    pub fn animations_enabled(&self) -> bool {
        self.animations_enabled
    }

    pub fn isolated_scene(&self) -> Option<&str> {
        self.isolated_scene.as_deref()
    }

    pub fn play(&mut self) {
        self.mode = PlaybackMode::Playing;
        self.animations_enabled = true;
        tracing::debug!(frame = self.frame.0, "playback started");
    }

    pub fn pause(&mut self) {
        self.mode = PlaybackMode::Paused;
        tracing::debug!(frame = self.frame.0, "playback paused");
    }

    /// Set the cursor, clamped to `[0, duration_in_frames]`.
    pub fn set_frame(&mut self, frame: FrameIndex) {
        self.frame = frame.clamp_to(self.duration_in_frames);
    }

    /// A user scrub is starting; entrance animations stay suppressed until the next play.
    pub fn begin_scrub(&mut self) {
        self.animations_enabled = false;
    }

    /// Resize of the preview container. Non-finite or negative widths collapse to zero.
    pub fn set_container_width(&mut self, width: f64) {
        self.container_width = if width.is_finite() { width.max(0.0) } else { 0.0 };
    }

    /// Preview a single scene (`Some`) or the whole timeline (`None`).
    pub fn isolate_scene(&mut self, scene_id: Option<SceneId>, scenes: &SceneStore) {
        self.isolated_scene = scene_id;
        self.sync_duration(scenes);
    }

    /// Recompute the duration from the scene list and re-clamp the cursor.
    ///
    /// An isolated scene that no longer exists falls back to the whole timeline.
    pub fn sync_duration(&mut self, scenes: &SceneStore) {
        let isolated = self
            .isolated_scene
            .as_deref()
            .map(|id| scenes.scene(id).map(|s| s.duration_in_frames));
        self.duration_in_frames = match isolated {
            Some(Some(d)) => d,
            Some(None) => {
                self.isolated_scene = None;
                scenes.total_duration_in_frames()
            }
            None => scenes.total_duration_in_frames(),
        };
        self.frame = self.frame.clamp_to(self.duration_in_frames);
    }

    /// Horizontal scale shared by every view laying out the timeline.
    pub fn pixels_per_frame(&self) -> f64 {
        pixels_per_frame(
            self.container_width,
            self.playhead_width,
            self.duration_in_frames,
        )
    }

    /// Scrubber position in pixels.
    pub fn playhead_x(&self) -> f64 {
        pixel_x_from_frame(self.frame, self.pixels_per_frame())
    }

    /// Frame under a horizontal pixel offset in the container.
    pub fn frame_at_x(&self, x: f64) -> FrameIndex {
        frame_from_scaled_x(x, self.pixels_per_frame(), self.duration_in_frames)
    }

    /// Back to a paused cursor at frame zero with no isolation.
    pub fn reset(&mut self) {
        let width = self.container_width;
        *self = Self::new(self.playhead_width);
        self.container_width = width;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/playback.rs"]
mod tests;
