use std::{fs::File, io::BufReader, path::Path, time::Duration};

use anyhow::Context as _;

use crate::{
    bridge::player::DEFAULT_EVENT_CAPACITY,
    foundation::{
        coords::{PIXELS_PER_SECOND, PLAYHEAD_WIDTH_PX},
        core::{Canvas, Fps},
        error::{EditorError, EditorResult},
    },
    persist::autosave::DEFAULT_DEBOUNCE_MS,
};

/// Options controlling an [`EditorContext`](crate::EditorContext).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Timeline frame rate.
    pub fps: Fps,
    /// Authoring canvas.
    pub canvas: Canvas,
    /// Horizontal pixels per second of timeline at the reference scale.
    pub pixels_per_second: f64,
    /// Playhead marker width subtracted from the container before scaling.
    pub playhead_width_px: f64,
    /// Auto-save debounce window in milliseconds.
    pub autosave_debounce_ms: u64,
    /// Bounded capacity of the player event channel.
    pub player_event_capacity: usize,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            canvas: Canvas::HD,
            pixels_per_second: PIXELS_PER_SECOND,
            playhead_width_px: PLAYHEAD_WIDTH_PX,
            autosave_debounce_ms: DEFAULT_DEBOUNCE_MS,
            player_event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

impl EditorConfig {
    /// Read a JSON config file; missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> EditorResult<Self> {
        let f = File::open(path).with_context(|| format!("open config '{}'", path.display()))?;
        let cfg: Self = serde_json::from_reader(BufReader::new(f))?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> EditorResult<()> {
        Fps::new(self.fps.num, self.fps.den)?;
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(EditorError::validation("canvas width/height must be > 0"));
        }
        if !self.pixels_per_second.is_finite() || self.pixels_per_second <= 0.0 {
            return Err(EditorError::validation(
                "pixels_per_second must be finite and > 0",
            ));
        }
        if !self.playhead_width_px.is_finite() || self.playhead_width_px < 0.0 {
            return Err(EditorError::validation(
                "playhead_width_px must be finite and >= 0",
            ));
        }
        if self.player_event_capacity == 0 {
            return Err(EditorError::validation(
                "player_event_capacity must be > 0",
            ));
        }
        Ok(())
    }

    pub fn autosave_debounce(&self) -> Duration {
        Duration::from_millis(self.autosave_debounce_ms)
    }
}
