//! Conversions between seconds, frames and horizontal pixels.
//!
//! Every view that lays time out horizontally (scrubber, scene backgrounds, component bars) goes
//! through these functions so they agree pixel-for-pixel. All results are clamped to `[0, max]`.

use crate::foundation::core::{Fps, FrameIndex};

/// Pixels covered by one second of timeline at the reference scale.
pub const PIXELS_PER_SECOND: f64 = 100.0;

/// Width of the playhead marker, subtracted from the container before scaling.
pub const PLAYHEAD_WIDTH_PX: f64 = 2.0;

/// Map a horizontal pixel offset to a frame at a fixed pixels-per-second scale.
///
/// `clamp(round(x / pps / (1 / fps)), 0, duration_secs * fps)`.
pub fn frame_from_pixel_x(
    x: f64,
    duration_secs: f64,
    fps: Fps,
    pixels_per_second: f64,
) -> FrameIndex {
    let max = max_frame(duration_secs, fps);
    if !x.is_finite() || x <= 0.0 || !pixels_per_second.is_finite() || pixels_per_second <= 0.0 {
        return FrameIndex::ZERO;
    }
    let seconds = x / pixels_per_second;
    let frame = (seconds / fps.frame_duration_secs()).round();
    FrameIndex((frame as u64).min(max))
}

/// Map a frame to a horizontal pixel offset.
pub fn pixel_x_from_frame(frame: FrameIndex, pixels_per_frame: f64) -> f64 {
    if !pixels_per_frame.is_finite() || pixels_per_frame <= 0.0 {
        return 0.0;
    }
    (frame.0 as f64) * pixels_per_frame
}

/// Pixels per frame when `total_frames` must fit a container of `container_width` pixels.
///
/// The divisor is floored at one frame and the usable width at zero.
pub fn pixels_per_frame(container_width: f64, playhead_width: f64, total_frames: u64) -> f64 {
    let usable = if container_width.is_finite() {
        (container_width - playhead_width).max(0.0)
    } else {
        0.0
    };
    usable / (total_frames.max(1) as f64)
}

/// Pixels per frame at the fixed pixels-per-second scale.
pub fn reference_pixels_per_frame(fps: Fps, pixels_per_second: f64) -> f64 {
    pixels_per_second * fps.frame_duration_secs()
}

/// Inverse of [`pixel_x_from_frame`] for a container-derived scale, clamped to `[0, total_frames]`.
pub fn frame_from_scaled_x(x: f64, pixels_per_frame: f64, total_frames: u64) -> FrameIndex {
    if !x.is_finite() || x <= 0.0 || !pixels_per_frame.is_finite() || pixels_per_frame <= 0.0 {
        return FrameIndex::ZERO;
    }
    FrameIndex(((x / pixels_per_frame).round() as u64).min(total_frames))
}

/// Last addressable frame for a duration in seconds.
fn max_frame(duration_secs: f64, fps: Fps) -> u64 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0;
    }
    fps.secs_to_frames_round(duration_secs)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/coords.rs"]
mod tests;
