use std::collections::BTreeSet;

use crate::foundation::{
    core::{FrameIndex, Rect, Rgba8},
    error::{EditorError, EditorResult},
};

/// Stable scene identifier.
pub type SceneId = String;
/// Stable component identifier, unique across all scenes of a project.
pub type ComponentId = String;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A timed block of the project timeline holding positioned components.
pub struct Scene {
    /// Scene identifier.
    pub id: SceneId,
    /// Display title.
    pub title: String,
    /// Scene length in frames; always `>= 1`.
    pub duration_in_frames: u64,
    /// Components in painter's order (last is topmost).
    #[serde(default)]
    pub components: Vec<SceneComponent>,
    /// Narration script attached to the scene.
    #[serde(default)]
    pub script: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A text or media element placed inside a scene.
///
/// `from`/`to` are frame offsets inside the owning scene (`0 <= from < to <= duration`).
/// Geometry is in authoring-canvas pixels, independent of display scale.
pub struct SceneComponent {
    /// Component identifier.
    pub id: ComponentId,
    /// First visible frame (inclusive).
    pub from: u64,
    /// End frame (exclusive).
    pub to: u64,
    /// Top edge in canvas pixels.
    pub top: f64,
    /// Left edge in canvas pixels.
    pub left: f64,
    /// Width in canvas pixels.
    pub width: f64,
    /// Height in canvas pixels.
    pub height: f64,
    /// Enter/exit animations in application order.
    #[serde(default)]
    pub animations: Vec<Animation>,
    /// Variant payload.
    #[serde(flatten)]
    pub kind: ComponentKind,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
/// Variant payload of a [`SceneComponent`].
pub enum ComponentKind {
    /// Text block.
    Text(SceneText),
    /// Image, video or audio element.
    Media(SceneMedia),
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Text component payload.
pub struct SceneText {
    /// UTF-8 text content.
    pub text: String,
    /// Font family name.
    pub font_family: String,
    /// Font size in canvas pixels.
    pub font_size: f32,
    /// Text color.
    #[serde(default)]
    pub color: Rgba8,
    /// Horizontal alignment.
    #[serde(default)]
    pub align: TextAlign,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Text alignment inside the component box.
pub enum TextAlign {
    /// Align to the left edge.
    #[default]
    Left,
    /// Center horizontally.
    Center,
    /// Align to the right edge.
    Right,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Media component payload.
pub struct SceneMedia {
    /// Kind of media referenced by `src`.
    pub media_type: MediaKind,
    /// Source URL.
    pub src: String,
    /// How the media fills the component box.
    #[serde(default)]
    pub fit: FitMode,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Media kind.
pub enum MediaKind {
    /// Still image.
    Image,
    /// Video clip.
    Video,
    /// Audio-only clip.
    Audio,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// Fit mode for media inside its box.
pub enum FitMode {
    /// Scale to fit entirely inside the box.
    #[default]
    Contain,
    /// Scale to cover the box, cropping overflow.
    Cover,
    /// Stretch to the box.
    Fill,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Animation descriptor attached to a component.
pub struct Animation {
    /// Animation preset name (for example `fade` or `slide-up`).
    pub name: String,
    /// Whether the animation plays on entry or exit.
    pub phase: AnimationPhase,
    /// Length in frames.
    pub duration_in_frames: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
/// When an animation plays relative to the component's visible range.
pub enum AnimationPhase {
    /// Plays starting at `from`.
    Enter,
    /// Plays ending at `to`.
    Exit,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A component before it has been given an identifier.
pub struct ComponentDraft {
    /// First visible frame (inclusive).
    pub from: u64,
    /// End frame (exclusive).
    pub to: u64,
    /// Top edge in canvas pixels.
    pub top: f64,
    /// Left edge in canvas pixels.
    pub left: f64,
    /// Width in canvas pixels.
    pub width: f64,
    /// Height in canvas pixels.
    pub height: f64,
    /// Animations in application order.
    #[serde(default)]
    pub animations: Vec<Animation>,
    /// Variant payload.
    #[serde(flatten)]
    pub kind: ComponentKind,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Static description from which new scenes are instantiated.
pub struct SceneTemplate {
    /// Title given to instantiated scenes.
    pub title: String,
    /// Scene length in frames.
    pub duration_in_frames: u64,
    /// Components copied into every instance.
    #[serde(default)]
    pub components: Vec<ComponentDraft>,
    /// Initial narration script.
    #[serde(default)]
    pub script: String,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// Project metadata. Scenes are referenced, not owned.
pub struct Project {
    /// Project identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Creation timestamp (unix milliseconds).
    #[serde(default)]
    pub created_at_ms: u64,
    /// Last update timestamp (unix milliseconds).
    #[serde(default)]
    pub updated_at_ms: u64,
    /// Ordered scene references.
    #[serde(default)]
    pub scene_ids: Vec<SceneId>,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
/// A project together with the scenes it references, as exchanged with backends and files.
pub struct ProjectDocument {
    /// Project metadata.
    pub project: Project,
    /// Scenes in timeline order.
    pub scenes: Vec<Scene>,
}

impl ComponentKind {
    /// Variant name used in diagnostics and serialized as `type`.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Media(_) => "media",
        }
    }
}

impl SceneComponent {
    /// Attach an identifier to a draft.
    pub fn from_draft(id: ComponentId, draft: ComponentDraft) -> Self {
        Self {
            id,
            from: draft.from,
            to: draft.to,
            top: draft.top,
            left: draft.left,
            width: draft.width,
            height: draft.height,
            animations: draft.animations,
            kind: draft.kind,
        }
    }

    /// Component box in canvas pixels.
    pub fn bounds(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left + self.width,
            self.top + self.height,
        )
    }

    /// Whether the component is visible at a scene-local frame.
    pub fn is_visible_at(&self, frame: FrameIndex) -> bool {
        self.from <= frame.0 && frame.0 < self.to
    }

    /// Force `0 <= from < to <= duration` and non-negative, finite geometry.
    ///
    /// Returns `true` when anything changed.
    pub fn clamp_to(&mut self, duration_in_frames: u64) -> bool {
        let before = (self.from, self.to, self.top, self.left, self.width, self.height);
        let duration = duration_in_frames.max(1);
        self.from = self.from.min(duration - 1);
        self.to = self.to.clamp(self.from + 1, duration);
        self.top = finite_or_zero(self.top);
        self.left = finite_or_zero(self.left);
        self.width = finite_or_zero(self.width).max(0.0);
        self.height = finite_or_zero(self.height).max(0.0);
        before != (self.from, self.to, self.top, self.left, self.width, self.height)
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

impl Scene {
    /// Largest `to` among contained components, or zero when empty.
    pub fn max_component_end(&self) -> u64 {
        self.components.iter().map(|c| c.to).max().unwrap_or(0)
    }

    /// Find a component by id.
    pub fn component(&self, id: &str) -> Option<&SceneComponent> {
        self.components.iter().find(|c| c.id == id)
    }

    /// Validate scene invariants.
    pub fn validate(&self) -> EditorResult<()> {
        if self.id.trim().is_empty() {
            return Err(EditorError::validation("scene id must be non-empty"));
        }
        if self.duration_in_frames == 0 {
            return Err(EditorError::validation(format!(
                "scene '{}' duration must be > 0 frames",
                self.id
            )));
        }
        let mut seen = BTreeSet::new();
        for c in &self.components {
            if !seen.insert(c.id.as_str()) {
                return Err(EditorError::validation(format!(
                    "scene '{}' has duplicate component id '{}'",
                    self.id, c.id
                )));
            }
            if c.from >= c.to {
                return Err(EditorError::validation(format!(
                    "component '{}' has invalid range (from >= to)",
                    c.id
                )));
            }
            if c.to > self.duration_in_frames {
                return Err(EditorError::validation(format!(
                    "component '{}' range exceeds scene duration",
                    c.id
                )));
            }
            for (name, v) in [
                ("top", c.top),
                ("left", c.left),
                ("width", c.width),
                ("height", c.height),
            ] {
                if !v.is_finite() {
                    return Err(EditorError::validation(format!(
                        "component '{}' {name} must be finite",
                        c.id
                    )));
                }
            }
            if c.width < 0.0 || c.height < 0.0 {
                return Err(EditorError::validation(format!(
                    "component '{}' width/height must be >= 0",
                    c.id
                )));
            }
        }
        Ok(())
    }
}

impl ProjectDocument {
    /// Validate every scene, id uniqueness across the project and the project's scene references.
    pub fn validate(&self) -> EditorResult<()> {
        let mut scene_ids = BTreeSet::new();
        let mut component_ids = BTreeSet::new();
        for scene in &self.scenes {
            scene.validate()?;
            if !scene_ids.insert(scene.id.as_str()) {
                return Err(EditorError::validation(format!(
                    "duplicate scene id '{}'",
                    scene.id
                )));
            }
            for c in &scene.components {
                if !component_ids.insert(c.id.as_str()) {
                    return Err(EditorError::validation(format!(
                        "component id '{}' is used by more than one scene",
                        c.id
                    )));
                }
            }
        }
        for id in &self.project.scene_ids {
            if !scene_ids.contains(id.as_str()) {
                return Err(EditorError::validation(format!(
                    "project references missing scene '{id}'"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/model.rs"]
mod tests;
