use crate::{
    composition::model::{
        Animation, AnimationPhase, ComponentDraft, ComponentKind, FitMode, MediaKind, SceneMedia,
        SceneTemplate, SceneText, TextAlign,
    },
    foundation::core::{Canvas, Rgba8},
    foundation::error::{EditorError, EditorResult},
};

/// Default font family for new text components.
pub const DEFAULT_FONT_FAMILY: &str = "Inter";

/// Builder for [`SceneTemplate`].
pub struct TemplateBuilder {
    title: String,
    duration_in_frames: u64,
    script: String,
    components: Vec<ComponentDraft>,
}

impl TemplateBuilder {
    /// Create a builder for a template of the given length.
    pub fn new(title: impl Into<String>, duration_in_frames: u64) -> Self {
        Self {
            title: title.into(),
            duration_in_frames,
            script: String::new(),
            components: Vec::new(),
        }
    }

    /// Set the initial narration script.
    pub fn script(mut self, script: impl Into<String>) -> Self {
        self.script = script.into();
        self
    }

    /// Append a component draft.
    pub fn component(mut self, draft: ComponentDraft) -> Self {
        self.components.push(draft);
        self
    }

    /// Build and validate the template.
    pub fn build(self) -> EditorResult<SceneTemplate> {
        if self.duration_in_frames == 0 {
            return Err(EditorError::validation(
                "template duration must be > 0 frames",
            ));
        }
        for (i, c) in self.components.iter().enumerate() {
            if c.from >= c.to || c.to > self.duration_in_frames {
                return Err(EditorError::validation(format!(
                    "template component #{i} range must satisfy from < to <= duration",
                )));
            }
        }
        Ok(SceneTemplate {
            title: self.title,
            duration_in_frames: self.duration_in_frames,
            components: self.components,
            script: self.script,
        })
    }
}

impl ComponentDraft {
    /// A full-canvas text draft visible for `[0, to)`.
    pub fn text(text: impl Into<String>, to: u64) -> Self {
        Self::full_canvas(
            to,
            ComponentKind::Text(SceneText {
                text: text.into(),
                font_family: DEFAULT_FONT_FAMILY.to_string(),
                font_size: 64.0,
                color: Rgba8::WHITE,
                align: TextAlign::Center,
            }),
        )
    }

    /// A full-canvas media draft visible for `[0, to)`.
    pub fn media(media_type: MediaKind, src: impl Into<String>, to: u64) -> Self {
        Self::full_canvas(
            to,
            ComponentKind::Media(SceneMedia {
                media_type,
                src: src.into(),
                fit: FitMode::Contain,
            }),
        )
    }

    fn full_canvas(to: u64, kind: ComponentKind) -> Self {
        let canvas = Canvas::HD;
        Self {
            from: 0,
            to,
            top: 0.0,
            left: 0.0,
            width: f64::from(canvas.width),
            height: f64::from(canvas.height),
            animations: Vec::new(),
            kind,
        }
    }

    /// Set the visible range `[from, to)`.
    pub fn range(mut self, from: u64, to: u64) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    /// Set the top-left corner in canvas pixels.
    pub fn at(mut self, left: f64, top: f64) -> Self {
        self.left = left;
        self.top = top;
        self
    }

    /// Set the box size in canvas pixels.
    pub fn size(mut self, width: f64, height: f64) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Append an animation.
    pub fn animation(
        mut self,
        name: impl Into<String>,
        phase: AnimationPhase,
        duration_in_frames: u64,
    ) -> Self {
        self.animations.push(Animation {
            name: name.into(),
            phase,
            duration_in_frames,
        });
        self
    }
}
