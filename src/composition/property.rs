use crate::{
    composition::model::{
        Animation, ComponentKind, FitMode, MediaKind, SceneComponent, SceneMedia, SceneText,
        TextAlign,
    },
    foundation::{core::Rgba8, error::Precondition},
};

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "key", content = "value", rename_all = "camelCase")]
/// A single typed property write.
///
/// Shared keys apply to every variant; text keys only to [`ComponentKind::Text`] and media keys
/// only to [`ComponentKind::Media`]. The value type is fixed by the key.
pub enum ComponentProperty {
    /// First visible frame.
    From(u64),
    /// End frame (exclusive).
    To(u64),
    /// Top edge in canvas pixels.
    Top(f64),
    /// Left edge in canvas pixels.
    Left(f64),
    /// Width in canvas pixels.
    Width(f64),
    /// Height in canvas pixels.
    Height(f64),
    /// Replace the animation list.
    Animations(Vec<Animation>),
    /// Text content.
    Text(String),
    /// Font family.
    FontFamily(String),
    /// Font size in canvas pixels.
    FontSize(f32),
    /// Text color.
    Color(Rgba8),
    /// Text alignment.
    Align(TextAlign),
    /// Media kind.
    MediaType(MediaKind),
    /// Media source URL.
    Src(String),
    /// Media fit mode.
    Fit(FitMode),
}

impl ComponentProperty {
    /// Serialized key name.
    pub fn key(&self) -> &'static str {
        match self {
            Self::From(_) => "from",
            Self::To(_) => "to",
            Self::Top(_) => "top",
            Self::Left(_) => "left",
            Self::Width(_) => "width",
            Self::Height(_) => "height",
            Self::Animations(_) => "animations",
            Self::Text(_) => "text",
            Self::FontFamily(_) => "fontFamily",
            Self::FontSize(_) => "fontSize",
            Self::Color(_) => "color",
            Self::Align(_) => "align",
            Self::MediaType(_) => "mediaType",
            Self::Src(_) => "src",
            Self::Fit(_) => "fit",
        }
    }

    /// Write the value into `component`.
    ///
    /// Nothing is written when the key does not belong to the component's variant. Range and
    /// geometry are not clamped here; the owner of the scene duration does that.
    pub fn apply(self, component: &mut SceneComponent) -> Result<(), Precondition> {
        let mismatch = Precondition::PropertyKindMismatch {
            key: self.key(),
            kind: component.kind.name(),
        };
        match self {
            Self::From(v) => component.from = v,
            Self::To(v) => component.to = v,
            Self::Top(v) => component.top = v,
            Self::Left(v) => component.left = v,
            Self::Width(v) => component.width = v,
            Self::Height(v) => component.height = v,
            Self::Animations(v) => component.animations = v,
            Self::Text(v) => text_mut(&mut component.kind).ok_or(mismatch)?.text = v,
            Self::FontFamily(v) => text_mut(&mut component.kind).ok_or(mismatch)?.font_family = v,
            Self::FontSize(v) => {
                let text = text_mut(&mut component.kind).ok_or(mismatch)?;
                if v.is_finite() {
                    text.font_size = v.max(1.0);
                }
            }
            Self::Color(v) => text_mut(&mut component.kind).ok_or(mismatch)?.color = v,
            Self::Align(v) => text_mut(&mut component.kind).ok_or(mismatch)?.align = v,
            Self::MediaType(v) => media_mut(&mut component.kind).ok_or(mismatch)?.media_type = v,
            Self::Src(v) => media_mut(&mut component.kind).ok_or(mismatch)?.src = v,
            Self::Fit(v) => media_mut(&mut component.kind).ok_or(mismatch)?.fit = v,
        }
        Ok(())
    }
}

fn text_mut(kind: &mut ComponentKind) -> Option<&mut SceneText> {
    match kind {
        ComponentKind::Text(t) => Some(t),
        ComponentKind::Media(_) => None,
    }
}

fn media_mut(kind: &mut ComponentKind) -> Option<&mut SceneMedia> {
    match kind {
        ComponentKind::Media(m) => Some(m),
        ComponentKind::Text(_) => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/composition/property.rs"]
mod tests;
