pub(crate) mod overlay;
pub(crate) mod playback;
pub(crate) mod scenes;
