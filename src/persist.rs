pub(crate) mod autosave;
pub(crate) mod backend;
