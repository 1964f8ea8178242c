pub(crate) mod keyboard;
