//! One handler per RPC operation.
pub(crate) mod audio;
pub(crate) mod status;
