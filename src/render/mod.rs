//! Chat rasterization and the frame loop.

/// Bottom-anchored chat renderer on `vello_cpu`.
pub mod chat;
/// Rendered frame type.
pub mod frame;
/// End-to-end entry points.
pub mod pipeline;
/// Frame loop driving playhead, renderer and sink.
pub mod pump;
