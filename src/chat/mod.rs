//! Chat-replay log decoding and the message timeline model.

pub mod model;
pub mod normalize;
pub mod record;
