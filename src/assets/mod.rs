//! Remote images: fetching, decoding and the per-run cache.

pub mod cache;
pub mod decode;
pub mod fetch;
