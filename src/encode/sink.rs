use crate::{foundation::error::ChatreelResult, render::frame::FrameRGBA};

/// Stream parameters handed to a [`FrameSink`] before the first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

/// Consumer of rendered frames in timeline order.
///
/// `push_frame` is called with strictly increasing indices and may block; the pump does not
/// produce the next frame until it returns.
pub trait FrameSink {
    fn begin(&mut self, cfg: SinkConfig) -> ChatreelResult<()>;
    fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> ChatreelResult<()>;
    fn end(&mut self) -> ChatreelResult<()>;
}

/// Keeps every frame in memory. Meant for tests and snapshots.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u64, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg
    }

    pub fn frames(&self) -> &[(u64, FrameRGBA)] {
        &self.frames
    }

    pub fn ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> ChatreelResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> ChatreelResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> ChatreelResult<()> {
        self.ended = true;
        Ok(())
    }
}
