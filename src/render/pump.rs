use crate::{
    chat::model::ChatMessage,
    encode::sink::{FrameSink, SinkConfig},
    foundation::error::{ChatreelError, ChatreelResult},
    render::chat::FramePainter,
    timeline::playhead::Playhead,
};

/// Tail added after the window end so the last messages stay on screen briefly.
pub const PADDING_SECONDS: f64 = 2.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTiming {
    pub fps: u32,
    pub from_s: f64,
    pub to_s: f64,
}

impl FrameTiming {
    /// Explicit window; `to_s` must be after `from_s`.
    pub fn new(fps: u32, from_s: f64, to_s: f64) -> ChatreelResult<Self> {
        Self::build(fps, from_s, to_s, false)
    }

    /// Window whose end was inferred from the chat rather than requested.
    ///
    /// A zero-width window is allowed here; the clip is then only the padding tail.
    pub fn derived(fps: u32, from_s: f64, to_s: f64) -> ChatreelResult<Self> {
        Self::build(fps, from_s, to_s, true)
    }

    fn build(fps: u32, from_s: f64, to_s: f64, allow_empty: bool) -> ChatreelResult<Self> {
        if fps == 0 {
            return Err(ChatreelError::validation("fps must be non-zero"));
        }
        if !from_s.is_finite() || !to_s.is_finite() {
            return Err(ChatreelError::validation(format!(
                "time window {from_s}..{to_s} must be finite"
            )));
        }
        if to_s < from_s || (to_s == from_s && !allow_empty) {
            return Err(ChatreelError::validation(format!(
                "time window end {to_s}s must be after start {from_s}s"
            )));
        }
        let timing = Self { fps, from_s, to_s };
        if timing.total_frames() == 0 {
            return Err(ChatreelError::validation("time window yields zero frames"));
        }
        Ok(timing)
    }

    /// `floor(fps * (to - from + PADDING_SECONDS))`.
    pub fn total_frames(&self) -> u64 {
        let frames = (self.fps as f64 * (self.to_s - self.from_s + PADDING_SECONDS)).floor();
        if frames.is_finite() && frames > 0.0 {
            frames as u64
        } else {
            0
        }
    }

    /// Stream time shown by frame `idx`.
    pub fn time_at(&self, idx: u64) -> f64 {
        self.from_s + idx as f64 / self.fps as f64
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PumpStats {
    pub frames: u64,
    /// Repaints after the initial paint.
    pub redraws: u64,
    /// Messages visible on the last frame.
    pub revealed: usize,
}

/// Drives the playhead frame by frame and streams every frame to a sink.
///
/// Unchanged frames reuse the last painted canvas. All messages due at a frame are revealed
/// before a single repaint, which produces the same pixels as repainting after each one.
#[derive(Clone, Copy, Debug)]
pub struct FramePump {
    timing: FrameTiming,
}

impl FramePump {
    pub fn new(timing: FrameTiming) -> Self {
        Self { timing }
    }

    pub fn timing(&self) -> FrameTiming {
        self.timing
    }

    #[tracing::instrument(
        skip_all,
        fields(fps = self.timing.fps, from_s = self.timing.from_s, to_s = self.timing.to_s)
    )]
    pub fn run(
        &self,
        messages: &[ChatMessage],
        painter: &mut dyn FramePainter,
        sink: &mut dyn FrameSink,
    ) -> ChatreelResult<PumpStats> {
        let total = self.timing.total_frames();
        let (width, height) = painter.size();
        sink.begin(SinkConfig {
            width,
            height,
            fps: self.timing.fps,
        })?;

        let mut playhead = Playhead::seeded(messages, self.timing.from_s);
        painter.paint(messages, playhead.revealed())?;

        let mut stats = PumpStats::default();
        let progress_every = u64::from(self.timing.fps) * 10;
        for idx in 0..total {
            let t = self.timing.time_at(idx);
            if playhead.advance(messages, t) > 0 {
                painter.paint(messages, playhead.revealed())?;
                stats.redraws += 1;
            }
            sink.push_frame(idx, painter.frame())?;
            stats.frames += 1;

            if progress_every > 0 && (idx + 1) % progress_every == 0 {
                tracing::info!(
                    frame = idx + 1,
                    total,
                    revealed = playhead.revealed(),
                    "rendering"
                );
            }
        }
        sink.end()?;

        stats.revealed = playhead.revealed();
        tracing::info!(
            frames = stats.frames,
            redraws = stats.redraws,
            revealed = stats.revealed,
            "frame pump finished"
        );
        Ok(stats)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pump.rs"]
mod tests;
