//! Render-frame scheduling
//!
//! Flows that trigger a re-render and then need the new markup use
//! [`settle`] to yield for two frames instead of sleeping for a guessed
//! duration. Tests swap in a scheduler that resolves immediately.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

/// Future completing at the next renderable frame
pub type FrameFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Source of render frames
pub trait FrameScheduler: Send + Sync {
    fn next_frame(&self) -> FrameFuture;
}

/// Frames on a fixed tokio interval (16ms ≈ 60 fps by default)
#[derive(Debug, Clone, Copy)]
pub struct IntervalFrames {
    period: Duration,
}

impl Default for IntervalFrames {
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}

impl IntervalFrames {
    pub fn new(period: Duration) -> Self {
        Self { period }
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl FrameScheduler for IntervalFrames {
    fn next_frame(&self) -> FrameFuture {
        let period = self.period;
        Box::pin(async move {
            tokio::time::sleep(period).await;
        })
    }
}

/// Wait until two frames have passed
///
/// One frame lets the render pipeline attach new markup; the second lets it
/// become visible.
pub async fn settle(frames: &dyn FrameScheduler) {
    frames.next_frame().await;
    frames.next_frame().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_settle_waits_two_periods() {
        let frames = IntervalFrames::new(Duration::from_millis(16));
        let start = tokio::time::Instant::now();
        settle(&frames).await;
        assert_eq!(start.elapsed(), Duration::from_millis(32));
    }
}
