//! # Frame Pacing
//!
//! Both engine loops run at a fixed target rate:
//!
//! ```text
//! |<------------------ frame interval ------------------>|
//! |== tick ==|.............. sleep remainder ............|
//! |============== tick (over budget) ==============|======|== next tick ...
//! ```
//!
//! Fast frames sleep the remainder of the interval, busy frames do not sleep
//! at all. The sleep wakes early when a stop is requested.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::CoreResult;
use crate::thread::StopSignal;

/// Frame counters shared between a loop and whoever polls it.
#[derive(Debug, Default)]
pub struct FrameStats {
    frames: AtomicU64,
    total_time_ns: AtomicU64,
}

impl FrameStats {
    /// Creates zeroed statistics.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames completed so far.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Mean time between frame starts in milliseconds, `0.0` before the first frame.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn average_frame_time_ms(&self) -> f64 {
        let frames = self.frames.load(Ordering::Relaxed);
        if frames == 0 {
            return 0.0;
        }
        let total_ns = self.total_time_ns.load(Ordering::Relaxed);
        total_ns as f64 / frames as f64 / 1_000_000.0
    }

    /// Records one finished frame. Returns the new frame count.
    pub fn record(&self, delta: Duration) -> u64 {
        let nanos = u64::try_from(delta.as_nanos()).unwrap_or(u64::MAX);
        self.total_time_ns.fetch_add(nanos, Ordering::Relaxed);
        self.frames.fetch_add(1, Ordering::Relaxed) + 1
    }
}

/// Per-frame input handed to a tick function.
#[derive(Clone, Copy, Debug)]
pub struct FrameTick {
    /// Zero-based index of this frame.
    pub frame: u64,
    /// Seconds since the previous frame started (`0.0` on the first frame).
    pub delta_time: f32,
}

impl FrameTick {
    /// True on the last frame of every `interval` frames (frames N-1, 2N-1, ...).
    ///
    /// An interval of `0` never fires.
    #[inline]
    #[must_use]
    pub fn completes_interval(&self, interval: u64) -> bool {
        interval > 0 && (self.frame + 1) % interval == 0
    }
}

/// Runs `tick` at the given interval until `stop` is requested.
///
/// `interval = None` runs unthrottled. The first error returned by `tick`
/// ends the loop and is returned.
///
/// # Errors
///
/// Propagates the first error from `tick`.
pub fn run_paced<F>(
    stop: &StopSignal,
    interval: Option<Duration>,
    stats: &FrameStats,
    mut tick: F,
) -> CoreResult<()>
where
    F: FnMut(FrameTick) -> CoreResult<()>,
{
    let mut last_start: Option<Instant> = None;

    while !stop.should_stop() {
        let frame_start = Instant::now();
        let delta = last_start.map_or(Duration::ZERO, |last| frame_start - last);
        last_start = Some(frame_start);

        tick(FrameTick {
            frame: stats.frame_count(),
            delta_time: delta.as_secs_f32(),
        })?;
        stats.record(delta);

        if let Some(interval) = interval {
            let busy = frame_start.elapsed();
            if busy < interval {
                stop.sleep(interval - busy);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn test_stats_average() {
        let stats = FrameStats::new();
        assert_eq!(stats.frame_count(), 0);
        assert!(stats.average_frame_time_ms().abs() < f64::EPSILON);

        stats.record(Duration::from_millis(10));
        assert_eq!(stats.record(Duration::from_millis(20)), 2);
        assert!((stats.average_frame_time_ms() - 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_run_paced_stops_on_request() {
        let stop = StopSignal::new();
        let stats = FrameStats::new();
        let mut frames = Vec::new();

        run_paced(&stop, None, &stats, |tick| {
            frames.push(tick.frame);
            if tick.frame == 4 {
                stop.request_stop();
            }
            Ok(())
        })
        .unwrap();

        assert_eq!(frames, vec![0, 1, 2, 3, 4]);
        assert_eq!(stats.frame_count(), 5);
    }

    #[test]
    fn test_run_paced_first_delta_is_zero() {
        let stop = StopSignal::new();
        let stats = FrameStats::new();
        let mut deltas = Vec::new();

        run_paced(&stop, Some(Duration::from_millis(5)), &stats, |tick| {
            deltas.push(tick.delta_time);
            if deltas.len() == 3 {
                stop.request_stop();
            }
            Ok(())
        })
        .unwrap();

        assert!(deltas[0].abs() < f32::EPSILON);
        // Throttled frames are at least one interval apart.
        assert!(deltas[1] >= 0.004);
        assert!(deltas[2] >= 0.004);
    }

    #[test]
    fn test_run_paced_propagates_error() {
        let stop = StopSignal::new();
        let stats = FrameStats::new();

        let result = run_paced(&stop, None, &stats, |tick| {
            if tick.frame == 2 {
                Err(CoreError::Disconnected)
            } else {
                Ok(())
            }
        });

        assert!(matches!(result, Err(CoreError::Disconnected)));
        assert_eq!(stats.frame_count(), 2);
    }

    #[test]
    fn test_busy_frames_do_not_sleep() {
        let stop = StopSignal::new();
        let stats = FrameStats::new();
        let start = Instant::now();

        run_paced(&stop, Some(Duration::from_millis(1)), &stats, |tick| {
            std::thread::sleep(Duration::from_millis(3));
            if tick.frame == 2 {
                stop.request_stop();
            }
            Ok(())
        })
        .unwrap();

        // Three busy frames, no extra interval sleeps on top.
        assert!(start.elapsed() < Duration::from_secs(2));
        assert_eq!(stats.frame_count(), 3);
    }

    #[test]
    fn test_completes_interval() {
        let fired: Vec<u64> = (0..10)
            .map(|frame| FrameTick {
                frame,
                delta_time: 0.0,
            })
            .filter(|tick| tick.completes_interval(4))
            .map(|tick| tick.frame)
            .collect();
        assert_eq!(fired, vec![3, 7]);

        let first = FrameTick {
            frame: 0,
            delta_time: 0.0,
        };
        assert!(!first.completes_interval(0));
        assert!(first.completes_interval(1));
    }
}
