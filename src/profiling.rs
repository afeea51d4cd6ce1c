//! Rolling timing statistics for the phases of a frame.

use std::time::Duration;

use circular_buffer::CircularBuffer;
use smallvec::SmallVec;
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{EnumCount, EnumIter, IntoStaticStr};
use thousands::Separable;

/// The number of durations kept per phase.
const TIMING_WINDOW_SIZE: usize = 30;

/// The timed phases of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumCount, EnumIter, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum FramePhase {
    /// The guest `update` call, including marshaling.
    Update,
    /// Applying the returned commands to the display.
    Apply,
    Render,
    /// The whole tick.
    Total,
}

/// A window of the most recent durations with mean and standard deviation.
#[derive(Debug, Default)]
pub struct TimingBuffer {
    buffer: CircularBuffer<TIMING_WINDOW_SIZE, Duration>,
}

impl TimingBuffer {
    pub fn add_timing(&mut self, duration: Duration) {
        self.buffer.push_back(duration);
    }

    pub fn most_recent(&self) -> Duration {
        self.buffer.back().copied().unwrap_or(Duration::ZERO)
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Mean and sample standard deviation, computed with Welford's algorithm.
    pub fn stats(&self) -> (Duration, Duration) {
        let mut sample_count = 0u32;
        let mut running_mean = 0.0f64;
        let mut sum_squared_diff = 0.0f64;

        for duration in self.buffer.iter() {
            let duration_secs = duration.as_secs_f64();
            sample_count += 1;

            let diff_from_mean = duration_secs - running_mean;
            running_mean += diff_from_mean / f64::from(sample_count);

            let diff_from_new_mean = duration_secs - running_mean;
            sum_squared_diff += diff_from_mean * diff_from_new_mean;
        }

        if sample_count == 0 {
            return (Duration::ZERO, Duration::ZERO);
        }

        let variance = if sample_count > 1 {
            sum_squared_diff / f64::from(sample_count - 1)
        } else {
            0.0
        };

        (
            Duration::from_secs_f64(running_mean.max(0.0)),
            Duration::from_secs_f64(variance.max(0.0).sqrt()),
        )
    }
}

/// One [`TimingBuffer`] per [`FramePhase`].
#[derive(Debug, Default)]
pub struct FrameTimings {
    phases: [TimingBuffer; FramePhase::COUNT],
}

impl FrameTimings {
    pub fn add_timing(&mut self, phase: FramePhase, duration: Duration) {
        self.phases[phase as usize].add_timing(duration);
    }

    pub fn phase(&self, phase: FramePhase) -> &TimingBuffer {
        &self.phases[phase as usize]
    }

    pub fn stats(&self) -> SmallVec<[(FramePhase, Duration, Duration); FramePhase::COUNT]> {
        FramePhase::iter()
            .map(|phase| {
                let (mean, std_dev) = self.phase(phase).stats();
                (phase, mean, std_dev)
            })
            .collect()
    }

    pub fn clear(&mut self) {
        self.phases.iter_mut().for_each(TimingBuffer::clear);
    }

    /// A one-line summary for periodic logging.
    pub fn summary(&self) -> String {
        let (total, _) = self.phase(FramePhase::Total).stats();
        let fps = match total.as_secs_f64() {
            secs if secs <= 0.0 => "∞".to_string(),
            secs => match 1.0 / secs {
                f if f > 100.0 => (f as u64).separate_with_commas(),
                f if f < 10.0 => format!("{f:.1}"),
                f => format!("{f:.0}"),
            },
        };

        let phases = self
            .stats()
            .into_iter()
            .map(|(phase, mean, std_dev)| {
                let name: &'static str = phase.into();
                format!("{name} {mean:.2?} ± {std_dev:.2?}")
            })
            .collect::<Vec<_>>()
            .join(", ");

        format!("{fps} ticks/s capacity ({phases})")
    }
}
