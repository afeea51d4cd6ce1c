use std::time::Duration;

use pretty_assertions::assert_eq;
use quickcart::profiling::{FramePhase, FrameTimings, TimingBuffer};
use speculoos::prelude::*;

#[test]
fn test_empty_buffer_has_zero_stats() {
    let buffer = TimingBuffer::default();

    assert_that(&buffer.is_empty()).is_true();
    assert_eq!(buffer.stats(), (Duration::ZERO, Duration::ZERO));
    assert_that(&buffer.most_recent()).is_equal_to(Duration::ZERO);
}

#[test]
fn test_mean_and_deviation() {
    let mut buffer = TimingBuffer::default();
    for millis in [2, 4, 4, 4, 5, 5, 7, 9] {
        buffer.add_timing(Duration::from_millis(millis));
    }

    let (mean, std_dev) = buffer.stats();

    assert_that(&((mean.as_secs_f64() - 0.005).abs() < 1e-9)).is_true();
    // Sample standard deviation of the series is sqrt(32 / 7) ms.
    assert_that(&((std_dev.as_secs_f64() * 1000.0 - (32.0f64 / 7.0).sqrt()).abs() < 1e-6)).is_true();
    assert_that(&buffer.most_recent()).is_equal_to(Duration::from_millis(9));
}

#[test]
fn test_window_keeps_only_recent_samples() {
    let mut buffer = TimingBuffer::default();
    for _ in 0..100 {
        buffer.add_timing(Duration::from_millis(1));
    }
    for _ in 0..30 {
        buffer.add_timing(Duration::from_millis(3));
    }

    assert_that(&buffer.len()).is_equal_to(30);
    assert_that(&((buffer.stats().0.as_secs_f64() - 0.003).abs() < 1e-9)).is_true();
}

#[test]
fn test_phases_are_tracked_separately() {
    let mut timings = FrameTimings::default();
    timings.add_timing(FramePhase::Update, Duration::from_millis(4));
    timings.add_timing(FramePhase::Render, Duration::from_millis(1));

    assert_that(&timings.phase(FramePhase::Update).most_recent()).is_equal_to(Duration::from_millis(4));
    assert_that(&timings.phase(FramePhase::Apply).is_empty()).is_true();
    assert_that(&timings.stats().len()).is_equal_to(4);
    assert_that(&timings.summary()).contains("update");

    timings.clear();
    assert_that(&timings.phase(FramePhase::Update).is_empty()).is_true();
}
