use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use quickcart::game::events::{DeferredQueue, DeferredTask};
use quickcart::profiling::FramePhase;
use quickcart::scheduler::{FrameScheduler, SchedulerState, TickKind};
use speculoos::prelude::*;

const PERIOD: Duration = Duration::from_millis(16);

fn tick(scheduler: &mut FrameScheduler, now: Instant) -> Option<TickKind> {
    let kind = scheduler.begin_tick(now);
    if kind.is_some() {
        scheduler.end_tick(now);
    }
    kind
}

#[test]
fn test_stopped_scheduler_never_ticks() {
    let mut scheduler = FrameScheduler::new(PERIOD);
    let now = Instant::now();

    assert_that(&scheduler.state()).is_equal_to(SchedulerState::Stopped);
    assert_that(&scheduler.next_tick()).is_none();
    assert_that(&tick(&mut scheduler, now)).is_none();
    assert_that(&scheduler.time_until_next(now)).is_none();
}

#[test]
fn test_first_update_has_zero_delta() {
    let mut scheduler = FrameScheduler::new(PERIOD);
    let now = Instant::now();

    assert_that(&scheduler.start(now)).is_true();
    assert_eq!(tick(&mut scheduler, now), Some(TickKind::Update { delta: 0.0 }));
    assert_eq!(
        tick(&mut scheduler, now + PERIOD),
        Some(TickKind::Update {
            delta: PERIOD.as_secs_f64()
        })
    );
    assert_that(&scheduler.frame_count()).is_equal_to(2);
}

#[test]
fn test_start_twice_keeps_the_pending_tick() {
    let mut scheduler = FrameScheduler::new(PERIOD);
    let now = Instant::now();

    scheduler.start(now);
    assert_that(&scheduler.start(now + PERIOD * 10)).is_false();
    assert_that(&scheduler.next_tick()).is_equal_to(Some(now));
}

#[test]
fn test_ticks_are_not_early() {
    let mut scheduler = FrameScheduler::new(PERIOD);
    let now = Instant::now();
    scheduler.start(now);
    tick(&mut scheduler, now);

    assert_that(&scheduler.next_tick()).is_equal_to(Some(now + PERIOD));
    assert_that(&scheduler.time_until_next(now)).is_equal_to(Some(PERIOD));
    assert_that(&tick(&mut scheduler, now + PERIOD / 2)).is_none();
    assert_that(&tick(&mut scheduler, now + PERIOD).is_some()).is_true();
}

#[test]
fn test_no_tick_is_scheduled_while_one_is_in_flight() {
    let mut scheduler = FrameScheduler::new(PERIOD);
    let now = Instant::now();
    scheduler.start(now);

    assert_that(&scheduler.begin_tick(now).is_some()).is_true();
    assert_that(&scheduler.next_tick()).is_none();
    assert_that(&scheduler.begin_tick(now + PERIOD)).is_none();

    scheduler.end_tick(now + Duration::from_millis(3));
    assert_that(&scheduler.next_tick()).is_equal_to(Some(now + PERIOD));
}

#[test]
fn test_stop_cancels_the_pending_tick() {
    let mut scheduler = FrameScheduler::new(PERIOD);
    let now = Instant::now();
    scheduler.start(now);
    tick(&mut scheduler, now);

    assert_that(&scheduler.stop()).is_true();
    assert_that(&scheduler.next_tick()).is_none();
    assert_that(&tick(&mut scheduler, now + PERIOD * 5)).is_none();
    assert_that(&scheduler.stop()).is_false();
}

#[test]
fn test_stop_during_a_tick_schedules_nothing() {
    let mut scheduler = FrameScheduler::new(PERIOD);
    let now = Instant::now();
    scheduler.start(now);

    scheduler.begin_tick(now);
    scheduler.stop();
    scheduler.end_tick(now);

    assert_that(&scheduler.next_tick()).is_none();
}

#[test]
fn test_paused_ticks_only_render() {
    let mut scheduler = FrameScheduler::new(PERIOD);
    let now = Instant::now();
    scheduler.start(now);
    tick(&mut scheduler, now);

    assert_that(&scheduler.pause()).is_true();
    assert_that(&scheduler.is_paused()).is_true();
    assert_that(&scheduler.is_running()).is_true();
    assert_eq!(tick(&mut scheduler, now + PERIOD), Some(TickKind::RenderOnly));
    assert_that(&scheduler.frame_count()).is_equal_to(1);
}

#[test]
fn test_unpause_does_not_leak_paused_time() {
    let mut scheduler = FrameScheduler::new(PERIOD);
    let now = Instant::now();
    scheduler.start(now);
    tick(&mut scheduler, now);
    scheduler.pause();
    let mut later = now + PERIOD;
    for _ in 0..100 {
        tick(&mut scheduler, later);
        later += PERIOD;
    }

    assert_that(&scheduler.unpause()).is_true();
    assert_eq!(tick(&mut scheduler, later), Some(TickKind::Update { delta: 0.0 }));
    assert_eq!(
        tick(&mut scheduler, later + PERIOD),
        Some(TickKind::Update {
            delta: PERIOD.as_secs_f64()
        })
    );
}

#[test]
fn test_pause_and_unpause_need_the_right_state() {
    let mut scheduler = FrameScheduler::new(PERIOD);
    assert_that(&scheduler.pause()).is_false();
    assert_that(&scheduler.unpause()).is_false();

    scheduler.start(Instant::now());
    assert_that(&scheduler.unpause()).is_false();
    assert_that(&scheduler.pause()).is_true();
    assert_that(&scheduler.pause()).is_false();
    assert_that(&scheduler.state()).is_equal_to(SchedulerState::Paused);
}

#[test]
fn test_reset_timing_restarts_delta_and_frame_count() {
    let mut scheduler = FrameScheduler::new(PERIOD);
    let now = Instant::now();
    scheduler.start(now);
    tick(&mut scheduler, now);
    tick(&mut scheduler, now + PERIOD);

    scheduler.reset_timing();

    assert_that(&scheduler.frame_count()).is_equal_to(0);
    assert_that(&scheduler.timings().phase(FramePhase::Total).is_empty()).is_true();
    assert_eq!(tick(&mut scheduler, now + PERIOD * 2), Some(TickKind::Update { delta: 0.0 }));
}

#[test]
fn test_total_time_is_recorded() {
    let mut scheduler = FrameScheduler::new(PERIOD);
    let now = Instant::now();
    scheduler.start(now);

    scheduler.begin_tick(now);
    scheduler.record(FramePhase::Update, Duration::from_millis(2));
    scheduler.end_tick(now + Duration::from_millis(5));

    assert_that(&scheduler.timings().phase(FramePhase::Update).most_recent()).is_equal_to(Duration::from_millis(2));
    assert_that(&scheduler.timings().phase(FramePhase::Total).most_recent()).is_equal_to(Duration::from_millis(5));
}

#[test]
fn test_deferred_tasks_run_in_queue_order_once_due() {
    let now = Instant::now();
    let mut queue = DeferredQueue::default();
    queue.schedule(now + PERIOD, DeferredTask::FirstFrame);
    queue.schedule(now, DeferredTask::SubmitScore(10));
    queue.schedule(now, DeferredTask::FetchLeaderboard);

    assert_that(&queue.next_due()).is_equal_to(Some(now));
    assert_eq!(
        queue.take_due(now).to_vec(),
        vec![DeferredTask::SubmitScore(10), DeferredTask::FetchLeaderboard]
    );

    queue.cancel(DeferredTask::FirstFrame);
    assert_that(&queue.is_empty()).is_true();
    assert_that(&queue.take_due(now + PERIOD).is_empty()).is_true();
}
