use std::{cell::RefCell, rc::Rc};

use super::*;
use crate::{
    event::{GestureDetail, GestureEvent, GestureKind, SwipeDirection},
    timing::TimerKind,
    types::{Point, RawContact},
};

fn frame(kind: RawTouchKind, t_ms: u64, contacts: &[(i64, f32, f32)]) -> RawTouchFrame {
    RawTouchFrame::new(
        kind,
        t_ms,
        contacts
            .iter()
            .map(|&(id, x, y)| RawContact { id, x, y })
            .collect(),
    )
}

fn start(t_ms: u64, contacts: &[(i64, f32, f32)]) -> RawTouchFrame {
    frame(RawTouchKind::Start, t_ms, contacts)
}

fn moved(t_ms: u64, contacts: &[(i64, f32, f32)]) -> RawTouchFrame {
    frame(RawTouchKind::Move, t_ms, contacts)
}

fn end(t_ms: u64, contacts: &[(i64, f32, f32)]) -> RawTouchFrame {
    frame(RawTouchKind::End, t_ms, contacts)
}

fn kinds(output: &GestureOutput) -> Vec<GestureKind> {
    output.kinds().collect()
}

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn single_tap_is_emitted_when_window_elapses() {
    let mut engine = GestureEngine::default();

    assert!(engine.handle(&start(0, &[(1, 100.0, 100.0)])).is_empty());
    assert_eq!(engine.state(), SessionState::Touching);
    assert!(engine.long_press_scheduled());

    assert!(engine.handle(&end(80, &[])).is_empty());
    assert_eq!(engine.state(), SessionState::Idle);
    assert!(!engine.long_press_scheduled());
    assert_eq!(engine.next_deadline(), Some(380));

    assert!(engine.advance(379).is_empty());
    let fired = engine.advance(380);
    assert_eq!(kinds(&fired), vec![GestureKind::Tap]);
    let event = fired.events[0];
    assert_eq!(event.t_ms, 380);
    match event.detail {
        GestureDetail::Tap(detail) => {
            assert_eq!(detail.tap_count, 1);
            assert_eq!(detail.duration_ms, 80);
            assert_eq!(detail.position, Point::new(100.0, 100.0));
        }
        other => panic!("unexpected detail {other:?}"),
    }

    assert!(engine.advance(5_000).is_empty());
    assert_eq!(engine.next_deadline(), None);
}

#[test]
fn double_tap_suppresses_single_tap() {
    let mut engine = GestureEngine::default();
    let mut all = Vec::new();

    all.extend(kinds(&engine.handle(&start(0, &[(1, 50.0, 50.0)]))));
    all.extend(kinds(&engine.handle(&end(60, &[]))));
    all.extend(kinds(&engine.handle(&start(150, &[(1, 52.0, 51.0)]))));
    let second = engine.handle(&end(210, &[]));
    all.extend(kinds(&second));
    all.extend(kinds(&engine.advance(2_000)));

    assert_eq!(all, vec![GestureKind::DoubleTap]);
    assert_eq!(second.events[0].t_ms, 210);
    assert!(matches!(
        second.events[0].detail,
        GestureDetail::DoubleTap(detail) if detail.tap_count == 2
    ));
}

#[test]
fn third_tap_in_window_is_multi_tap() {
    let mut engine = GestureEngine::default();
    for (down, up) in [(0, 50), (120, 170)] {
        engine.handle(&start(down, &[(1, 10.0, 10.0)]));
        engine.handle(&end(up, &[]));
    }
    engine.handle(&start(250, &[(1, 10.0, 10.0)]));
    let third = engine.handle(&end(300, &[]));

    assert_eq!(kinds(&third), vec![GestureKind::MultiTap]);
    assert!(matches!(
        third.events[0].detail,
        GestureDetail::MultiTap(detail) if detail.tap_count == 3
    ));
    assert_eq!(engine.tap_count(), 3);
}

#[test]
fn ten_degree_swipe_classifies_right() {
    let mut engine = GestureEngine::default();
    let rad = 10.0f32.to_radians();
    let (cos, sin) = (rad.cos(), rad.sin());

    engine.handle(&start(0, &[(4, 100.0, 100.0)]));
    let crossing = engine.handle(&moved(16, &[(4, 100.0 + 60.0 * cos, 100.0 + 60.0 * sin)]));
    let further = engine.handle(&moved(32, &[(4, 100.0 + 80.0 * cos, 100.0 + 80.0 * sin)]));
    let release = engine.handle(&end(48, &[]));

    assert_eq!(kinds(&crossing), vec![GestureKind::SwipeStart]);
    assert_eq!(kinds(&further), vec![GestureKind::SwipeMove]);
    assert_eq!(kinds(&release), vec![GestureKind::SwipeEnd]);
    assert!(!engine.long_press_scheduled());

    for event in crossing.iter().chain(further.iter()).chain(release.iter()) {
        let (GestureDetail::SwipeStart(detail)
        | GestureDetail::SwipeMove(detail)
        | GestureDetail::SwipeEnd(detail)) = event.detail
        else {
            panic!("unexpected detail {:?}", event.detail);
        };
        assert_eq!(detail.direction, SwipeDirection::Right);
        assert!(detail.velocity.x > 0.0);
    }
    assert!(engine.advance(5_000).is_empty());
}

#[test]
fn pinch_from_100_to_130_px() {
    let mut engine = GestureEngine::default();

    assert!(engine
        .handle(&start(0, &[(1, 100.0, 200.0), (2, 200.0, 200.0)]))
        .is_empty());
    assert!(!engine.long_press_scheduled());

    let spread = engine.handle(&moved(16, &[(1, 85.0, 200.0), (2, 215.0, 200.0)]));
    assert_eq!(
        kinds(&spread),
        vec![GestureKind::PinchStart, GestureKind::PinchMove]
    );
    let GestureDetail::PinchMove(detail) = spread.events[1].detail else {
        panic!("expected pinchmove");
    };
    assert!(approx(detail.scale, 1.3));
    assert!(approx(detail.center.x, 150.0));
    assert_eq!(engine.state(), SessionState::Pinching);

    let release = engine.handle(&end(32, &[]));
    assert_eq!(kinds(&release), vec![GestureKind::PinchEnd]);
    let GestureDetail::PinchEnd(detail) = release.events[0].detail else {
        panic!("expected pinchend");
    };
    assert!(approx(detail.scale, 1.3));
    assert!(engine.advance(5_000).is_empty());
}

#[test]
fn ten_degree_rotation_without_pinch() {
    let mut engine = GestureEngine::default();
    let rad = 10.0f32.to_radians();

    engine.handle(&start(0, &[(1, 100.0, 100.0), (2, 200.0, 100.0)]));
    let turned = engine.handle(&moved(
        16,
        &[(1, 100.0, 100.0), (2, 100.0 + 100.0 * rad.cos(), 100.0 + 100.0 * rad.sin())],
    ));

    assert_eq!(
        kinds(&turned),
        vec![GestureKind::RotateStart, GestureKind::RotateMove]
    );
    let GestureDetail::RotateMove(detail) = turned.events[1].detail else {
        panic!("expected rotatemove");
    };
    assert!(approx(detail.rotation_deg, 10.0));
    assert_eq!(engine.state(), SessionState::Rotating);

    let release = engine.handle(&end(32, &[]));
    assert_eq!(kinds(&release), vec![GestureKind::RotateEnd]);
}

#[test]
fn pinch_and_rotation_together_emit_pinch_first() {
    let mut engine = GestureEngine::default();
    let rad = 20.0f32.to_radians();

    engine.handle(&start(0, &[(1, 100.0, 100.0), (2, 200.0, 100.0)]));
    let both = engine.handle(&moved(
        16,
        &[(1, 100.0, 100.0), (2, 100.0 + 130.0 * rad.cos(), 100.0 + 130.0 * rad.sin())],
    ));
    assert_eq!(
        kinds(&both),
        vec![
            GestureKind::PinchStart,
            GestureKind::PinchMove,
            GestureKind::RotateStart,
            GestureKind::RotateMove
        ]
    );

    let release = engine.handle(&end(32, &[]));
    assert_eq!(
        kinds(&release),
        vec![GestureKind::PinchEnd, GestureKind::RotateEnd]
    );
}

#[test]
fn rotation_gains_pinch_overlay() {
    let mut engine = GestureEngine::default();
    let rad = 10.0f32.to_radians();

    engine.handle(&start(0, &[(1, 100.0, 100.0), (2, 200.0, 100.0)]));
    engine.handle(&moved(
        16,
        &[(1, 100.0, 100.0), (2, 100.0 + 100.0 * rad.cos(), 100.0 + 100.0 * rad.sin())],
    ));
    let spread = engine.handle(&moved(
        32,
        &[(1, 100.0, 100.0), (2, 100.0 + 150.0 * rad.cos(), 100.0 + 150.0 * rad.sin())],
    ));

    assert_eq!(
        kinds(&spread),
        vec![
            GestureKind::PinchStart,
            GestureKind::PinchMove,
            GestureKind::RotateMove
        ]
    );
    assert_eq!(engine.state(), SessionState::Pinching);
    assert!(engine.session().rotate_active());

    let release = engine.handle(&end(48, &[]));
    assert_eq!(
        kinds(&release),
        vec![GestureKind::PinchEnd, GestureKind::RotateEnd]
    );
}

#[test]
fn movement_past_tap_threshold_cancels_long_press() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0)]));
    assert!(engine.long_press_scheduled());
    assert!(engine.handle(&moved(100, &[(1, 115.0, 100.0)])).is_empty());
    assert!(!engine.long_press_scheduled());
    assert_eq!(engine.state(), SessionState::Touching);

    assert!(engine.advance(600).is_empty());
    assert!(engine.handle(&end(700, &[])).is_empty());
    assert!(engine.advance(5_000).is_empty());
}

#[test]
fn long_press_blocks_tap_and_swipe() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0)]));
    let fired = engine.advance(500);
    assert_eq!(kinds(&fired), vec![GestureKind::LongPress]);
    assert!(matches!(
        fired.events[0].detail,
        GestureDetail::LongPress(detail) if detail.duration_ms == 500
    ));

    assert!(engine.handle(&moved(600, &[(1, 200.0, 100.0)])).is_empty());
    assert!(engine.handle(&end(800, &[])).is_empty());
    assert!(engine.advance(5_000).is_empty());
    assert_eq!(engine.state(), SessionState::Idle);
}

#[test]
fn due_timer_fires_before_the_frame() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0)]));
    let output = engine.handle(&moved(520, &[(1, 102.0, 100.0)]));

    assert_eq!(kinds(&output), vec![GestureKind::LongPress]);
    assert_eq!(output.events[0].t_ms, 500);
}

#[test]
fn stale_timer_token_is_ignored() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0)]));
    let token = engine.pending_timers()[0].token;
    assert_eq!(token.kind, TimerKind::LongPress);

    engine.handle(&moved(10, &[(1, 125.0, 100.0)]));
    assert!(engine.fire_timer(token, 500).is_empty());
    assert_eq!(engine.state(), SessionState::Touching);
}

#[test]
fn host_scheduled_fire_emits_long_press() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0)]));
    let token = engine.pending_timers()[0].token;

    let output = engine.fire_timer(token, 490);
    assert_eq!(kinds(&output), vec![GestureKind::LongPress]);
    assert!(engine.fire_timer(token, 500).is_empty());
}

#[test]
fn cancel_is_idempotent_and_clears_timers() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0)]));
    let first = engine.cancel(50);
    assert_eq!(kinds(&first), vec![GestureKind::Cancel]);
    assert_eq!(engine.state(), SessionState::Idle);
    assert!(engine.pending_timers().is_empty());

    assert!(engine.cancel(60).is_empty());
    assert!(engine.advance(5_000).is_empty());
}

#[test]
fn cancel_drops_held_tap() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0)]));
    engine.handle(&end(50, &[]));
    engine.handle(&start(100, &[(1, 100.0, 100.0)]));
    assert_eq!(kinds(&engine.cancel(120)), vec![GestureKind::Cancel]);
    assert!(engine.advance(5_000).is_empty());
    assert_eq!(engine.tap_count(), 0);
}

#[test]
fn second_contact_voids_tap() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0)]));
    engine.handle(&moved(20, &[(1, 100.0, 100.0), (2, 150.0, 100.0)]));
    assert!(!engine.long_press_scheduled());
    engine.handle(&moved(40, &[(1, 100.0, 100.0)]));

    assert!(engine.handle(&end(60, &[])).is_empty());
    assert!(engine.advance(5_000).is_empty());
}

#[test]
fn two_finger_tap_with_staggered_release_emits_nothing() {
    let mut engine = GestureEngine::default();

    assert!(engine
        .handle(&start(0, &[(1, 100.0, 100.0), (2, 220.0, 100.0)]))
        .is_empty());
    assert!(engine.handle(&end(40, &[(1, 100.0, 100.0)])).is_empty());
    assert_eq!(engine.state(), SessionState::Touching);
    assert!(engine.handle(&end(60, &[])).is_empty());

    assert_eq!(engine.state(), SessionState::Idle);
    assert!(engine.advance(5_000).is_empty());
}

#[test]
fn finger_swap_mid_swipe_is_not_motion() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0)]));
    let crossing = engine.handle(&moved(16, &[(1, 170.0, 100.0)]));
    assert_eq!(kinds(&crossing), vec![GestureKind::SwipeStart]);

    assert!(engine
        .handle(&moved(32, &[(1, 170.0, 100.0), (2, 0.0, 100.0)]))
        .is_empty());
    assert!(engine.handle(&moved(48, &[(2, 0.0, 100.0)])).is_empty());
    assert_eq!(engine.state(), SessionState::Swiping);

    let resumed = engine.handle(&moved(64, &[(2, 20.0, 100.0)]));
    assert_eq!(kinds(&resumed), vec![GestureKind::SwipeMove]);
    let GestureDetail::SwipeMove(detail) = resumed.events[0].detail else {
        panic!("expected swipemove");
    };
    assert_eq!(detail.direction, SwipeDirection::Right);
    assert!(approx(detail.delta_x, 90.0));

    let release = engine.handle(&end(80, &[]));
    let GestureDetail::SwipeEnd(detail) = release.events[0].detail else {
        panic!("expected swipeend");
    };
    assert_eq!(detail.direction, SwipeDirection::Right);
}

fn assert_cancel_resets(engine: &mut GestureEngine, now_ms: u64) {
    assert_eq!(kinds(&engine.cancel(now_ms)), vec![GestureKind::Cancel]);
    assert_eq!(engine.state(), SessionState::Idle);
    assert!(engine.pending_timers().is_empty());
    assert!(engine.handle(&end(now_ms + 10, &[])).is_empty());
    assert!(engine.advance(now_ms + 5_000).is_empty());
}

#[test]
fn cancel_while_swiping_skips_swipe_end() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0)]));
    engine.handle(&moved(16, &[(1, 170.0, 100.0)]));
    assert_eq!(engine.state(), SessionState::Swiping);

    assert_cancel_resets(&mut engine, 32);
}

#[test]
fn cancel_while_pinching_skips_pinch_end() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 200.0), (2, 200.0, 200.0)]));
    engine.handle(&moved(16, &[(1, 85.0, 200.0), (2, 215.0, 200.0)]));
    assert_eq!(engine.state(), SessionState::Pinching);

    assert_cancel_resets(&mut engine, 32);
}

#[test]
fn cancel_while_rotating_skips_rotate_end() {
    let mut engine = GestureEngine::default();
    let rad = 10.0f32.to_radians();

    engine.handle(&start(0, &[(1, 100.0, 100.0), (2, 200.0, 100.0)]));
    engine.handle(&moved(
        16,
        &[(1, 100.0, 100.0), (2, 100.0 + 100.0 * rad.cos(), 100.0 + 100.0 * rad.sin())],
    ));
    assert_eq!(engine.state(), SessionState::Rotating);

    assert_cancel_resets(&mut engine, 32);
}

#[test]
fn held_tap_flushes_before_swipe() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0)]));
    engine.handle(&end(50, &[]));
    engine.handle(&start(100, &[(1, 100.0, 100.0)]));
    let output = engine.handle(&moved(116, &[(1, 170.0, 100.0)]));

    assert_eq!(
        kinds(&output),
        vec![GestureKind::Tap, GestureKind::SwipeStart]
    );
    assert!(engine.advance(5_000).is_empty());
}

#[test]
fn swipe_ends_before_pinch_takes_over() {
    let mut engine = GestureEngine::default();
    let mut all = Vec::new();

    all.extend(kinds(&engine.handle(&start(0, &[(1, 100.0, 100.0)]))));
    all.extend(kinds(&engine.handle(&moved(16, &[(1, 170.0, 100.0)]))));
    all.extend(kinds(
        &engine.handle(&moved(32, &[(1, 170.0, 100.0), (2, 270.0, 100.0)])),
    ));
    assert_eq!(engine.state(), SessionState::Swiping);
    all.extend(kinds(
        &engine.handle(&moved(48, &[(1, 160.0, 100.0), (2, 290.0, 100.0)])),
    ));
    all.extend(kinds(&engine.handle(&end(64, &[]))));

    assert_eq!(
        all,
        vec![
            GestureKind::SwipeStart,
            GestureKind::SwipeEnd,
            GestureKind::PinchStart,
            GestureKind::PinchMove,
            GestureKind::PinchEnd
        ]
    );
}

#[test]
fn two_finger_baseline_is_retaken_after_a_lift() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0), (2, 200.0, 100.0)]));
    engine.handle(&moved(16, &[(1, 80.0, 100.0), (2, 220.0, 100.0)]));
    assert_eq!(engine.state(), SessionState::Pinching);

    assert!(engine.handle(&moved(32, &[(1, 80.0, 100.0)])).is_empty());
    assert!(engine.session().two_finger().is_none());
    assert!(engine
        .handle(&moved(48, &[(1, 80.0, 100.0), (3, 130.0, 100.0)]))
        .is_empty());

    let output = engine.handle(&moved(64, &[(1, 80.0, 100.0), (3, 180.0, 100.0)]));
    assert_eq!(kinds(&output), vec![GestureKind::PinchMove]);
    let GestureDetail::PinchMove(detail) = output.events[0].detail else {
        panic!("expected pinchmove");
    };
    assert!(approx(detail.scale, 2.0));
}

#[test]
fn non_finite_frame_ends_the_touch() {
    let mut engine = GestureEngine::default();

    engine.handle(&start(0, &[(1, 100.0, 100.0)]));
    assert!(engine.handle(&moved(50, &[(1, f32::NAN, 100.0)])).is_empty());
    assert_eq!(engine.state(), SessionState::Idle);
    assert_eq!(kinds(&engine.advance(5_000)), vec![GestureKind::Tap]);
}

#[test]
fn subscribers_see_returned_events() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut engine = GestureEngine::default().with_target(TargetRef(42));
    let sink = Rc::clone(&seen);
    engine.dispatcher_mut().subscribe_fn(move |event| {
        sink.borrow_mut().push((event.kind(), event.target));
        Ok(())
    });

    engine.handle(&start(0, &[(1, 10.0, 10.0)]));
    engine.handle(&end(40, &[]));
    let fired = engine.advance(1_000);

    assert_eq!(fired.events[0].target, TargetRef(42));
    assert_eq!(*seen.borrow(), vec![(GestureKind::Tap, TargetRef(42))]);
}

#[test]
fn invalid_config_is_rejected() {
    let config = GestureConfig {
        multi_tap_window_ms: 0,
        ..GestureConfig::default()
    };
    assert!(matches!(
        GestureEngine::new(config),
        Err(ConfigError::Invalid(_))
    ));
}

#[test]
fn replay_is_deterministic() {
    let script = [
        start(0, &[(1, 100.0, 100.0)]),
        end(60, &[]),
        start(400, &[(1, 100.0, 100.0), (2, 200.0, 100.0)]),
        moved(416, &[(1, 90.0, 100.0), (2, 230.0, 100.0)]),
        end(432, &[]),
        start(600, &[(1, 100.0, 100.0)]),
    ];
    let run = || {
        let mut engine = GestureEngine::default();
        let mut events = Vec::new();
        for frame in &script {
            events.extend(engine.handle(frame));
        }
        events.extend(engine.advance(2_000));
        events
    };

    let first = run();
    assert_eq!(first, run());
    assert_eq!(
        first.iter().map(GestureEvent::kind).collect::<Vec<_>>(),
        vec![
            GestureKind::Tap,
            GestureKind::PinchStart,
            GestureKind::PinchMove,
            GestureKind::PinchEnd,
            GestureKind::LongPress
        ]
    );
}
