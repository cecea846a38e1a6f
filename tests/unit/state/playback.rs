use super::*;

const LOOP: LoopMode = LoopMode {
    looping: true,
    ping_pong: false,
};
const PING_PONG: LoopMode = LoopMode {
    looping: false,
    ping_pong: true,
};
const ONCE: LoopMode = LoopMode {
    looping: false,
    ping_pong: false,
};

#[test]
fn loop_wraps_to_zero_at_the_last_frame() {
    let s = step(9, 10, Direction::Forward, LOOP);
    assert_eq!(
        s,
        Step {
            frame: 0,
            direction: Direction::Forward,
            stop: false
        }
    );
}

#[test]
fn ping_pong_reverses_at_both_ends() {
    let s = step(9, 10, Direction::Forward, PING_PONG);
    assert_eq!((s.frame, s.direction, s.stop), (8, Direction::Backward, false));
    let s = step(0, 10, Direction::Backward, PING_PONG);
    assert_eq!((s.frame, s.direction, s.stop), (1, Direction::Forward, false));
    let s = step(4, 10, Direction::Backward, PING_PONG);
    assert_eq!(s.frame, 3);
}

#[test]
fn ping_pong_wins_over_loop() {
    let both = LoopMode {
        looping: true,
        ping_pong: true,
    };
    assert_eq!(step(9, 10, Direction::Forward, both).frame, 8);
}

#[test]
fn single_frame_timelines_stay_put() {
    for mode in [LOOP, PING_PONG] {
        for dir in [Direction::Forward, Direction::Backward] {
            let s = step(0, 1, dir, mode);
            assert_eq!(s.frame, 0);
            assert!(!s.stop);
        }
    }
}

#[test]
fn without_loop_playback_stops_on_the_last_frame() {
    let s = step(9, 10, Direction::Forward, ONCE);
    assert_eq!((s.frame, s.stop), (9, true));
    assert_eq!(step(3, 10, Direction::Forward, ONCE).frame, 4);
}

#[test]
fn clock_carries_remainders() {
    let mut clock = PlaybackClock::default();
    assert_eq!(tick_interval(25), Duration::from_millis(40));
    assert_eq!(clock.advance(Duration::from_millis(30), 25), 0);
    assert_eq!(clock.advance(Duration::from_millis(30), 25), 1);
    assert_eq!(clock.pending(), Duration::from_millis(20));
    assert_eq!(clock.advance(Duration::from_millis(100), 25), 3);
    clock.reset();
    assert_eq!(clock.pending(), Duration::ZERO);
}
