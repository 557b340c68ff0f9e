use chrono::{Duration, TimeZone, Utc};
use oto_types::{Clock, FixedClock, SystemClock};

#[test]
fn system_clock_tracks_wall_time() {
    let before = Utc::now();
    let now = SystemClock.now();
    let after = Utc::now();
    assert!(before <= now && now <= after);
}

#[test]
fn fixed_clock_is_stable() {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let clock = FixedClock::new(at);
    assert_eq!(clock.now(), at);
    assert_eq!(clock.now(), at);
}

#[test]
fn fixed_clock_advance_and_set() {
    let at = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
    let clock = FixedClock::new(at);

    clock.advance(Duration::days(2));
    assert_eq!(clock.now(), at + Duration::days(2));

    clock.set(at);
    assert_eq!(clock.now(), at);
}

#[test]
fn clock_is_object_safe() {
    let at = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let clock: Box<dyn Clock> = Box::new(FixedClock::new(at));
    assert_eq!(clock.now(), at);
}
