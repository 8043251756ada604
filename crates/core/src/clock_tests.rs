// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::TimeZone;

#[test]
fn fake_clock_advances_both_clocks() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::new(start);
    let before_instant = clock.now();

    clock.advance(chrono::Duration::seconds(30));

    assert_eq!(clock.utc_now(), start + chrono::Duration::seconds(30));
    assert!(clock.now() > before_instant);
}

#[test]
fn fake_clock_set_utc_does_not_move_instant() {
    let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let clock = FakeClock::new(start);
    let before_instant = clock.now();

    clock.set_utc(start + chrono::Duration::days(1));

    assert_eq!(clock.now(), before_instant);
    assert_eq!(clock.utc_now(), start + chrono::Duration::days(1));
}

#[test]
fn system_clock_moves_forward() {
    let clock = SystemClock;
    let a = clock.now();
    std::thread::sleep(std::time::Duration::from_millis(1));
    let b = clock.now();
    assert!(b > a);
}