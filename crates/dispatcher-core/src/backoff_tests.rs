//! Unit tests for the pure backoff math (§8, property 4: backoff monotonicity).

use crate::registry::{UNKNOWN_WORKER_DELAY_SECONDS, UNKNOWN_WORKER_RETRY_SECONDS};
use crate::task::next_eligible_time;
use chrono::{TimeZone, Utc};

#[test]
fn backoff_is_monotonic_in_num_pushed() {
    let anchor = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let delay = 5;
    let retry = 30;

    let t0 = next_eligible_time(anchor, 0, delay, retry);
    let t1 = next_eligible_time(anchor, 1, delay, retry);
    let t2 = next_eligible_time(anchor, 2, delay, retry);

    assert_eq!((t1 - t0).num_seconds(), retry);
    assert_eq!((t2 - t1).num_seconds(), retry);
    assert_eq!((t0 - anchor).num_seconds(), delay);
}

#[test]
fn zero_pushes_applies_only_delay() {
    let anchor = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let t0 = next_eligible_time(anchor, 0, 7, 200);
    assert_eq!((t0 - anchor).num_seconds(), 7);
}

#[test]
fn unknown_worker_fallback_matches_documented_default() {
    // The source never documents this special case; §9 records the decision
    // to keep it rather than invent a different fallback.
    assert_eq!(UNKNOWN_WORKER_RETRY_SECONDS, 200);
    assert_eq!(UNKNOWN_WORKER_DELAY_SECONDS, 0);
}
