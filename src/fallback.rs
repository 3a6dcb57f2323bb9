//! # Storm-Surge Fallback
//!
//! When a storm surge rides on the tide, the sea level series wiggles and the
//! trend-reversal scan finds many extrema in a few hours. The pairing of "last
//! low" and "last high" then means little. This module picks the tides in a
//! cruder but robust way: among all extrema within one M2 period of "now",
//! the highest is the next high tide and the lowest is the next low tide.
//!
//! ## Window
//! - **Default**: 12 h 25 min, the dominant semi-diurnal (M2) period
//! - **Reasoning**: the next low and next high must both happen within one period
//!
//! The heuristic is not exact (a surge peak can beat the astronomical high
//! water) but it keeps the forecast sensible through the storm.

use crate::{Extremum, ExtremumKind};
use chrono::{DateTime, Duration, Utc};

/// Low and high picked from a window of extrema.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindowedExtrema {
    pub low: Option<Extremum>,
    pub high: Option<Extremum>,
}

/// Pick the highest high and the lowest low of `extrema` no later than
/// `window` after `now`.
///
/// `extrema` must be in time order, as returned by [`crate::extrema::scan`];
/// the search stops at the first extremum past the window. On equal levels
/// the earliest extremum wins. Scanned extrema alternate in kind, so these
/// are also the global max/min of the window.
pub fn windowed_extrema(
    now: DateTime<Utc>,
    extrema: &[Extremum],
    window: Duration,
) -> WindowedExtrema {
    let mut low: Option<Extremum> = None;
    let mut high: Option<Extremum> = None;

    for e in extrema {
        if e.time - now > window {
            break;
        }
        match e.kind {
            ExtremumKind::High if high.map_or(true, |h| e.level > h.level) => high = Some(*e),
            ExtremumKind::Low if low.map_or(true, |l| e.level < l.level) => low = Some(*e),
            _ => {}
        }
    }

    WindowedExtrema { low, high }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 24, 6, 0, 0).unwrap()
    }

    fn ext(minutes: i64, level: f64, kind: ExtremumKind) -> Extremum {
        Extremum {
            time: now() + Duration::minutes(minutes),
            level,
            kind,
        }
    }

    fn m2() -> Duration {
        Duration::hours(12) + Duration::minutes(25)
    }

    #[test]
    fn picks_global_max_and_min_in_window() {
        let extrema = vec![
            ext(40, 3.1, ExtremumKind::High),
            ext(95, 2.8, ExtremumKind::Low),
            ext(150, 3.6, ExtremumKind::High),
            ext(260, 2.9, ExtremumKind::Low),
            ext(400, 1.2, ExtremumKind::Low),
            ext(520, 2.0, ExtremumKind::High),
            // Beyond 12h25m
            ext(760, 0.4, ExtremumKind::Low),
            ext(900, 4.5, ExtremumKind::High),
        ];

        let picked = windowed_extrema(now(), &extrema, m2());
        let high = picked.high.unwrap();
        let low = picked.low.unwrap();

        assert_eq!(high.level, 3.6);
        assert_eq!(high.time, now() + Duration::minutes(150));
        assert_eq!(high.kind, ExtremumKind::High);
        assert_eq!(low.level, 1.2);
        assert_eq!(low.time, now() + Duration::minutes(400));
        assert_eq!(low.kind, ExtremumKind::Low);
    }

    #[test]
    fn window_edge_is_inclusive() {
        let extrema = vec![ext(10, 2.0, ExtremumKind::High), ext(745, 0.5, ExtremumKind::Low)];
        let picked = windowed_extrema(now(), &extrema, m2());
        assert_eq!(picked.low.unwrap().level, 0.5);
    }

    #[test]
    fn earliest_wins_on_ties() {
        let extrema = vec![
            ext(60, 3.0, ExtremumKind::High),
            ext(120, 1.0, ExtremumKind::Low),
            ext(180, 3.0, ExtremumKind::High),
        ];
        let picked = windowed_extrema(now(), &extrema, m2());
        assert_eq!(picked.high.unwrap().time, now() + Duration::minutes(60));
    }

    #[test]
    fn lone_low_is_not_a_high() {
        let extrema = vec![ext(200, 1.1, ExtremumKind::Low)];
        let picked = windowed_extrema(now(), &extrema, m2());
        assert_eq!(picked.low.unwrap().level, 1.1);
        assert!(picked.high.is_none());
    }

    #[test]
    fn empty_window_gives_nothing() {
        let picked = windowed_extrema(now(), &[], m2());
        assert!(picked.low.is_none());
        assert!(picked.high.is_none());

        let late = vec![ext(800, 1.0, ExtremumKind::Low)];
        let picked = windowed_extrema(now(), &late, m2());
        assert!(picked.low.is_none());
    }
}
