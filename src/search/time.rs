/*
 * paulchen, a UCI-compatible chess engine
 * Copyright (C) 2024 Jasper Shovelton
 *
 * paulchen is free software: you can redistribute it and/or modify it under
 * the terms of the GNU General Public License as published by the Free
 * Software Foundation, either version 3 of the License, or (at your option)
 * any later version.
 *
 * paulchen is distributed in the hope that it will be useful, but WITHOUT ANY
 * WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
 * FOR A PARTICULAR PURPOSE. See the GNU General Public License for more
 * details.
 *
 * You should have received a copy of the GNU General Public License along
 * with paulchen. If not, see <https://www.gnu.org/licenses/>.
 */

//! Wall-clock time budgeting for a timed search.

use std::time::Duration;

/// Assumed moves remaining until the next time control, when the GUI
/// doesn't tell us.
const DEFAULT_MOVES_TO_GO: u32 = 30;

/// The two thresholds iterative deepening is driven by: it may stop
/// between iterations once `min_think` has elapsed, and must stop by
/// `max_think`.
#[derive(Clone, Copy)]
pub struct TimeWindow {
    /// Iterative deepening will not start a new iteration once elapsed time
    /// exceeds this.
    pub min_think: Duration,
    /// The hard deadline: a watchdog fires at this point regardless of
    /// iteration boundaries.
    pub max_think: Duration,
    /// The most time that could ever be spent on this move without eating
    /// into the safety margin, the ceiling [`extend`] is capped at.
    pub usable: Duration,
}

/// Computes the thinking-time window for `remaining` time left on the
/// clock, `inc` gained per move, and `moves_to_go` moves until the next
/// time control (assumed [`DEFAULT_MOVES_TO_GO`] if unknown).
#[must_use]
pub fn calculate_time_window(
    remaining: Duration,
    inc: Duration,
    moves_to_go: Option<u32>,
    move_overhead: Duration,
) -> TimeWindow {
    let moves_to_go = moves_to_go.unwrap_or(DEFAULT_MOVES_TO_GO).max(1);
    let remaining = remaining.saturating_sub(move_overhead);

    let inc_ms = inc.as_millis().min(20);
    let safety_per_move = 20u128.saturating_sub(inc_ms);
    let safety = Duration::from_millis(
        u64::try_from(safety_per_move * u128::from(moves_to_go) + 40).unwrap_or(u64::MAX),
    );

    let usable = remaining.checked_sub(safety).unwrap_or(remaining / 2);

    let candidate_ms =
        (remaining.as_millis() + inc.as_millis() * u128::from(moves_to_go)) / u128::from(moves_to_go);
    let candidate = Duration::from_millis(u64::try_from(candidate_ms).unwrap_or(u64::MAX));

    let max_think = usable.min(candidate);
    let min_think = max_think.mul_f64(0.7);

    TimeWindow { min_think, max_think, usable }
}

/// Extends `max_think` by `2 * elapsed`, capped at `usable`, used when an
/// iteration fails low or returns a surprisingly bad evaluation and more
/// time is warranted before committing to the result.
#[must_use]
pub fn extend(max_think: Duration, elapsed: Duration, usable: Duration) -> Duration {
    max_think
        .saturating_add(elapsed.saturating_add(elapsed))
        .min(usable)
}

#[cfg(test)]
mod tests {
    use super::calculate_time_window;
    use std::time::Duration;

    #[test]
    fn min_think_is_seventy_percent_of_max() {
        let window = calculate_time_window(
            Duration::from_secs(60),
            Duration::from_millis(500),
            Some(30),
            Duration::from_millis(10),
        );
        let ratio = window.min_think.as_secs_f64() / window.max_think.as_secs_f64();
        assert!((ratio - 0.7).abs() < 1e-9);
    }

    #[test]
    fn low_time_never_produces_a_negative_window() {
        let window = calculate_time_window(
            Duration::from_millis(5),
            Duration::ZERO,
            None,
            Duration::from_millis(10),
        );
        assert!(window.max_think >= Duration::ZERO);
    }
}
