//! Pure turn-advance computation for snake drafts. No I/O; the coordinator
//! calls this inside its transaction and persists the result.

use chrono::{DateTime, Duration, Utc};

/// Buffer added to every deadline to absorb the ~1s clock polling
/// granularity and broadcast latency. One constant for the start, human
/// pick, and timeout paths alike.
pub const GRACE_SECONDS: i64 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnAdvance {
    InProgress {
        round: i64,
        pick: i64,
        next_drafter: i64,
        next_pick_time: DateTime<Utc>,
    },
    /// The advanced round exceeds `total_rounds`; the draft is over.
    Completed,
}

/// Who is on the clock at a given (round, pick). Odd rounds run the order
/// forward, even rounds reverse it.
pub fn drafter_on_clock(round: i64, pick: i64, draft_order: &[i64]) -> i64 {
    let n = draft_order.len() as i64;
    if round % 2 == 1 {
        draft_order[(pick - 1) as usize]
    } else {
        draft_order[(n - pick) as usize]
    }
}

pub fn pick_deadline(now: DateTime<Utc>, time_per_pick: i64) -> DateTime<Utc> {
    now + Duration::seconds(time_per_pick + GRACE_SECONDS)
}

/// Consumes the turn at `(current_round, current_pick)` and resolves the
/// next one. The drafter on the clock is computed from the post-advance
/// position.
pub fn advance_turn(
    current_round: i64,
    current_pick: i64,
    draft_order: &[i64],
    total_rounds: i64,
    time_per_pick: i64,
    now: DateTime<Utc>,
) -> TurnAdvance {
    let n = draft_order.len() as i64;

    let (round, pick) = if current_pick == n {
        (current_round + 1, 1)
    } else {
        (current_round, current_pick + 1)
    };

    if round > total_rounds {
        return TurnAdvance::Completed;
    }

    TurnAdvance::InProgress {
        round,
        pick,
        next_drafter: drafter_on_clock(round, pick, draft_order),
        next_pick_time: pick_deadline(now, time_per_pick),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(n: i64) -> Vec<i64> {
        (1..=n).collect()
    }

    #[test]
    fn odd_rounds_run_forward() {
        let order = order(6);
        for pick in 1..=6 {
            assert_eq!(drafter_on_clock(3, pick, &order), order[(pick - 1) as usize]);
        }
    }

    #[test]
    fn even_rounds_run_in_reverse() {
        let order = order(6);
        for pick in 1..=6 {
            assert_eq!(drafter_on_clock(4, pick, &order), order[(6 - pick) as usize]);
        }
    }

    #[test]
    fn advancing_within_a_round_increments_pick() {
        let now = Utc::now();
        match advance_turn(1, 2, &order(4), 3, 60, now) {
            TurnAdvance::InProgress { round, pick, next_drafter, next_pick_time } => {
                assert_eq!(round, 1);
                assert_eq!(pick, 3);
                assert_eq!(next_drafter, 3);
                assert_eq!(next_pick_time, now + Duration::seconds(60 + GRACE_SECONDS));
            }
            TurnAdvance::Completed => panic!("draft should not be over"),
        }
    }

    #[test]
    fn round_boundary_resets_pick_and_reverses_direction() {
        let now = Utc::now();
        match advance_turn(1, 4, &order(4), 3, 60, now) {
            TurnAdvance::InProgress { round, pick, next_drafter, .. } => {
                assert_eq!(round, 2);
                assert_eq!(pick, 1);
                // Last drafter of round 1 picks again first in round 2.
                assert_eq!(next_drafter, 4);
            }
            TurnAdvance::Completed => panic!("draft should not be over"),
        }
    }

    #[test]
    fn eight_team_snake_assigns_picks_nine_and_sixteen() {
        // Teams A..H as ids 1..8.
        let order = order(8);

        // Pick #9 is round 2 pick 1: H picks again.
        match advance_turn(1, 8, &order, 3, 60, Utc::now()) {
            TurnAdvance::InProgress { round, pick, next_drafter, .. } => {
                assert_eq!((round, pick), (2, 1));
                assert_eq!(next_drafter, 8);
            }
            TurnAdvance::Completed => panic!("draft should not be over"),
        }

        // Pick #16 is round 2 pick 8: back to A.
        match advance_turn(2, 7, &order, 3, 60, Utc::now()) {
            TurnAdvance::InProgress { round, pick, next_drafter, .. } => {
                assert_eq!((round, pick), (2, 8));
                assert_eq!(next_drafter, 1);
            }
            TurnAdvance::Completed => panic!("draft should not be over"),
        }
    }

    #[test]
    fn final_pick_of_final_round_terminates() {
        assert_eq!(advance_turn(3, 4, &order(4), 3, 60, Utc::now()), TurnAdvance::Completed);
    }

    #[test]
    fn single_participant_draft_advances_by_round() {
        let now = Utc::now();
        match advance_turn(1, 1, &[7], 2, 30, now) {
            TurnAdvance::InProgress { round, pick, next_drafter, .. } => {
                assert_eq!((round, pick), (2, 1));
                assert_eq!(next_drafter, 7);
            }
            TurnAdvance::Completed => panic!("one round remains"),
        }
        assert_eq!(advance_turn(2, 1, &[7], 2, 30, now), TurnAdvance::Completed);
    }
}
