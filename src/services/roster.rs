//! Roster slot layout and the position-priority policy used when a pick
//! lands on a team: exact position slot, then the flex slot, then bench,
//! first open index wins.

use crate::dto::player_dto::Position;

pub const ROSTER_SIZE: usize = 17;

const FLEX_SLOT: usize = 6;
const BENCH_START: usize = 9;

/// Dedicated slot indices for each position.
fn position_slots(position: Position) -> &'static [usize] {
    match position {
        Position::Qb => &[0],
        Position::Rb => &[1, 2],
        Position::Wr => &[3, 4],
        Position::Te => &[5],
        Position::Def => &[7],
        Position::K => &[8],
    }
}

fn flex_eligible(position: Position) -> bool {
    match position {
        Position::Rb | Position::Wr | Position::Te => true,
        Position::Qb | Position::Def | Position::K => false,
    }
}

/// First open slot the player may occupy, or `None` when the roster has no
/// room for this position.
pub fn find_open_slot(roster: &[Option<i64>], position: Position) -> Option<usize> {
    position_slots(position)
        .iter()
        .copied()
        .find(|&slot| roster[slot].is_none())
        .or_else(|| (flex_eligible(position) && roster[FLEX_SLOT].is_none()).then_some(FLEX_SLOT))
        .or_else(|| (BENCH_START..ROSTER_SIZE).find(|&slot| roster[slot].is_none()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::team_dto::empty_roster;

    #[test]
    fn exact_position_slot_wins() {
        let roster = empty_roster();
        assert_eq!(find_open_slot(&roster, Position::Qb), Some(0));
        assert_eq!(find_open_slot(&roster, Position::Wr), Some(3));
        assert_eq!(find_open_slot(&roster, Position::K), Some(8));
    }

    #[test]
    fn second_rb_fills_the_second_slot() {
        let mut roster = empty_roster();
        roster[1] = Some(10);
        assert_eq!(find_open_slot(&roster, Position::Rb), Some(2));
    }

    #[test]
    fn flex_takes_overflow_skill_players_only() {
        let mut roster = empty_roster();
        roster[1] = Some(10);
        roster[2] = Some(11);
        assert_eq!(find_open_slot(&roster, Position::Rb), Some(FLEX_SLOT));

        // A QB never lands on flex; with slot 0 taken it goes to the bench.
        roster[0] = Some(12);
        assert_eq!(find_open_slot(&roster, Position::Qb), Some(BENCH_START));
    }

    #[test]
    fn qb_overflow_lands_on_first_open_bench_slot() {
        let mut roster = empty_roster();
        roster[0] = Some(1);
        roster[BENCH_START] = Some(2);
        assert_eq!(find_open_slot(&roster, Position::Qb), Some(BENCH_START + 1));
    }

    #[test]
    fn full_bench_means_no_slot() {
        let mut roster = empty_roster();
        roster[0] = Some(1);
        for slot in BENCH_START..ROSTER_SIZE {
            roster[slot] = Some(slot as i64);
        }
        // Flex is open but a QB is not eligible for it.
        assert_eq!(find_open_slot(&roster, Position::Qb), None);
    }
}
