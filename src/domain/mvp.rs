// Most-valuable-player selection over the winning roster.

use crate::domain::stats::MatchCounters;
use crate::domain::PlayerId;

/// Weighted performance score for one player's match counters.
///
/// Captures dominate, returns and kills follow, deaths subtract. A positive
/// kill/death ratio and a good objectives-per-death ratio add bonuses. The
/// result never goes below zero.
pub fn mvp_score(counters: &MatchCounters) -> f64 {
    let mut score = 0.0;

    score += counters.captures as f64 * 10.0;
    score += counters.returns as f64 * 6.0;
    score += counters.kills as f64 * 3.0;
    score -= counters.deaths as f64 * 1.5;

    if counters.deaths > 0 {
        let kd = counters.kills as f64 / counters.deaths as f64;
        if kd > 1.0 {
            score += (kd - 1.0) * 2.0;
        }
    } else if counters.kills > 0 {
        score += counters.kills as f64 * 2.0;
    }

    let objectives = counters.captures + counters.returns;
    if objectives > 0 && counters.deaths > 0 {
        score += objectives as f64 / counters.deaths as f64 * 3.0;
    }

    score.max(0.0)
}

/// Pick the MVP from the winning roster, given each player's counters in
/// roster order. Ties keep the earlier entry; a roster where nobody scored
/// anything produces no MVP.
pub fn select_mvp(roster: &[(PlayerId, MatchCounters)]) -> Option<PlayerId> {
    let mut best: Option<PlayerId> = None;
    let mut highest = 0.0;

    for (player, counters) in roster {
        let score = mvp_score(counters);
        if score > highest {
            highest = score;
            best = Some(*player);
        }
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn counters(kills: u32, deaths: u32, captures: u32, returns: u32) -> MatchCounters {
        MatchCounters {
            kills,
            deaths,
            captures,
            returns,
        }
    }

    #[test]
    fn captures_outweigh_kills() {
        let fragger = counters(3, 0, 0, 0);
        let capper = counters(0, 0, 1, 0);
        assert!(mvp_score(&capper) < mvp_score(&fragger));

        let capper_twice = counters(0, 0, 2, 0);
        assert!(mvp_score(&capper_twice) > mvp_score(&fragger));
    }

    #[test]
    fn selection_is_deterministic_and_order_breaks_ties() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let roster = vec![(a, counters(2, 1, 1, 0)), (b, counters(2, 1, 1, 0))];

        let first = select_mvp(&roster);
        for _ in 0..10 {
            assert_eq!(select_mvp(&roster), first);
        }
        assert_eq!(first, Some(a));
    }

    #[test]
    fn empty_or_scoreless_roster_has_no_mvp() {
        assert_eq!(select_mvp(&[]), None);
        let idle = vec![(Uuid::new_v4(), MatchCounters::default())];
        assert_eq!(select_mvp(&idle), None);
    }

    #[test]
    fn deaths_reduce_the_score() {
        let clean = counters(4, 0, 1, 1);
        let sloppy = counters(4, 6, 1, 1);
        assert!(mvp_score(&clean) > mvp_score(&sloppy));
    }
}
