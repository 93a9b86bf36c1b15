// Span valuation: the signed, capital-weighted distance between a keeper
// cost and its market ADP.
//
// A flat difference of overall pick numbers treats a 5-pick gap in round 1
// the same as one in round 15, which badly misprices early-round keepers.
// Instead, every pick traversed between the two positions contributes the
// weight of its round, so spans through early rounds are worth more than
// equal-length spans through late rounds.

use crate::valuation::curve::CapitalCurve;
use crate::valuation::geometry::{pick_in_round, round_of};

/// Capital-weighted value of keeping at `keeper_overall` when the market
/// price is `adp_overall`.
///
/// Algorithm:
/// 1. Equal picks are worth exactly 0.
/// 2. Keeping later than market (`keeper_overall > adp_overall`) is a
///    discount, so the sign is positive; keeping earlier is a reach,
///    negative.
/// 3. The unsigned magnitude sums `curve.weight(round)` for every pick in
///    the half-open range `(lo, hi]`: the picks remaining in `lo`'s round,
///    every fully spanned round in between at `teams` picks each, and the
///    leading picks of `hi`'s round.
pub fn span_value<C: CapitalCurve + ?Sized>(
    keeper_overall: u32,
    adp_overall: u32,
    teams: u32,
    curve: &C,
) -> f64 {
    if keeper_overall == adp_overall {
        return 0.0;
    }

    let sign = if keeper_overall > adp_overall {
        1.0
    } else {
        -1.0
    };
    let lo = keeper_overall.min(adp_overall).max(1);
    let hi = keeper_overall.max(adp_overall).max(1);
    let teams = teams.max(1);

    let lo_round = round_of(lo, teams);
    let hi_round = round_of(hi, teams);

    let magnitude = if lo_round == hi_round {
        curve.weight(lo_round) * f64::from(hi - lo)
    } else {
        let mut sum = curve.weight(lo_round) * f64::from(teams - pick_in_round(lo, teams));
        for round in (lo_round + 1)..hi_round {
            sum += curve.weight(round) * f64::from(teams);
        }
        sum + curve.weight(hi_round) * f64::from(pick_in_round(hi, teams))
    };

    sign * magnitude
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::valuation::curve::DraftCapitalCurve;

    const CURVE: DraftCapitalCurve = DraftCapitalCurve;

    fn approx_eq(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn zero_span_is_zero() {
        for teams in [1, 8, 12] {
            for pick in [1, 15, 200] {
                assert_eq!(span_value(pick, pick, teams, &CURVE), 0.0);
            }
        }
    }

    #[test]
    fn sign_symmetry() {
        let pairs = [(23, 15), (30, 45), (1, 2), (5, 180)];
        for (a, b) in pairs {
            let forward = span_value(a, b, 12, &CURVE);
            let backward = span_value(b, a, 12, &CURVE);
            assert!(
                approx_eq(forward, -backward),
                "span_value({a},{b}) = {forward} should negate span_value({b},{a}) = {backward}"
            );
        }
    }

    #[test]
    fn same_round_span_uses_that_rounds_weight() {
        // teams=12: picks 15 and 23 both fall in round 2 (8 picks apart).
        let value = span_value(23, 15, 12, &CURVE);
        let expected = CURVE.weight(2) * 8.0;
        assert!(
            approx_eq(value, expected),
            "expected {expected}, got {value}"
        );
        assert!(value > 0.0, "keeping later than ADP is good value");
    }

    #[test]
    fn same_round_monotonic_in_distance() {
        // Within round 2 of a 12-team draft, a bigger discount is always
        // worth more.
        let adp = 14;
        let mut prev = 0.0;
        for keeper in 15..=24 {
            let value = span_value(keeper, adp, 12, &CURVE);
            assert!(
                value > prev,
                "span should grow with distance: keeper={keeper} value={value} prev={prev}"
            );
            prev = value;
        }
    }

    #[test]
    fn cross_round_span_hand_computed() {
        // teams=12, adp=10 (round 1, pick 10), keeper=15 (round 2, pick 3):
        // 2 picks left in round 1 plus 3 picks into round 2.
        let value = span_value(15, 10, 12, &CURVE);
        let expected = CURVE.weight(1) * 2.0 + CURVE.weight(2) * 3.0;
        assert!(
            approx_eq(value, expected),
            "expected {expected}, got {value}"
        );
    }

    #[test]
    fn multi_round_span_counts_full_middle_rounds() {
        // teams=10, adp=5 (round 1, pick 5), keeper=27 (round 3, pick 7):
        // 5 picks left in round 1, all 10 of round 2, 7 picks of round 3.
        let value = span_value(27, 5, 10, &CURVE);
        let expected =
            CURVE.weight(1) * 5.0 + CURVE.weight(2) * 10.0 + CURVE.weight(3) * 7.0;
        assert!(
            approx_eq(value, expected),
            "expected {expected}, got {value}"
        );
    }

    #[test]
    fn reach_is_negative() {
        // teams=12, keeper=30 (round 3, pick 6), adp=45 (round 4, pick 9):
        // keeping 15 picks earlier than market is a reach.
        let value = span_value(30, 45, 12, &CURVE);
        let expected = -(CURVE.weight(3) * 6.0 + CURVE.weight(4) * 9.0);
        assert!(
            approx_eq(value, expected),
            "expected {expected}, got {value}"
        );
        assert!(value < 0.0);
    }

    #[test]
    fn earlier_rounds_outweigh_equal_length_late_spans() {
        // A 6-pick discount inside round 1 beats a 6-pick discount inside
        // round 10 (teams=12: picks 109..=120 are round 10).
        let early = span_value(7, 1, 12, &CURVE);
        let late = span_value(115, 109, 12, &CURVE);
        assert!(
            early > late,
            "round-1 span ({early}) should outweigh round-10 span ({late})"
        );
    }

    #[test]
    fn weighted_sum_covers_exactly_the_pick_count() {
        // With a constant-weight curve the span must collapse to the plain
        // pick difference, whatever rounds it crosses.
        struct Flat;
        impl CapitalCurve for Flat {
            fn weight(&self, _round: u32) -> f64 {
                1.0
            }
        }
        for (keeper, adp, teams) in [(15, 10, 12), (27, 5, 10), (100, 1, 7), (8, 3, 1)] {
            let value = span_value(keeper, adp, teams, &Flat);
            assert!(
                approx_eq(value, f64::from(keeper - adp)),
                "flat curve should reduce to raw difference for ({keeper},{adp},{teams})"
            );
        }
    }
}
