//! Outcome scoring.
//!
//! Turns the three 1..=5 ratings of an outcome (plus optional hold time) into a
//! single overall score on a 0..=5 scale:
//!
//! base = (0.4 * frizz_inv + 0.3 * definition + 0.3 * softness) * 5
//!
//! where every axis is first normalized to [0,1] and frizz is inverted
//! (1 = no frizz = best). A non-zero hold time adds up to one point, capped at 5.

use serde::{Deserialize, Serialize};

pub const FRIZZ_WEIGHT: f64 = 0.4;
pub const DEFINITION_WEIGHT: f64 = 0.3;
pub const SOFTNESS_WEIGHT: f64 = 0.3;

/// Hold time that earns the full bonus point.
pub const FULL_HOLD_HOURS: f64 = 24.0;
pub const MAX_SCORE: f64 = 5.0;

/// One subjective assessment of a routine execution.
///
/// Ratings are expected in 1..=5; range checks happen at the API boundary.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RatingTriple {
    pub frizz: u8,
    pub definition: u8,
    pub softness: u8,
    pub hold_hours: Option<f64>,
}

impl RatingTriple {
    pub fn new(frizz: u8, definition: u8, softness: u8, hold_hours: Option<f64>) -> Self {
        Self {
            frizz,
            definition,
            softness,
            hold_hours,
        }
    }

    pub fn score(&self) -> f64 {
        overall_score(self.frizz, self.definition, self.softness, self.hold_hours)
    }
}

/// Compute the overall outcome score.
///
/// Without a hold bonus the weighted base is returned as-is (not clamped); the
/// weights sum to 1 so it stays within [1, 5] for valid ratings anyway.
pub fn overall_score(frizz: u8, definition: u8, softness: u8, hold_hours: Option<f64>) -> f64 {
    let frizz_score = (6.0 - f64::from(frizz)) / 5.0;
    let definition_score = f64::from(definition) / 5.0;
    let softness_score = f64::from(softness) / 5.0;

    let base = (frizz_score * FRIZZ_WEIGHT
        + definition_score * DEFINITION_WEIGHT
        + softness_score * SOFTNESS_WEIGHT)
        * MAX_SCORE;

    match hold_hours {
        Some(h) if h != 0.0 => {
            let bonus = (h / FULL_HOLD_HOURS).min(1.0);
            (base + bonus).min(MAX_SCORE)
        }
        _ => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn best_ratings_hit_ceiling() {
        assert!(approx(overall_score(1, 5, 5, None), 5.0));
    }

    #[test]
    fn worst_ratings_hit_formula_floor() {
        // every axis normalizes to 0.2 at its worst, so the floor is 1.0
        assert!(approx(overall_score(5, 1, 1, None), 1.0));
    }

    #[test]
    fn midpoint_ratings_give_midpoint() {
        assert!(approx(overall_score(3, 3, 3, None), 3.0));
    }

    #[test]
    fn hold_bonus_is_capped_at_five() {
        assert!(approx(overall_score(1, 5, 5, Some(24.0)), 5.0));
        assert!(approx(overall_score(1, 5, 5, Some(100.0)), 5.0));
    }

    #[test]
    fn hold_bonus_scales_with_hours() {
        let base = overall_score(3, 3, 3, None);
        assert!(approx(overall_score(3, 3, 3, Some(12.0)), base + 0.5));
        assert!(approx(overall_score(3, 3, 3, Some(48.0)), base + 1.0));
    }

    #[test]
    fn zero_hold_hours_means_no_bonus() {
        assert_eq!(overall_score(2, 4, 4, Some(0.0)), overall_score(2, 4, 4, None));
    }

    #[test]
    fn frizz_weighs_more_than_other_axes() {
        // one step better on frizz beats one step better on definition
        let frizz_better = overall_score(2, 3, 3, None);
        let definition_better = overall_score(3, 4, 3, None);
        assert!(frizz_better > definition_better);
    }

    #[test]
    fn all_valid_inputs_stay_in_range_and_are_stable() {
        for f in 1..=5u8 {
            for d in 1..=5u8 {
                for s in 1..=5u8 {
                    let a = overall_score(f, d, s, None);
                    let b = overall_score(f, d, s, None);
                    assert_eq!(a.to_bits(), b.to_bits());
                    assert!((0.0..=MAX_SCORE + 1e-9).contains(&a), "{f},{d},{s} -> {a}");
                }
            }
        }
    }

    #[test]
    fn triple_delegates_to_formula() {
        let t = RatingTriple::new(2, 4, 5, Some(6.0));
        assert_eq!(t.score(), overall_score(2, 4, 5, Some(6.0)));
    }
}
