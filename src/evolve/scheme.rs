//! Selection schemes.
//!
//! A scheme maps the score set of one trial to a scalar distance from the
//! wild type; the trial is accepted iff that distance is strictly below the
//! configured threshold. Mutation accumulation carries no distance and
//! accepts every stable trial.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::model::Scores;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SelectionScheme {
    /// Neutral drift: every stable mutant is accepted.
    MutationAccumulation,
    /// Distance on the absolute sum of variable abundances.
    AbsoluteMetabolicSum,
    /// Distance on the wild-relative sum of variable abundances.
    RelativeMetabolicSum,
    /// Euclidean flux distance over the objective reactions.
    AbsoluteTargetFluxes,
    /// Wild-relative flux distance over the objective reactions.
    RelativeTargetFluxes,
    /// Euclidean flux distance over every reaction.
    AbsoluteAllFluxes,
    /// Wild-relative flux distance over every reaction.
    RelativeAllFluxes,
}

impl SelectionScheme {
    /// Scalar distance for this scheme, `None` under mutation accumulation.
    pub fn distance(&self, scores: &Scores) -> Option<f64> {
        match self {
            SelectionScheme::MutationAccumulation => None,
            SelectionScheme::AbsoluteMetabolicSum => Some(scores.sum_dist_abs),
            SelectionScheme::RelativeMetabolicSum => Some(scores.sum_dist_rel),
            SelectionScheme::AbsoluteTargetFluxes => Some(scores.moma_abs),
            SelectionScheme::RelativeTargetFluxes => Some(scores.moma_rel),
            SelectionScheme::AbsoluteAllFluxes => Some(scores.moma_all_abs),
            SelectionScheme::RelativeAllFluxes => Some(scores.moma_all_rel),
        }
    }

    /// Strict comparison: a distance exactly at the threshold is rejected.
    pub fn accepts(&self, scores: &Scores, threshold: f64) -> bool {
        match self.distance(scores) {
            None => true,
            Some(d) => d < threshold,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionScheme::MutationAccumulation => "mutation_accumulation",
            SelectionScheme::AbsoluteMetabolicSum => "absolute_metabolic_sum",
            SelectionScheme::RelativeMetabolicSum => "relative_metabolic_sum",
            SelectionScheme::AbsoluteTargetFluxes => "absolute_target_fluxes",
            SelectionScheme::RelativeTargetFluxes => "relative_target_fluxes",
            SelectionScheme::AbsoluteAllFluxes => "absolute_all_fluxes",
            SelectionScheme::RelativeAllFluxes => "relative_all_fluxes",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores() -> Scores {
        Scores {
            wild_sum: 10.0,
            mutant_sum: 9.0,
            sum_dist_abs: 1.0,
            sum_dist_rel: 0.1,
            moma_abs: 2.0,
            moma_rel: 0.2,
            moma_all_abs: 3.0,
            moma_all_rel: 0.3,
            ..Scores::default()
        }
    }

    #[test]
    fn mutation_accumulation_always_accepts() {
        let s = scores();
        assert!(SelectionScheme::MutationAccumulation.accepts(&s, 0.0));
        assert!(SelectionScheme::MutationAccumulation.distance(&s).is_none());
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let s = scores();
        assert!(!SelectionScheme::AbsoluteMetabolicSum.accepts(&s, 1.0));
        assert!(SelectionScheme::AbsoluteMetabolicSum.accepts(&s, 1.0 + 1e-9));
    }

    #[test]
    fn each_scheme_reads_its_own_score() {
        let s = scores();
        assert_eq!(SelectionScheme::RelativeMetabolicSum.distance(&s), Some(0.1));
        assert_eq!(SelectionScheme::AbsoluteTargetFluxes.distance(&s), Some(2.0));
        assert_eq!(SelectionScheme::RelativeAllFluxes.distance(&s), Some(0.3));
    }

    #[test]
    fn config_names_round_trip_through_serde() {
        #[derive(Serialize, Deserialize)]
        struct Wrap {
            scheme: SelectionScheme,
        }
        let w: Wrap = toml::from_str("scheme = \"relative_target_fluxes\"").unwrap();
        assert_eq!(w.scheme, SelectionScheme::RelativeTargetFluxes);
        let text = toml::to_string(&w).unwrap();
        assert!(text.contains("relative_target_fluxes"));
        assert_eq!(w.scheme.as_str(), "relative_target_fluxes");
    }
}
