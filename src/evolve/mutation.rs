//! Log-multiplicative mutation operator.
//!
//! A mutation picks one mutable parameter uniformly and scales it by
//! `10^factor` with `factor ~ Normal(0, sigma)`. Perturbations are symmetric
//! in log space, so a parameter is as likely to halve as to double.

use rand::Rng;
use rand_distr::{Distribution, Normal};

use crate::model::Model;

/// One applied mutation: arena index plus before/after values.
#[derive(Debug, Clone, Copy)]
pub struct Mutation {
    pub param: usize,
    pub previous: f64,
    pub value: f64,
}

/// Mutate the current mutant value of a uniformly chosen mutable parameter.
pub fn random_parameter_mutation(
    model: &mut Model,
    normal: &Normal<f64>,
    rng: &mut impl Rng,
) -> Mutation {
    let mutable = model.mutable_parameters();
    let param = mutable[rng.random_range(0..mutable.len())];
    let factor = normal.sample(rng);
    let (previous, value) = model.scale_mutant_parameter(param, factor);
    Mutation {
        param,
        previous,
        value,
    }
}

/// Sweep variant: perturb a uniformly chosen mutable parameter relative to
/// its wild value instead of its drifted mutant value.
pub fn random_reference_mutation(
    model: &mut Model,
    normal: &Normal<f64>,
    rng: &mut impl Rng,
) -> (Mutation, f64) {
    let mutable = model.mutable_parameters();
    let param = mutable[rng.random_range(0..mutable.len())];
    let factor = normal.sample(rng);
    let (previous, value) = model.deterministic_parameter_mutation(param, factor);
    (
        Mutation {
            param,
            previous,
            value,
        },
        factor,
    )
}
