//! Streaming per-quantity statistics.
//!
//! Each tracked quantity (one variable species or one reaction flux) carries
//! four running accumulators. Derived statistics are recomputed from the
//! accumulators at any point without a second pass over the trajectory.

use crate::model::ZERO_GUARD;

#[derive(Debug, Clone, Copy, Default)]
pub struct RunningStats {
    sum: f64,
    sqsum: f64,
    relsum: f64,
    relsqsum: f64,
}

/// Statistics derived from the accumulators after `n` folded values.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Derived {
    pub mean: f64,
    pub var: f64,
    pub cv: f64,
    pub evolution_rate: f64,
}

impl RunningStats {
    /// Fold one accepted value. Relative accumulators are skipped when the
    /// wild reference is below the zero floor.
    pub fn fold(&mut self, value: f64, wild: f64) {
        self.sum += value;
        self.sqsum += value * value;
        if wild.abs() > ZERO_GUARD {
            let r = value / wild;
            self.relsum += r;
            self.relsqsum += r * r;
        }
    }

    /// All-zero while nothing has been folded. Variances are clamped at zero
    /// against floating-point cancellation.
    pub fn derive(&self, n: u64) -> Derived {
        if n == 0 {
            return Derived::default();
        }
        let n = n as f64;
        let mean = self.sum / n;
        let var = (self.sqsum / n - mean * mean).max(0.0);
        let cv = if mean.abs() > ZERO_GUARD {
            var.sqrt() / mean
        } else {
            0.0
        };
        let rel_mean = self.relsum / n;
        let rel_var = (self.relsqsum / n - rel_mean * rel_mean).max(0.0);
        Derived {
            mean,
            var,
            cv,
            evolution_rate: rel_var / n,
        }
    }
}
