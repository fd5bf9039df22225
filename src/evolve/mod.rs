//! Evolution machinery: mutation operator, selection schemes, streaming
//! statistics, and the MCMC engine that ties them together.

pub mod mcmc;
pub mod mutation;
pub mod scheme;
pub mod stats;

pub use mcmc::{Mcmc, StepOutcome};
pub use mutation::Mutation;
pub use scheme::SelectionScheme;
