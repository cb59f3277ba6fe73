mod bootstrap;
mod caller;
mod mixture;

pub use bootstrap::{estimate_confidence, BootstrapSummary, Confidence};
pub use caller::{call_alleles, AlleleCallSet, CalledAllele};
pub use mixture::{fit_mixture, MixtureFit, MAX_ITERATIONS};
