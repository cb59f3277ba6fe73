pub mod config;
pub mod genotype;
pub mod locus;
pub mod reads;
pub mod scheduler;
pub mod workflows;
pub mod writers;

#[cfg(test)]
pub(crate) mod fixtures;
