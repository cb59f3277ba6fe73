pub mod cli;
pub mod commands;
pub mod stronger;
pub mod utils;
