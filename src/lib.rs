pub mod cli;
pub mod commands;
pub mod mips;
pub mod utils;
