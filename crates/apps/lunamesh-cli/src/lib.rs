//! Operator console for pigeon mail: config loading and the command
//! implementations behind the `pigeon` binary.

pub mod commands;
pub mod config;
