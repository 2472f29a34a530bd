//! # playbook
//!
//! Command-line front end for the P29 playbook engine.
//!
//! Exposes the CLI and configuration layers so integration tests can drive
//! commands without spawning the binary.

pub mod cli;
pub mod config;
