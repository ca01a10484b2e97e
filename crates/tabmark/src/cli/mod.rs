//! Command implementations for the `tabmark` binary.

pub mod config;
pub mod error;
pub mod flow;
pub mod flow_assert;
pub mod flow_runner;
pub mod inspect;
pub mod keymap;
pub mod output;
