//! `remote-deck` command-line host.

pub mod cli;
