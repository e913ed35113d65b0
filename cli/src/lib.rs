//! Host side of the `foundation` CLI.
//!
//! `main.rs` parses arguments and initializes the runtime; [`commands`] holds
//! one function per subcommand, each returning an exit code from
//! [`exit_codes`].

pub mod commands;
pub mod exit_codes;
