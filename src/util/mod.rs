//! Shared utilities.
//!
//! Helpers that are not specific to the Jet format: hex dump
//! formatting for the `dump` subcommand and page-row handle display.

pub mod hex;
