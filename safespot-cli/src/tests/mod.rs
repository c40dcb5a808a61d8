//! Shared test harness modules for the Safespot CLI.
#![expect(
    clippy::panic,
    reason = "Tests assert panic branches to surface unexpected CLI outcomes"
)]

use super::*;

mod commands;
mod helpers;
mod steps;
