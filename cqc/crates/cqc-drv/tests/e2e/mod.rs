//! End-to-end tests driving the `cqc` binary over the fixtures in
//! `fixtures/`: full-pipeline compilation, CLI argument handling, and
//! golden-output checks on the emitted QBE text.

mod compilation_tests;
mod cli_tests;
mod snapshot_tests;