//! # Integration Tests

pub mod fixtures;

mod commit_reveal;
mod e2e_flow;
mod relay_ordering;
