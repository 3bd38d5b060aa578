//! # promise-rs
//!
//! Promise-style combinators over concurrent tokio workloads.
//!
//! Build an [`engine::Engine`] from [`config::Options`], hand it a batch of
//! [`model::Workload`]s, and await one of `all_settled`, `all`, `race`,
//! `race_all`, `any`, or `some`. Results come back as index-tagged
//! [`model::Completion`]s carrying either a value or an [`error::Failure`].

pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod telemetry;
