//! # farmplan-cli
//!
//! A thin command-line stand-in for the synchronous `/optimize` contract
//! (§6): reads a [`farmplan_core::model::Plan`] from a JSON file, runs the
//! lexicographic stage sequence via [`farmplan_planner::OptimizeService`],
//! and writes the resulting [`farmplan_planner::payload::OptimizationResult`]
//! to stdout or a file. There is no network layer here - async submission,
//! job polling, and the durable backend are exercised through
//! `farmplan-planner` directly, not through this CLI.

pub mod cli;
pub mod commands;

pub use cli::Cli;
