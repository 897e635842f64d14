// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Pipeline resolution and execution
//!
//! [`TaskGraph`] turns a target name into an ordered schedule;
//! [`TaskExecutor`] drives that schedule against the shared build context.

pub mod executor;
pub mod resolver;

pub use executor::{
    Discipline, ExecutionOptions, RunReport, TaskExecutor, TaskResult, TaskStatus,
};
pub use resolver::TaskGraph;
