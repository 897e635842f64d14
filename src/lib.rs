// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! # assetflow - Asset Build Orchestrator
//!
//! `assetflow` compiles a front-end library's sources (script bundle,
//! stylesheet, images) into distributable artifacts.
//!
//! ## Features
//!
//! - **Task graph** - Tasks declare inputs and dependencies; pipelines
//!   resolve to a deterministic, dependency-ordered schedule
//! - **Two modes** - Debug builds stay readable with source maps; release
//!   builds mangle, compress and strip
//! - **Smart caching** - Only re-run what changed
//! - **Watch mode** - Debounced rebuilds of exactly the affected pipelines
//! - **Narrow collaborators** - The bundler, minifier, compiler and
//!   prefixer sit behind small traits, swappable in tests
//!
//! ## Quick Start
//!
//! ```bash
//! # Release build of every artifact
//! assetflow
//!
//! # Readable artifacts with source maps
//! assetflow build --debug
//!
//! # Only the script strand
//! assetflow build-js
//!
//! # Debug build, then rebuild on change
//! assetflow develop
//! ```

pub mod cache;
pub mod cli;
pub mod collaborators;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod registry;
pub mod tasks;
pub mod utils;
pub mod watch;

// Re-export commonly used types
pub use config::{BuildContext, Mode};
pub use errors::{AssetflowError, AssetflowResult};
pub use pipeline::{RunReport, TaskExecutor, TaskGraph};
pub use registry::{Task, TaskRegistry};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
