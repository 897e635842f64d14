// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Fingerprint cache
//!
//! Successful task runs record a fingerprint under `.assetflow/`. A task is
//! skipped when its fingerprint is unchanged and every declared output still
//! exists; deleting an artifact by hand is enough to force a rebuild. The
//! cache is advisory, so a corrupt or missing store only costs a full run.

pub mod hash;

pub use hash::Fingerprinter;

use crate::config::BuildContext;
use crate::errors::AssetflowResult;
use crate::registry::Task;
use crate::utils::fs::publish_atomic;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, warn};

const STORE_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredFingerprint {
    fingerprint: String,
    outputs: Vec<PathBuf>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Store {
    version: u32,
    tasks: HashMap<String, StoredFingerprint>,
}

/// On-disk fingerprints plus the hasher for the current context.
pub struct FingerprintCache {
    path: PathBuf,
    store: Store,
    fingerprinter: Fingerprinter,
    dirty: bool,
}

impl FingerprintCache {
    /// Load the store for this project, or start empty when it is missing,
    /// unreadable or from another version.
    pub fn load(ctx: &BuildContext) -> Self {
        let path = ctx.layout.fingerprint_path();
        let store = match std::fs::read_to_string(&path) {
            Ok(raw) => match serde_json::from_str::<Store>(&raw) {
                Ok(store) if store.version == STORE_VERSION => store,
                Ok(store) => {
                    debug!(
                        "discarding fingerprint store version {} (want {STORE_VERSION})",
                        store.version
                    );
                    Store::default()
                }
                Err(e) => {
                    warn!("discarding unreadable fingerprint store: {e}");
                    Store::default()
                }
            },
            Err(_) => Store::default(),
        };

        Self {
            path,
            store,
            fingerprinter: Fingerprinter::new(ctx),
            dirty: false,
        }
    }

    /// True when `task` can be skipped: fingerprint unchanged and all
    /// declared outputs still on disk. Any failure to compute the current
    /// fingerprint counts as stale.
    pub fn is_fresh(&self, task: &Task) -> bool {
        let Some(entry) = self.store.tasks.get(&task.name) else {
            return false;
        };
        if !entry.outputs.iter().all(|p| p.exists()) {
            debug!("{}: output missing, fingerprint stale", task.name);
            return false;
        }
        match self.fingerprinter.fingerprint(task) {
            Ok(current) => current == entry.fingerprint,
            Err(e) => {
                debug!("{}: fingerprint unavailable ({e}), rerunning", task.name);
                false
            }
        }
    }

    /// Record a successful run of `task`.
    pub fn record(&mut self, task: &Task) -> AssetflowResult<()> {
        let fingerprint = self.fingerprinter.fingerprint(task)?;
        self.store.tasks.insert(
            task.name.clone(),
            StoredFingerprint {
                fingerprint,
                outputs: task.outputs.clone(),
            },
        );
        self.dirty = true;
        Ok(())
    }

    /// Drop the fingerprint of one task, forcing its next run.
    pub fn forget(&mut self, task: &str) {
        if self.store.tasks.remove(task).is_some() {
            self.dirty = true;
        }
    }

    /// Drop every recorded fingerprint.
    pub fn forget_all(&mut self) {
        if !self.store.tasks.is_empty() {
            self.store.tasks.clear();
            self.dirty = true;
        }
    }

    /// Write the store back if anything changed.
    pub async fn persist(&mut self) -> AssetflowResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.store.version = STORE_VERSION;
        let json = serde_json::to_string_pretty(&self.store).unwrap_or_default();
        publish_atomic(&self.path, json.as_bytes()).await?;
        self.dirty = false;
        Ok(())
    }
}
