//! The debug-dump facility: writes each generated page map to a
//! numbered file per session, for offline inspection. One file per
//! invocation, grouped by session directory.
//!
//! Disabled unless `PAGE_MAP_DEBUG_DIR` is set (`DriverConfig::debug_dir`);
//! a missing directory or write failure is logged and swallowed, never
//! propagated, since this is an offline-inspection aid and must not be
//! able to fail the call it's observing.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::engine::PageMap;

/// Per-session dump counter and target directory. One `DebugDumper` is
/// owned by each session's manager alongside its engine/driver pair.
pub struct DebugDumper {
    dir: Option<PathBuf>,
    session_id: String,
    counter: AtomicUsize,
}

impl DebugDumper {
    /// `base_dir: None` disables dumping entirely — the common case.
    pub fn new(base_dir: Option<&str>, session_id: impl Into<String>) -> Self {
        Self {
            dir: base_dir.map(PathBuf::from),
            session_id: session_id.into(),
            counter: AtomicUsize::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.dir.is_some()
    }

    /// Write the given page map to `<dir>/<session_id>/<n>.json`. Never
    /// returns an error to the caller — failures are logged at `warn`.
    pub fn dump(&self, map: &PageMap) {
        let Some(base) = &self.dir else {
            return;
        };

        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        let session_dir = base.join(&self.session_id);
        if let Err(err) = std::fs::create_dir_all(&session_dir) {
            tracing::warn!("debug dump: failed to create {session_dir:?}: {err}");
            return;
        }

        let path = session_dir.join(format!("{n}.json"));
        match serde_json::to_vec_pretty(map) {
            Ok(bytes) => {
                if let Err(err) = write_file(&path, &bytes) {
                    tracing::warn!("debug dump: failed to write {path:?}: {err}");
                }
            }
            Err(err) => {
                tracing::warn!("debug dump: failed to serialize page map: {err}");
            }
        }
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    std::fs::write(path, bytes)
}
