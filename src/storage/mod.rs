//! Local snapshot of a completed form.

use std::path::{Path, PathBuf};

use crate::{errors::WizardError, submission::SubmissionPayload, utils, utils::persistence};

const SNAPSHOT_EXTENSION: &str = "json";

/// Writes completed submissions to `<dir>/<key>.json`. The wizard only ever
/// writes; nothing in the crate reads a snapshot back.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Store rooted in the application data directory.
    pub fn in_app_dir() -> Self {
        Self::new(utils::snapshot_dir_in(&utils::app_data_dir()))
    }

    pub fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.{}", sanitize_key(key), SNAPSHOT_EXTENSION))
    }

    pub fn write(&self, key: &str, payload: &SubmissionPayload) -> Result<PathBuf, WizardError> {
        let path = self.path_for(key);
        persistence::write_json_atomic(&path, payload)?;
        tracing::debug!(path = %path.display(), "form snapshot written");
        Ok(path)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn sanitize_key(key: &str) -> String {
    let sanitized: String = key
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    if sanitized.is_empty() {
        "snapshot".into()
    } else {
        sanitized
    }
}
