//! Screenshot artifacts
//!
//! Files land in one flat directory as
//! `{prefix}{sequence:02}_{label}.png`, plus `{prefix}error.png` for the
//! diagnostic capture taken when a run breaks.

use std::path::PathBuf;

use crate::common::{Error, Result};

/// Writes the screenshots of one run
#[derive(Debug)]
pub struct ArtifactWriter {
    dir: PathBuf,
    prefix: String,
    sequence: usize,
    written: Vec<PathBuf>,
}

impl ArtifactWriter {
    pub fn new(dir: impl Into<PathBuf>, prefix: &str) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.to_string(),
            sequence: 0,
            written: Vec::new(),
        }
    }

    /// Every file written so far, in order
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// Create the output directory if it does not exist
    pub fn ensure_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::Artifact {
            path: self.dir.display().to_string(),
            error: e.to_string(),
        })
    }

    /// Save a checkpoint screenshot under the next sequence number
    pub fn save(&mut self, label: &str, png: &[u8]) -> Result<PathBuf> {
        self.sequence += 1;
        let name = format!("{}{:02}_{}.png", self.prefix, self.sequence, sanitize(label));
        self.write(name, png)
    }

    /// Save the diagnostic screenshot of a broken run
    pub fn save_diagnostic(&mut self, png: &[u8]) -> Result<PathBuf> {
        let name = format!("{}error.png", self.prefix);
        self.write(name, png)
    }

    fn write(&mut self, name: String, png: &[u8]) -> Result<PathBuf> {
        let path = self.dir.join(name);
        std::fs::write(&path, png).map_err(|e| Error::Artifact {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), bytes = png.len(), "screenshot saved");
        self.written.push(path.clone());
        Ok(path)
    }
}

fn sanitize(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}
