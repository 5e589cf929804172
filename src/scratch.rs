//! Per-input scratch space.
//!
//! Every intermediate file written while converting one input lives inside a
//! uniquely named directory next to the final output. The directory is removed
//! when the handle is dropped, so failures part-way through a file leave
//! nothing behind.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

#[derive(Debug)]
pub struct Scratch {
    dir: TempDir,
}

impl Scratch {
    /// Create `.<prefix>.snr.XXXXXX` inside `parent`.
    pub fn new_in(parent: &Path, prefix: &str) -> io::Result<Self> {
        let dir = tempfile::Builder::new()
            .prefix(&format!(".{prefix}.snr."))
            .tempdir_in(parent)?;
        tracing::debug!(path = %dir.path().display(), "created scratch directory");
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path of the `n`th sorted run.
    pub fn run_path(&self, n: usize) -> PathBuf {
        self.dir.path().join(format!("run_{n:05}.bam"))
    }

    /// Remove the directory now and report any failure.
    pub fn close(self) -> io::Result<()> {
        let path = self.dir.path().to_path_buf();
        self.dir.close()?;
        tracing::debug!(path = %path.display(), "removed scratch directory");
        Ok(())
    }
}
