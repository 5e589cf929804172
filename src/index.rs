use crate::error::{Error, Result};
use rust_htslib::bam;
use std::path::{Path, PathBuf};

/// Path htslib writes the BAI to when no explicit index path is given.
pub fn bai_path(bam_path: &Path) -> PathBuf {
    let mut s = bam_path.as_os_str().to_owned();
    s.push(".bai");
    PathBuf::from(s)
}

/// Build `<bam_path>.bai` for a coordinate-sorted BAM.
pub fn build_bai(bam_path: &Path) -> Result<PathBuf> {
    bam::index::build(bam_path, None, bam::index::Type::Bai, 1)
        .map_err(|e| Error::Index(format!("{}: {e}", bam_path.display())))?;
    Ok(bai_path(bam_path))
}
