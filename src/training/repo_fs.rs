//! Filesystem repository for trained artifacts: one JSON document per pipeline.
//!
//! TODO: Keep the replaced artifact as `<name>.bak` on overwrite.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::common::config::AppCfg;
use crate::common::error::{CropError, CropResult};

use super::domain::{ArtifactRepo, TrainedArtifact};

pub struct FsArtifactRepo {
    path: PathBuf,
}

impl FsArtifactRepo {
    pub fn new(cfg: &AppCfg) -> Self {
        Self::at(&cfg.artifact_path)
    }

    pub fn at(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl ArtifactRepo for FsArtifactRepo {
    /// Written to a sibling file first and renamed into place, so readers
    /// never observe a half-written document.
    fn put_artifact(&self, artifact: &TrainedArtifact) -> CropResult<()> {
        artifact.validate()?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let staging = self.staging_path();
        {
            let mut out = BufWriter::new(File::create(&staging)?);
            serde_json::to_writer(&mut out, artifact)?;
            out.flush()?;
        }
        fs::rename(&staging, &self.path)?;
        info!(ev = "artifact.saved", path = %self.path.display());
        Ok(())
    }

    fn get_artifact(&self) -> CropResult<TrainedArtifact> {
        let reader = BufReader::new(File::open(&self.path)?);
        let artifact: TrainedArtifact = serde_json::from_reader(reader)
            .map_err(|e| CropError::Artifact(format!("{}: {e}", self.path.display())))?;
        artifact.validate()?;
        info!(ev = "artifact.loaded", path = %self.path.display());
        Ok(artifact)
    }
}

pub fn save_artifact(path: impl AsRef<Path>, artifact: &TrainedArtifact) -> CropResult<()> {
    FsArtifactRepo::at(path).put_artifact(artifact)
}

pub fn load_artifact(path: impl AsRef<Path>) -> CropResult<TrainedArtifact> {
    FsArtifactRepo::at(path).get_artifact()
}
