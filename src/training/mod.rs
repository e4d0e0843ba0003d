//! Training domain: regressor families, per-target model selection and the
//! persisted artifact.

pub mod domain;
pub mod models;
pub mod repo_fs;
pub mod selection;
pub mod service;

pub use domain::{ArtifactRepo, Seeds, TargetKind, TargetModel, TargetSlots, TrainConfig, TrainedArtifact};
pub use models::{Regress, Regressor, RegressorKind};
pub use repo_fs::FsArtifactRepo;
pub use selection::ModelSelector;
