// Public API
pub mod cli;
pub mod commands;

// Core domain types
mod config;
mod delta;
mod entry;
mod error;
mod manifest;
mod pipeline;
mod pixi;
mod platform;
mod publish;
mod stage;
mod tools;
mod trampoline;
pub mod ui;

// Re-export main types
pub use config::{LayoutPath, Settings};
pub use delta::{
    filter_variables, path_diff, AmbientEnvironment, CapturedEnvironment, EnvironmentDelta,
};
pub use entry::{Entry, RawEntry, DEFAULT_ENVIRONMENT};
pub use error::ExposeError;
pub use manifest::{Manifest, ManifestIssue};
pub use pipeline::{ExposeReport, Pipeline};
pub use pixi::Pixi;
pub use publish::{PublishedExecutable, TrampolinePublisher};
pub use stage::RepositoryStager;
pub use trampoline::TrampolineConfig;
