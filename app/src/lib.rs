pub mod app;
pub mod controller;
pub mod engine;
pub mod ffmpeg;
pub mod save;
pub mod source;

#[cfg(test)]
pub(crate) mod testing;

pub use self::{
    controller::{JobController, JobError, LifecycleState, SavedFile, SubmitAvailability},
    engine::{EngineError, TranscodeEngine},
    source::{SourceError, SourceRef},
};

#[derive(Debug, thiserror::Error)]
pub enum VidtrimAppError {
    #[error(transparent)]
    Config(#[from] app::ConfigError),
}
