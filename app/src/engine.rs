use std::{path::PathBuf, sync::Arc};

use tokio::task::JoinHandle;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("transcoding engine has not finished loading")]
    NotLoaded,
    #[error("could not find ffmpeg executable: {:?}", _0)]
    MissingBinary(PathBuf),
    #[error("ffmpeg probe failed: exit {}", _0)]
    Probe(i32),
    #[error("invalid working file name: {:?}", _0)]
    InvalidName(String),
    #[error("output {:?} was never produced", _0)]
    MissingOutput(String),
    #[error("ffmpeg error: exit {}", _0)]
    Exit(i32),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// A transcoder with a private working store of named files.
///
/// Inputs are written into the store, `run` reads and writes store entries
/// by name, and outputs are read back out. Implementations must tolerate
/// `load` being called more than once.
#[async_trait::async_trait]
pub trait TranscodeEngine: std::fmt::Debug + Send + Sync {
    async fn load(&self) -> Result<(), EngineError>;
    fn is_loaded(&self) -> bool;
    async fn write_input(&self, name: &str, data: Vec<u8>) -> Result<(), EngineError>;
    async fn run(&self, args: &[String]) -> Result<(), EngineError>;
    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError>;
    /// Drop a store entry. Missing entries are not an error.
    async fn remove(&self, name: &str) -> Result<(), EngineError>;
    fn name(&self) -> &'static str;
}

/// Kick off the one-time engine load in the background.
pub fn start_loading(engine: Arc<dyn TranscodeEngine>) -> JoinHandle<Result<(), EngineError>> {
    tokio::spawn(async move {
        log::debug!("loading {} engine", engine.name());
        let res = engine.load().await;
        match &res {
            Ok(()) => log::info!("{} engine ready", engine.name()),
            Err(e) => log::error!("{} engine failed to load: {}", engine.name(), e),
        }
        res
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{EngineCall, FakeEngine};

    #[tokio::test]
    async fn background_load() {
        let engine = Arc::new(FakeEngine::unloaded());
        assert!(!engine.is_loaded());
        start_loading(engine.clone()).await.unwrap().unwrap();
        assert!(engine.is_loaded());
        assert_eq!(engine.calls(), vec![EngineCall::Load]);
    }
}
