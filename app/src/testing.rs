//! In-memory collaborators for exercising the controller without ffmpeg.

use std::{
    collections::HashMap,
    io,
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
};

use tokio::sync::Notify;
use vidtrim_core::OutputBlob;

use crate::{
    engine::{EngineError, TranscodeEngine},
    save::{SaveError, SaveStep},
};

pub(crate) const FAKE_OUTPUT: &[u8] = b"fake transcoder output";

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum EngineCall {
    Load,
    Write(String, Vec<u8>),
    Run(Vec<String>),
    Read(String),
    Remove(String),
}

#[derive(Debug, Default)]
pub(crate) struct FakeEngine {
    loaded: AtomicBool,
    failures_left: AtomicUsize,
    skip_output: bool,
    gate: Option<Arc<Notify>>,
    files: Mutex<HashMap<String, Vec<u8>>>,
    calls: Mutex<Vec<EngineCall>>,
}

impl FakeEngine {
    pub(crate) fn unloaded() -> FakeEngine {
        FakeEngine::default()
    }

    pub(crate) fn loaded() -> FakeEngine {
        let engine = FakeEngine::default();
        engine.loaded.store(true, Ordering::SeqCst);
        engine
    }

    /// Every `run` fails
    pub(crate) fn failing(self) -> FakeEngine {
        self.fail_times(usize::MAX)
    }

    pub(crate) fn fail_times(self, n: usize) -> FakeEngine {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// `run` succeeds but never writes its output
    pub(crate) fn without_output(mut self) -> FakeEngine {
        self.skip_output = true;
        self
    }

    /// `run` blocks until the gate is notified
    pub(crate) fn gated(mut self, gate: Arc<Notify>) -> FakeEngine {
        self.gate = Some(gate);
        self
    }

    pub(crate) fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn run_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, EngineCall::Run(_)))
            .count()
    }

    pub(crate) fn stored_files(&self) -> Vec<String> {
        let mut names = self.files.lock().unwrap().keys().cloned().collect::<Vec<_>>();
        names.sort();
        names
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn take_failure(&self) -> bool {
        self.failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait::async_trait]
impl TranscodeEngine for FakeEngine {
    async fn load(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Load);
        self.loaded.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    async fn write_input(&self, name: &str, data: Vec<u8>) -> Result<(), EngineError> {
        self.record(EngineCall::Write(name.to_owned(), data.clone()));
        self.files.lock().unwrap().insert(name.to_owned(), data);
        Ok(())
    }

    async fn run(&self, args: &[String]) -> Result<(), EngineError> {
        self.record(EngineCall::Run(args.to_vec()));
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        if self.take_failure() {
            return Err(EngineError::Exit(1));
        }
        if !self.skip_output {
            if let Some(out) = args.last() {
                self.files
                    .lock()
                    .unwrap()
                    .insert(out.clone(), FAKE_OUTPUT.to_vec());
            }
        }
        Ok(())
    }

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        self.record(EngineCall::Read(name.to_owned()));
        self.files
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| EngineError::MissingOutput(name.to_owned()))
    }

    async fn remove(&self, name: &str) -> Result<(), EngineError> {
        self.record(EngineCall::Remove(name.to_owned()));
        self.files.lock().unwrap().remove(name);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Debug, Default)]
pub(crate) struct RecordingSaver {
    fail: bool,
    saved: Mutex<Vec<(String, OutputBlob)>>,
}

impl RecordingSaver {
    pub(crate) fn failing() -> RecordingSaver {
        RecordingSaver {
            fail: true,
            ..Default::default()
        }
    }

    pub(crate) fn saved(&self) -> Vec<(String, OutputBlob)> {
        self.saved.lock().unwrap().clone()
    }
}

impl SaveStep for RecordingSaver {
    fn save(&self, blob: &OutputBlob, filename: &str) -> Result<PathBuf, SaveError> {
        if self.fail {
            return Err(SaveError::Write {
                path: PathBuf::from(filename),
                source: io::Error::new(io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        self.saved
            .lock()
            .unwrap()
            .push((filename.to_owned(), blob.clone()));
        Ok(PathBuf::from("/saved").join(filename))
    }
}
