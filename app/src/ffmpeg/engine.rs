use std::{
    io,
    path::{Component, Path, PathBuf},
};

use tokio::sync::OnceCell;

use super::{FFMpegBinary, FFmpegArg, FFmpegCommand, StdIo};
use crate::engine::{EngineError, TranscodeEngine};

const WORKING_STORE_PREFIX: &str = "vidtrim-";
const GLOBAL_ARGS: &[&str] = &["-hide_banner", "-y"];

/// Scratch directory holding the engine's named files.
#[derive(Debug)]
struct WorkingStore {
    dir: tempfile::TempDir,
}

impl WorkingStore {
    fn create() -> Result<WorkingStore, EngineError> {
        let dir = tempfile::Builder::new()
            .prefix(WORKING_STORE_PREFIX)
            .tempdir()?;
        log::debug!("ffmpeg working store at {:?}", dir.path());
        Ok(WorkingStore { dir })
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Entries are bare file names, never paths.
    fn entry(&self, name: &str) -> Result<PathBuf, EngineError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root().join(name)),
            _ => Err(EngineError::InvalidName(name.to_owned())),
        }
    }
}

/// [`TranscodeEngine`] backed by the system ffmpeg binary.
#[derive(Debug)]
pub struct FFmpegEngine {
    bin: FFMpegBinary,
    store: OnceCell<WorkingStore>,
}

impl FFmpegEngine {
    pub fn new(bin: FFMpegBinary) -> FFmpegEngine {
        FFmpegEngine {
            bin,
            store: OnceCell::new(),
        }
    }

    fn store(&self) -> Result<&WorkingStore, EngineError> {
        self.store.get().ok_or(EngineError::NotLoaded)
    }

    async fn probe(&self) -> Result<(), EngineError> {
        let mut cmd = self.bin.build_command();
        cmd.push("-version");
        let st = cmd.status().await.map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => {
                EngineError::MissingBinary(self.bin.executable_path().to_path_buf())
            }
            _ => EngineError::Io(e),
        })?;
        if st.success() {
            Ok(())
        } else {
            Err(EngineError::Probe(st.code().unwrap_or(-1)))
        }
    }

    fn run_command(&self, root: &Path, args: &[String]) -> FFmpegCommand {
        let mut cmd = self.bin.build_command();
        cmd.cwd = Some(FFmpegArg::replaced("working_store", root));
        for arg in GLOBAL_ARGS {
            cmd.push(*arg);
        }
        for arg in args {
            cmd.push(arg);
        }
        cmd.stdin = Some(StdIo::Null);
        cmd.stdout = Some(StdIo::Null);
        cmd
    }
}

#[async_trait::async_trait]
impl TranscodeEngine for FFmpegEngine {
    async fn load(&self) -> Result<(), EngineError> {
        self.store
            .get_or_try_init(|| async {
                self.probe().await?;
                WorkingStore::create()
            })
            .await?;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.store.initialized()
    }

    async fn write_input(&self, name: &str, data: Vec<u8>) -> Result<(), EngineError> {
        let path = self.store()?.entry(name)?;
        log::trace!("write {} bytes to {:?}", data.len(), path);
        tokio::fs::write(&path, data).await?;
        Ok(())
    }

    async fn run(&self, args: &[String]) -> Result<(), EngineError> {
        let store = self.store()?;
        let st = self.run_command(store.root(), args).status().await?;
        if st.success() {
            Ok(())
        } else {
            Err(EngineError::Exit(st.code().unwrap_or(-1)))
        }
    }

    async fn read_output(&self, name: &str) -> Result<Vec<u8>, EngineError> {
        let path = self.store()?.entry(name)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(EngineError::MissingOutput(name.to_owned()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn remove(&self, name: &str) -> Result<(), EngineError> {
        let path = self.store()?.entry(name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn name(&self) -> &'static str {
        "ffmpeg"
    }
}
