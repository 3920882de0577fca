use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::{
    controller::{ControllerSettings, JobController},
    engine::{EngineError, TranscodeEngine},
    ffmpeg::FFmpegEngine,
    save::DirectorySaver,
    VidtrimAppError,
};

mod vidtrim_config;

pub use vidtrim_config::{ConfigBuilder, ConfigError, ConfigSnapshot, VidtrimConfig};

#[derive(Debug)]
pub struct VidtrimBuilder {
    pub config: vidtrim_config::ConfigBuilder,
}

impl VidtrimBuilder {
    pub fn new() -> Result<Self, ConfigError> {
        Ok(VidtrimBuilder {
            config: vidtrim_config::ConfigBuilder::new()?.load_environment(true),
        })
    }

    pub fn update(
        self,
        f: impl FnOnce(
            vidtrim_config::ConfigBuilder,
        ) -> Result<vidtrim_config::ConfigBuilder, ConfigError>,
    ) -> Result<Self, ConfigError> {
        let VidtrimBuilder {
            config: config_builder,
        } = self;
        let config_builder = f(config_builder)?;
        Ok(Self {
            config: config_builder,
        })
    }

    pub fn build(self) -> Result<VidtrimApp, VidtrimAppError> {
        let Self {
            config: config_builder,
        } = self;
        let config = config_builder.build()?;
        let engine = Arc::new(FFmpegEngine::new(config.ffmpeg()?));
        let app = VidtrimApp { config, engine };
        log::trace!("{:#?}", app);
        Ok(app)
    }
}

/// Configured application: one engine shared by every controller made from it.
#[derive(Debug)]
pub struct VidtrimApp {
    pub config: vidtrim_config::VidtrimConfig,
    engine: Arc<FFmpegEngine>,
}

impl VidtrimApp {
    pub fn engine(&self) -> Arc<dyn TranscodeEngine> {
        self.engine.clone()
    }

    /// Start the one-time engine load without waiting on it
    pub fn start_engine(&self) -> JoinHandle<Result<(), EngineError>> {
        crate::engine::start_loading(self.engine())
    }

    pub fn controller(&self) -> Result<JobController, VidtrimAppError> {
        let saver = DirectorySaver::new(self.config.output_dir()?);
        log::debug!("saving outputs to {:?}", saver.root());
        let settings = ControllerSettings {
            default_kind: self.config.output_kind()?,
            cleanup_working_files: self.config.cleanup_working_files()?,
        };
        Ok(JobController::new(self.engine(), Arc::new(saver), settings))
    }
}

#[cfg(test)]
pub mod tests {
    use vidtrim_core::OutputKind;

    use super::*;
    use crate::controller::LifecycleState;

    pub struct VidtrimTestApp {
        pub app: VidtrimApp,
        pub dir: tempfile::TempDir,
    }

    pub fn vidtrim_test_app() -> VidtrimTestApp {
        let dir = tempfile::TempDir::new().expect("unable to create tmpdir");
        let builder = VidtrimBuilder {
            config: ConfigBuilder::new_test_config(dir.path())
                .expect("could not create test config"),
        };
        let app = builder.build().expect("could not build test app");
        VidtrimTestApp { app, dir }
    }

    #[test]
    fn controller_uses_config() {
        let test_app = vidtrim_test_app();
        let c = test_app.app.controller().unwrap();
        assert_eq!(c.kind(), OutputKind::AnimatedImage);
        assert_eq!(c.lifecycle(), LifecycleState::Idle);
        assert!(!c.engine_ready());
    }

    #[tokio::test]
    async fn engine_load_fails_without_ffmpeg() {
        let test_app = vidtrim_test_app();
        let res = test_app.app.start_engine().await.unwrap();
        assert!(matches!(res, Err(EngineError::MissingBinary(_))));
        assert!(!test_app.app.engine().is_loaded());
    }

    #[test]
    fn update_builder() {
        let test_app = vidtrim_test_app();
        let builder = VidtrimBuilder {
            config: ConfigBuilder::new_test_config(test_app.dir.path()).unwrap(),
        };
        let app = builder
            .update(|c| c.output_kind(Some(OutputKind::Audio)))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(app.controller().unwrap().kind(), OutputKind::Audio);
    }
}
