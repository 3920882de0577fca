use std::path::{Path, PathBuf};

use camino::{Utf8Path, Utf8PathBuf};
use serde::Serialize;
use vidtrim_core::OutputKind;

const QUALIFIER: &str = "io";
const ORGANIZATION: &str = "vidtrim";
const APP: &str = "vidtrim";
const APP_CAPS: &str = "VIDTRIM";

const FFMPEG_CMD_KEY: &str = "ffmpeg";
const OUTPUT_DIR_KEY: &str = "output_dir";
const OUTPUT_KIND_KEY: &str = "output_kind";
const CLEANUP_KEY: &str = "cleanup_working_files";

const DEFAULT_CONFIG_FILE: &str = "vidtrim.toml";
const FALLBACK_OUTPUT_DIR: &str = ".";

type ExtConfigBuilder = config::ConfigBuilder<config::builder::DefaultState>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    ConfigError(#[from] config::ConfigError),
    #[error("unable to get user home directory")]
    NoUserHome,
    #[error("path is not utf8: {:?}", _0)]
    NonUtf8Path(PathBuf),
    #[error("invalid {}: {}", key, msg)]
    Invalid { key: &'static str, msg: String },
}

#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config_dir: Utf8PathBuf,
    config_path: Option<Utf8PathBuf>,
    load_environment: bool,
    config_builder: ExtConfigBuilder,
}

fn camino_path(std_path: &Path) -> Result<&Utf8Path, ConfigError> {
    Utf8Path::from_path(std_path).ok_or_else(|| ConfigError::NonUtf8Path(std_path.to_path_buf()))
}

fn new_config_builder(output_dir: &Utf8Path) -> Result<ExtConfigBuilder, ConfigError> {
    Ok(config::Config::builder()
        .set_default(FFMPEG_CMD_KEY, Option::<&str>::None)?
        .set_default(OUTPUT_DIR_KEY, output_dir.as_str())?
        .set_default(OUTPUT_KIND_KEY, OutputKind::default().format_code())?
        .set_default(CLEANUP_KEY, true)?)
}

fn default_output_dir() -> Result<Utf8PathBuf, ConfigError> {
    match directories::UserDirs::new().and_then(|d| d.download_dir().map(Path::to_path_buf)) {
        Some(p) => Ok(camino_path(&p)?.to_path_buf()),
        None => Ok(Utf8PathBuf::from(FALLBACK_OUTPUT_DIR)),
    }
}

impl ConfigBuilder {
    #[cfg(test)]
    pub fn new_test_config(root: &Path) -> Result<ConfigBuilder, ConfigError> {
        let root = camino_path(root)?;
        let config_builder = new_config_builder(&root.join("exports"))?
            .set_override(FFMPEG_CMD_KEY, "no_ffmpeg_in_tests")?;
        Ok(ConfigBuilder {
            config_dir: root.join("config"),
            config_path: None,
            load_environment: false,
            config_builder,
        })
    }

    pub fn new() -> Result<Self, ConfigError> {
        let dirs = directories::ProjectDirs::from(QUALIFIER, ORGANIZATION, APP)
            .ok_or(ConfigError::NoUserHome)?;
        let config_dir = camino_path(dirs.config_dir())?.to_path_buf();
        let config_builder = new_config_builder(&default_output_dir()?)?;
        Ok(Self {
            load_environment: false,
            config_path: None,
            config_dir,
            config_builder,
        })
    }

    /// Should we load configuration from the environment?
    pub fn load_environment(mut self, load_environment: bool) -> Self {
        self.load_environment = load_environment;
        self
    }

    fn set_path_override(mut self, key: &str, path: Option<&Path>) -> Result<Self, ConfigError> {
        let path_override = path.map(camino_path).transpose()?;
        let str_override = path_override.as_ref().map(|c| c.as_str());
        self.config_builder = self
            .config_builder
            .set_override_option(key, str_override)?;
        Ok(self)
    }

    pub fn config_file(mut self, config_file: Option<&Path>) -> Result<Self, ConfigError> {
        self.config_path = config_file
            .map(|p| camino_path(p).map(|p| p.to_path_buf()))
            .transpose()?;
        Ok(self)
    }

    pub fn output_dir(self, output_dir: Option<&Path>) -> Result<Self, ConfigError> {
        self.set_path_override(OUTPUT_DIR_KEY, output_dir)
    }

    pub fn ffmpeg_override(self, ffmpeg: Option<&Path>) -> Result<Self, ConfigError> {
        self.set_path_override(FFMPEG_CMD_KEY, ffmpeg)
    }

    pub fn output_kind(mut self, kind: Option<OutputKind>) -> Result<Self, ConfigError> {
        self.config_builder = self
            .config_builder
            .set_override_option(OUTPUT_KIND_KEY, kind.map(|k| k.format_code()))?;
        Ok(self)
    }

    pub fn build(mut self) -> Result<VidtrimConfig, ConfigError> {
        let cfg_file = self
            .config_path
            .unwrap_or_else(|| self.config_dir.join(DEFAULT_CONFIG_FILE));

        if cfg_file.exists() {
            log::debug!("loading config file: {}", cfg_file);
            self.config_builder = self
                .config_builder
                .add_source(config::File::from(cfg_file.as_std_path()));
        }

        if self.load_environment {
            self.config_builder = self
                .config_builder
                .add_source(config::Environment::with_prefix(APP_CAPS))
        }

        let vidtrim_cfg = VidtrimConfig {
            inner: self.config_builder.build()?,
        };
        log::trace!("{:#?}", vidtrim_cfg);
        Ok(vidtrim_cfg)
    }
}

/// Resolved values, for display.
#[derive(Debug, Serialize)]
pub struct ConfigSnapshot {
    pub ffmpeg: PathBuf,
    pub output_dir: PathBuf,
    pub output_kind: OutputKind,
    pub cleanup_working_files: bool,
}

#[derive(Debug, Clone)]
pub struct VidtrimConfig {
    inner: config::Config,
}

impl VidtrimConfig {
    pub fn ffmpeg(&self) -> Result<crate::ffmpeg::FFMpegBinary, ConfigError> {
        Ok(match self.inner.get::<Option<String>>(FFMPEG_CMD_KEY)? {
            Some(s) => crate::ffmpeg::FFMpegBinary::new(s),
            None => crate::ffmpeg::FFMpegBinary::default(),
        })
    }

    pub fn output_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(PathBuf::from(self.inner.get_string(OUTPUT_DIR_KEY)?))
    }

    pub fn output_kind(&self) -> Result<OutputKind, ConfigError> {
        let raw = self.inner.get_string(OUTPUT_KIND_KEY)?;
        raw.parse().map_err(|e: vidtrim_core::UnknownOutputKind| ConfigError::Invalid {
            key: OUTPUT_KIND_KEY,
            msg: e.to_string(),
        })
    }

    pub fn cleanup_working_files(&self) -> Result<bool, ConfigError> {
        Ok(self.inner.get_bool(CLEANUP_KEY)?)
    }

    pub fn snapshot(&self) -> Result<ConfigSnapshot, ConfigError> {
        Ok(ConfigSnapshot {
            ffmpeg: self.ffmpeg()?.executable_path().to_path_buf(),
            output_dir: self.output_dir()?,
            output_kind: self.output_kind()?,
            cleanup_working_files: self.cleanup_working_files()?,
        })
    }
}
