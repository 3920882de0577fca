use anyhow::Context;
use app::{
    app::{VidtrimApp, VidtrimBuilder},
    JobController,
};

use super::argparse;

impl argparse::AppConfig {
    pub(crate) fn builder(&self) -> anyhow::Result<VidtrimBuilder> {
        VidtrimBuilder::new()
            .context("could not create app builder")?
            .update(|c| {
                c.config_file(self.config.as_deref())?
                    .ffmpeg_override(self.ffmpeg.as_deref())
            })
            .context("could not apply config overrides")
    }

    pub(crate) fn build_app(&self, clip: &argparse::ClipOpts) -> anyhow::Result<VidtrimApp> {
        self.builder()?
            .update(|c| c.output_dir(clip.output_dir.as_deref()))
            .context("could not set output directory")?
            .build()
            .context("could not build app config")
    }
}

impl argparse::ClipOpts {
    /// Seed the controller's form from the command line
    pub(crate) fn apply(&self, controller: &JobController) -> anyhow::Result<()> {
        if let Some(kind) = self.kind {
            controller.set_kind(kind)?;
        }
        controller.update_form(|f| {
            if let Some(name) = &self.name {
                f.name = name.clone();
            }
            if let Some(start) = self.start {
                f.start = start.to_string();
            }
            if let Some(time) = self.time {
                f.time = time.to_string();
            }
        })?;
        Ok(())
    }
}

/// Format an error with its whole source chain on one line.
pub(crate) fn error_chain(e: impl std::error::Error + Send + Sync + 'static) -> String {
    format!("{:#}", anyhow::Error::from(e))
}

pub(crate) fn show_config(cfg: &argparse::AppConfig) -> anyhow::Result<()> {
    let app = cfg
        .builder()?
        .build()
        .context("could not build app config")?;
    let snapshot = app.config.snapshot()?;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
