use std::path::PathBuf;

use anyhow::Context;
use app::SourceRef;
use clap::Parser;

use super::argparse::{AppConfig, ClipOpts};

#[derive(Parser, Debug)]
pub struct ConvertOpts {
    /// The video to trim
    pub input: PathBuf,

    #[clap(flatten)]
    pub clip: ClipOpts,
}

impl ConvertOpts {
    pub(crate) async fn run(&self, cfg: &AppConfig) -> anyhow::Result<()> {
        let app = cfg.build_app(&self.clip)?;
        let controller = app.controller()?;

        app.start_engine()
            .await
            .context("engine loader did not finish")?
            .context("could not load ffmpeg")?;

        let source = SourceRef::pick(&self.input)
            .await
            .with_context(|| format!("could not open {:?}", self.input))?;
        controller.select(source)?;
        self.clip.apply(&controller)?;

        let saved = controller
            .submit()
            .await
            .with_context(|| format!("could not convert {:?}", self.input))?;
        log::info!(
            "wrote {} bytes of {} to {}",
            saved.size,
            saved.media_type,
            saved.location.display()
        );
        println!("{}", saved.location.display());
        Ok(())
    }
}
