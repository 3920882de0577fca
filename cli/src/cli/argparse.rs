use std::path::PathBuf;

use clap::Parser;
use vidtrim_core::OutputKind;

use super::{convert::ConvertOpts, interactive::InteractiveOpts};

pub fn get_args() -> CliOpts {
    CliOpts::parse()
}

#[derive(Parser, Debug)]
#[clap(version = clap::crate_version!(), about = "Trim a video into a GIF or an MP3")]
pub struct CliOpts {
    #[clap(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[clap(flatten)]
    pub cfg: AppConfig,

    #[clap(subcommand)]
    pub subcmd: SubCommand,
}

#[derive(Parser, Debug)]
pub enum SubCommand {
    /// Convert a single clip and exit
    Convert(ConvertOpts),

    /// Pick a video and convert clips from a prompt
    Interactive(InteractiveOpts),

    /// Show the resolved configuration
    ShowConfig,
}

#[derive(Parser, Debug)]
pub struct AppConfig {
    /// Path to a config file.
    ///
    /// If not provided, `vidtrim.toml` in the user config dir is used when present.
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Path to the ffmpeg executable, instead of searching PATH
    #[clap(long, global = true)]
    pub ffmpeg: Option<PathBuf>,
}

#[derive(Parser, Debug)]
pub struct ClipOpts {
    /// Export `gif` or `mp3` (defaults to the configured kind)
    #[clap(long, short)]
    pub kind: Option<OutputKind>,

    /// Name of the saved file, without extension
    #[clap(long, short)]
    pub name: Option<String>,

    /// Start of the clip, in seconds
    #[clap(long, short, value_parser = clap::value_parser!(i64).range(0..))]
    pub start: Option<i64>,

    /// Length of the clip, in seconds
    #[clap(long, short, value_parser = clap::value_parser!(i64).range(0..))]
    pub time: Option<i64>,

    /// Directory the output is saved into
    #[clap(long)]
    pub output_dir: Option<PathBuf>,
}
