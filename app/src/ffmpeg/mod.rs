mod cmd;
mod engine;

pub use cmd::FFMpegBinary;
use cmd::{FFmpegArg, FFmpegCommand, StdIo};
pub use engine::FFmpegEngine;
