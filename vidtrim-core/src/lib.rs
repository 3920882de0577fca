use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub use self::form::{FormError, JobForm};

pub mod form;

pub const DEFAULT_OUTPUT_NAME: &str = "output";
pub const DEFAULT_START_SECS: i64 = 0;
pub const DEFAULT_DURATION_SECS: i64 = 10;

/// What a job produces from the trimmed clip.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputKind {
    #[default]
    #[serde(rename = "gif", alias = "animated_image")]
    AnimatedImage,
    #[serde(rename = "mp3", alias = "audio")]
    Audio,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown output kind: {:?}", _0)]
pub struct UnknownOutputKind(pub String);

impl OutputKind {
    /// The value handed to the engine's `-f` argument
    pub fn format_code(&self) -> &'static str {
        match self {
            OutputKind::AnimatedImage => "gif",
            OutputKind::Audio => "mp3",
        }
    }
    pub fn extension(&self) -> &'static str {
        self.format_code()
    }
    pub fn media_type(&self) -> &'static str {
        match self {
            OutputKind::AnimatedImage => "image/gif",
            OutputKind::Audio => "audio/mp3",
        }
    }
    pub fn display_name(&self) -> &'static str {
        match self {
            OutputKind::AnimatedImage => "GIF",
            OutputKind::Audio => "MP3",
        }
    }
    pub fn output_name(&self, base: &str) -> String {
        format!("{}.{}", base, self.extension())
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for OutputKind {
    type Err = UnknownOutputKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gif" | "animated_image" => Ok(OutputKind::AnimatedImage),
            "mp3" | "audio" => Ok(OutputKind::Audio),
            _ => Err(UnknownOutputKind(s.to_owned())),
        }
    }
}

/// Normalized inputs for a single conversion.
///
/// Offsets are not range checked here. Negative values are handed to the
/// engine as-is, front ends are expected to clamp at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobParameters {
    pub name: String,
    pub start: i64,
    pub duration: i64,
}

impl Default for JobParameters {
    fn default() -> Self {
        JobParameters {
            name: DEFAULT_OUTPUT_NAME.to_owned(),
            start: DEFAULT_START_SECS,
            duration: DEFAULT_DURATION_SECS,
        }
    }
}

impl JobParameters {
    pub fn new(name: Option<&str>, start: Option<i64>, duration: Option<i64>) -> JobParameters {
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_owned(),
            _ => DEFAULT_OUTPUT_NAME.to_owned(),
        };
        JobParameters {
            name,
            start: start.unwrap_or(DEFAULT_START_SECS),
            duration: duration.unwrap_or(DEFAULT_DURATION_SECS),
        }
    }

    pub fn output_name(&self, kind: OutputKind) -> String {
        kind.output_name(&self.name)
    }
}

/// Engine output tagged with its media type, ready for the save step.
#[derive(Clone, PartialEq, Eq)]
pub struct OutputBlob {
    pub data: Vec<u8>,
    pub media_type: &'static str,
}

impl OutputBlob {
    pub fn new(data: Vec<u8>, kind: OutputKind) -> OutputBlob {
        OutputBlob {
            data,
            media_type: kind.media_type(),
        }
    }
    pub fn len(&self) -> usize {
        self.data.len()
    }
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for OutputBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputBlob")
            .field("media_type", &self.media_type)
            .field("len", &self.data.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gif_naming() {
        let params = JobParameters::new(Some("party"), Some(3), Some(4));
        assert_eq!(params.output_name(OutputKind::AnimatedImage), "party.gif");
        assert_eq!(OutputKind::AnimatedImage.media_type(), "image/gif");
    }

    #[test]
    fn mp3_naming() {
        let params = JobParameters::new(Some("party"), None, None);
        assert_eq!(params.output_name(OutputKind::Audio), "party.mp3");
        assert_eq!(OutputKind::Audio.media_type(), "audio/mp3");
    }

    #[test]
    fn missing_values_use_defaults() {
        let implicit = JobParameters::new(Some(""), None, None);
        let explicit = JobParameters::new(Some("output"), Some(0), Some(10));
        assert_eq!(implicit, explicit);
        assert_eq!(JobParameters::new(None, None, None), JobParameters::default());
        assert_eq!(JobParameters::new(Some("   "), None, None).name, "output");
    }

    #[test]
    fn negative_offsets_pass_through() {
        let params = JobParameters::new(Some("x"), Some(-2), Some(-1));
        assert_eq!(params.start, -2);
        assert_eq!(params.duration, -1);
    }

    #[test]
    fn default_kind_is_gif() {
        assert_eq!(OutputKind::default(), OutputKind::AnimatedImage);
    }

    #[test]
    fn parse_kind() {
        assert_eq!("GIF".parse::<OutputKind>().unwrap(), OutputKind::AnimatedImage);
        assert_eq!("mp3".parse::<OutputKind>().unwrap(), OutputKind::Audio);
        assert_eq!("audio".parse::<OutputKind>().unwrap(), OutputKind::Audio);
        assert!("webm".parse::<OutputKind>().is_err());
    }

    #[test]
    fn kind_serde_names() {
        let s = serde_json::to_string(&OutputKind::Audio).unwrap();
        assert_eq!(s, r#""mp3""#);
        let k: OutputKind = serde_json::from_str(r#""animated_image""#).unwrap();
        assert_eq!(k, OutputKind::AnimatedImage);
    }
}
