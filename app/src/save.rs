use std::{
    io,
    path::{Component, Path, PathBuf},
};

use vidtrim_core::OutputBlob;

#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("refusing to save to {:?}: not a plain file name", _0)]
    InvalidName(String),
    #[error("could not write {:?}", path)]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where finished outputs go. Fire and forget: the controller does not wait
/// on anything beyond the returned location.
pub trait SaveStep: std::fmt::Debug + Send + Sync {
    fn save(&self, blob: &OutputBlob, filename: &str) -> Result<PathBuf, SaveError>;
}

/// Writes outputs into a single directory, creating it if needed.
#[derive(Debug, Clone)]
pub struct DirectorySaver {
    root: PathBuf,
}

impl DirectorySaver {
    pub fn new<P: Into<PathBuf>>(root: P) -> DirectorySaver {
        DirectorySaver { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn target(&self, filename: &str) -> Result<PathBuf, SaveError> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(self.root.join(filename)),
            _ => Err(SaveError::InvalidName(filename.to_owned())),
        }
    }
}

impl SaveStep for DirectorySaver {
    fn save(&self, blob: &OutputBlob, filename: &str) -> Result<PathBuf, SaveError> {
        let path = self.target(filename)?;
        let write = |path: &Path| -> io::Result<()> {
            std::fs::create_dir_all(&self.root)?;
            std::fs::write(path, &blob.data)
        };
        write(&path).map_err(|source| SaveError::Write {
            path: path.clone(),
            source,
        })?;
        log::info!(
            "saved {} ({}, {} bytes)",
            path.display(),
            blob.media_type,
            blob.len()
        );
        Ok(path)
    }
}
