use std::{
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source video does not exist: {:?}", _0)]
    NotFound(PathBuf),
    #[error("source video is not a file: {:?}", _0)]
    NotAFile(PathBuf),
    #[error("could not read source video {:?}", path)]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Clone)]
enum SourceData {
    File(PathBuf),
    Memory(Arc<[u8]>),
}

impl std::fmt::Debug for SourceData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceData::File(p) => f.debug_tuple("File").field(p).finish(),
            SourceData::Memory(b) => f.debug_tuple("Memory").field(&b.len()).finish(),
        }
    }
}

/// Handle to the video the user picked, plus the name to show for it.
///
/// Nothing is read until the handle is materialized at submission time.
#[derive(Debug, Clone)]
pub struct SourceRef {
    display_name: String,
    data: SourceData,
}

impl SourceRef {
    /// Select a file on disk
    pub async fn pick<P: AsRef<Path>>(path: P) -> Result<SourceRef, SourceError> {
        let path = path.as_ref();
        let meta = match tokio::fs::metadata(path).await {
            Ok(m) => m,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(SourceError::NotFound(path.to_path_buf()))
            }
            Err(e) => {
                return Err(SourceError::Read {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };
        if !meta.is_file() {
            return Err(SourceError::NotAFile(path.to_path_buf()));
        }
        let display_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        log::debug!("selected source {:?} ({} bytes)", path, meta.len());
        Ok(SourceRef {
            display_name,
            data: SourceData::File(path.to_path_buf()),
        })
    }

    /// Select a video that is already in memory
    pub fn from_bytes<S: Into<String>, B: Into<Arc<[u8]>>>(display_name: S, data: B) -> SourceRef {
        SourceRef {
            display_name: display_name.into(),
            data: SourceData::Memory(data.into()),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn path(&self) -> Option<&Path> {
        match &self.data {
            SourceData::File(p) => Some(p.as_path()),
            SourceData::Memory(_) => None,
        }
    }

    /// File extension of the display name, used as a demuxer hint.
    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.display_name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
    }

    pub async fn materialize(&self) -> Result<Vec<u8>, SourceError> {
        match &self.data {
            SourceData::File(p) => tokio::fs::read(p).await.map_err(|e| SourceError::Read {
                path: p.clone(),
                source: e,
            }),
            SourceData::Memory(b) => Ok(b.to_vec()),
        }
    }

    pub fn release(self) {
        log::trace!("released source {:?}", self.display_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pick_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("holiday.mp4");
        std::fs::write(&path, b"not really a video").unwrap();

        let src = SourceRef::pick(&path).await.unwrap();
        assert_eq!(src.display_name(), "holiday.mp4");
        assert_eq!(src.extension(), Some("mp4"));
        assert_eq!(src.path(), Some(path.as_path()));
        assert_eq!(src.materialize().await.unwrap(), b"not really a video");
    }

    #[tokio::test]
    async fn pick_missing_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = SourceRef::pick(dir.path().join("nope.mkv")).await.unwrap_err();
        assert!(matches!(err, SourceError::NotFound(_)));
    }

    #[tokio::test]
    async fn pick_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = SourceRef::pick(dir.path()).await.unwrap_err();
        assert!(matches!(err, SourceError::NotAFile(_)));
    }

    #[tokio::test]
    async fn memory_source() {
        let src = SourceRef::from_bytes("clip", vec![7u8, 8, 9]);
        assert_eq!(src.extension(), None);
        assert!(src.path().is_none());
        assert_eq!(src.materialize().await.unwrap(), vec![7, 8, 9]);
    }

    #[tokio::test]
    async fn file_removed_after_pick() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("gone.webm");
        std::fs::write(&path, b"x").unwrap();
        let src = SourceRef::pick(&path).await.unwrap();
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(
            src.materialize().await,
            Err(SourceError::Read { .. })
        ));
    }
}
