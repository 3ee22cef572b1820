use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::view::{self, Viewport};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to deserialize settings: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Viewer settings. Every field is optional in the TOML file.
///
/// ```toml
/// slice = 0.5
/// parallel_decode = false
///
/// [viewport]
/// width = 1920.0
/// height = 1080.0
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Screen area used for the zoom computation.
    pub viewport: Viewport,
    /// Initial slice fraction, clamped into `[0.01, 1.0]`.
    pub slice: f64,
    /// Where the chunk stream is served.
    pub stream_url: String,
    /// Decode chunks of one request on the rayon pool.
    pub parallel_decode: bool,
}

impl Default for ViewerConfig {
    fn default() -> ViewerConfig {
        ViewerConfig {
            viewport: Viewport::default(),
            slice: view::MAX_SLICE,
            stream_url: "ws://127.0.0.1:8069".to_string(),
            parallel_decode: true,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: &Path) -> Result<ViewerConfig, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        ViewerConfig::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<ViewerConfig, ConfigError> {
        let parsed = toml::from_str::<ViewerConfig>(contents)?;
        Ok(parsed.sanitize())
    }

    fn sanitize(mut self) -> ViewerConfig {
        self.slice = view::clamp_slice(self.slice);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(ViewerConfig::from_toml("").unwrap(), ViewerConfig::default());
    }

    #[test]
    fn fields_override_defaults() {
        let config = ViewerConfig::from_toml(
            "slice = 5.0\nparallel_decode = false\n[viewport]\nwidth = 300.0\n",
        )
        .unwrap();
        assert_eq!(config.slice, 1.0);
        assert!(!config.parallel_decode);
        assert_eq!(config.viewport, Viewport::new(300.0, 720.0));
        assert_eq!(config.stream_url, "ws://127.0.0.1:8069");
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        assert!(matches!(
            ViewerConfig::from_toml("slice = \"high\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "stream_url = \"ws://example:1\"").unwrap();
        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.stream_url, "ws://example:1");
        assert!(matches!(
            ViewerConfig::load(Path::new("/definitely/not/here.toml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
