use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while reading scene resources from disk.
#[derive(Error, Debug)]
pub enum SceneError {
    /// The file could not be opened or read.
    #[error("Was not able to open file `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config file is not valid TOML.
    #[error("Could not parse TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required config entry is absent.
    #[error("Missing {0}")]
    MissingField(&'static str),

    /// A config entry has the wrong type or an unsupported value.
    #[error("Invalid value for `{field}`: {message}")]
    InvalidValue { field: &'static str, message: String },

    /// A geometry line could not be read as the values its section expects.
    #[error("Malformed {section} on line {line}: {message}")]
    MalformedLine {
        section: &'static str,
        line: usize,
        message: String,
    },

    /// An index points past the last vertex.
    #[error("Index {index} is out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u16, vertex_count: usize },

    /// The geometry has no `[points]` data.
    #[error("Geometry contains no points")]
    NoPoints,
}

impl SceneError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, SceneError>;
