use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("I/O failure on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image failure on '{}': {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: lodepng::Error,
    },

    #[error("unsupported image '{}': {reason}", path.display())]
    UnsupportedImage {
        path: PathBuf,
        reason: String,
    },

    #[error("malformed manifest '{}': {source}", path.display())]
    Manifest {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },
}

/// Reasons a manifest document can be rejected while reading it back.
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("expected root element <{expected}>, found <{found}>")]
    UnexpectedRoot {
        expected: &'static str,
        found: String,
    },

    #[error("<{element}> is missing attribute '{attribute}'")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },

    #[error("attribute '{attribute}' has non-numeric value '{value}'")]
    InvalidNumber {
        attribute: &'static str,
        value: String,
    },

    #[error("character value '{0}' is not exactly one character")]
    InvalidCharacter(String),

    #[error("attribute '{attribute}' has invalid color '{value}'")]
    InvalidColor {
        attribute: &'static str,
        value: String,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}
