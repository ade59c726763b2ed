#![forbid(unsafe_code)]

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PkgError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid wxapkg: {0}")]
    Format(String),

    #[error("crypto: {0}")]
    Crypto(String),

    #[error("path escapes output dir: {0}")]
    Outside(String),

    #[error("config: {0}")]
    Config(String),

    #[error("beautify: {0}")]
    Transform(String),
}

pub type PkgResult<T> = Result<T, PkgError>;
