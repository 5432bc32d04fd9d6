use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("manifest {} is unreadable: {reason}", .path.display())]
    ManifestUnreadable { path: PathBuf, reason: String },

    #[error("installer metadata does not match the request: {detail}")]
    MetadataMismatch { detail: String },

    #[error("package '{name}' is required but not installed in the environment")]
    MissingDependency { name: String },

    #[error("metadata for package '{package}' is malformed: {detail}")]
    MalformedMetadata { package: String, detail: String },

    #[error("cannot parse installed package line: {line}")]
    UnparseableFreezeLine { line: String },

    #[error("failed to launch `{command}`")]
    InstallerLaunch {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed ({status}){}", stderr_suffix(.stderr))]
    InstallerFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("`{command}` produced output that is not valid UTF-8")]
    NonUtf8Output { command: String },

    #[error("i/o error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}
