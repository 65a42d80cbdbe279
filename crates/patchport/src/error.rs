use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid module '{path}': {message}")]
    InvalidModule { path: PathBuf, message: String },

    #[error("Old and new module must be different files: {0}")]
    IdenticalModules(PathBuf),

    #[error("Modules share the fingerprint {0}, nothing changed between them")]
    UnchangedModule(String),

    #[error("Patch set for the old module not found: {0}")]
    PatchSetNotFound(PathBuf),

    #[error("Invalid patch set: {0}")]
    InvalidPatchSet(String),

    #[error("Range {offset:#x}+{len} lies outside the module ({size} bytes)")]
    OutOfBounds { offset: u64, len: usize, size: usize },

    #[error("Invalid config: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error is a "file not found" error
    pub fn is_not_found(&self) -> bool {
        match self {
            Error::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            Error::PatchSetNotFound(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_not_found() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        assert!(Error::Io(io_err).is_not_found());
        assert!(Error::PatchSetNotFound(PathBuf::from("GAME-1_2.json")).is_not_found());

        let other_io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(!Error::Io(other_io_err).is_not_found());
        assert!(!Error::UnchangedModule("GAME-1_2".to_string()).is_not_found());
    }

    #[test]
    fn test_out_of_bounds_message() {
        let err = Error::OutOfBounds {
            offset: 0x20,
            len: 4,
            size: 16,
        };
        assert_eq!(
            err.to_string(),
            "Range 0x20+4 lies outside the module (16 bytes)"
        );
    }
}
