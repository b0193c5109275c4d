//! Error type of the filesystem, wrapping the api catalogue.

use thiserror::Error;
use virtualfs_api::error::{ErrorCode, FsError, InvalidMode};

///Error type used throughout the filesystem
#[derive(Error, Debug)]
pub enum VfsError {
    ///a POSIX-coded failure out of the api catalogue
    #[error(transparent)]
    Errno(#[from] FsError),

    ///an open-mode string outside the supported table
    #[error(transparent)]
    Mode(#[from] InvalidMode),

    ///a buffer slice that does not fit the supplied buffer
    #[error("buffer range out of bounds: {0}")]
    Range(&'static str),

    ///catch-all for errors bubbling out of embedded callers
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VfsError {
    ///The POSIX code, when this is an errno-carrying failure
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            VfsError::Errno(e) => Some(e.code),
            _ => None,
        }
    }
}

//Shorthand used throughout the crate to raise a coded failure
pub(crate) fn errno(code: ErrorCode, paths: &[&str]) -> VfsError {
    VfsError::Errno(FsError::new(code, paths))
}
