// SPDX-License-Identifier: CEPL-1.0
use raw_window_handle::HandleError;
use thiserror::Error;

use crate::BackendId;

pub type GfxResult<T> = Result<T, GfxError>;

#[derive(Debug, Error)]
pub enum GfxError {
    #[error("unknown backend name `{0}`")]
    UnknownBackend(String),

    #[error("backend `{0}` was not compiled into this build")]
    BackendUnavailable(BackendId),

    #[error("invalid options: {0}")]
    InvalidOptions(String),

    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("config read error: {0}")]
    Io(#[from] std::io::Error),

    #[error("window handle unavailable: {0}")]
    Window(#[from] HandleError),

    #[error("timed out waiting for the GPU")]
    TimedOut,

    #[error("{0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl GfxError {
    pub fn backend<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    {
        GfxError::Backend(err.into())
    }
}
