use thiserror::Error;

use crate::model::{NameNumberError, SettingsError};

/// Invalid-input errors raised by the domain model.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    NameNumber(#[from] NameNumberError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
}
