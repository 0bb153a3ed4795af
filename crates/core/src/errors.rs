use thiserror::Error;

use crate::config::ConfigError;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum MiningError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl MiningError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::InvalidParameter(_) => "invalid_parameter",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Mining(#[from] MiningError),
    #[error(transparent)]
    Configuration(#[from] ConfigError),
    #[error("dataset failure: {0}")]
    Dataset(String),
    #[error("unknown sample dataset `{0}`")]
    UnknownSample(String),
}

impl ApplicationError {
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Mining(error) => error.error_class(),
            Self::Configuration(_) => "config_validation",
            Self::Dataset(_) => "dataset",
            Self::UnknownSample(_) => "unknown_sample",
        }
    }

    /// Process exit code used by the command-line front end.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Configuration(_) => 2,
            Self::Dataset(_) | Self::UnknownSample(_) => 3,
            Self::Mining(MiningError::InvalidInput(_)) => 4,
            Self::Mining(MiningError::InvalidParameter(_)) => 5,
        }
    }

    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Mining(MiningError::InvalidParameter(_)) => {
                "Thresholds must be greater than 0 and at most 1."
            }
            Self::Mining(MiningError::InvalidInput(_)) | Self::Dataset(_) => {
                "The transaction data could not be used. Check the file format and try again."
            }
            Self::UnknownSample(_) => "No sample dataset with that id exists.",
            Self::Configuration(_) => "The configuration is invalid.",
        }
    }
}
