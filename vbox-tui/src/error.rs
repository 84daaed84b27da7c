//! Error types shared by the gateway, the extractor and the screens.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("VBoxManage failed{}: {}", exit_suffix(.exit_code), .message)]
    Gateway {
        exit_code: Option<i32>,
        message: String,
    },

    #[error("No {what} found in output of `{command}`")]
    ExtractionMismatch { what: &'static str, command: String },

    #[error("Nothing selected")]
    NoSelection,

    #[error("Property '{0}' cannot be edited")]
    NotEditable(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

impl Error {
    pub fn gateway(exit_code: Option<i32>, message: impl Into<String>) -> Self {
        Self::Gateway {
            exit_code,
            message: message.into(),
        }
    }
}

fn exit_suffix(code: &Option<i32>) -> String {
    code.map(|c| format!(" (exit code {})", c)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, Error>;
