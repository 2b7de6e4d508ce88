use std::any::Any;

use thiserror::Error;

/// Why a single handler invocation failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerFault {
    /// The handler returned an error.
    #[error("handler failed: {0}")]
    Failed(String),

    /// The handler panicked; the payload message is preserved when it is a string.
    #[error("handler panicked: {0}")]
    Panicked(String),
}

/// Extracts a readable message from a `catch_unwind` payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
