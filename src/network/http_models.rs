use serde::Serialize;

// --- API Response Structs ---
// These define the shape of JSON the server returns.

/// Body of a successful key read.
#[derive(Serialize)]
pub struct ReadKeyResponse {
    pub data: String,
}

/// Body of every error response.
#[derive(Serialize)]
pub struct ErrorResponse {
    pub code: u16,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}
