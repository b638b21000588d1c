use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ValidateMessageResponse {
    pub is_safe: bool,
    pub reason: String,
}
