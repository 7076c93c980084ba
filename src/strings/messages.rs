//! # Messages
//!
//! Fixed sentences that appear in responses and model inputs.

pub const NO_ORDERS: &str = "No orders are currently available to the signed-in user.";
pub const NO_CONTEXT: &str = "No contextual data was available.";
pub const NO_ACCESSIBLE_ORDERS: &str = "No orders are accessible for the current user.";
pub const NO_PLAN: &str = "No plan was generated for this request.";
pub const NO_ACTIONS: &str = "No actions were executed.";
pub const EMPTY_ANSWER: &str = "The model did not return any content.";
pub const NO_STAGES: &str = "no recorded stages.";
pub const INVALID_PAYLOAD: &str = "Invalid JSON payload.";

pub fn context_fetch_failed(err: &str) -> String {
    format!("Unable to read workflow context from the backend: {err}")
}

pub fn profile_fetch_failed(err: &str) -> String {
    format!("Unable to resolve the caller's roles; answering without actions: {err}")
}

pub fn action_not_supported(name: &str) -> String {
    format!("Action `{name}` is not supported for this user.")
}

pub fn invalid_arguments(name: &str) -> String {
    format!("Invalid arguments for `{name}`.")
}

pub fn action_failed(name: &str) -> String {
    format!("`{name}` failed.")
}
