//! The JSON envelope wrapped around every non-health response.

use serde::Serialize;

/// `{ success, data, message, stack? }`
///
/// `data` is `null` on failure. `stack` is only ever set by the error
/// normaliser outside production.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
  pub success: bool,
  pub data:    Option<T>,
  pub message: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub stack:   Option<String>,
}

impl<T> Envelope<T> {
  pub fn ok(data: T, message: impl Into<String>) -> Self {
    Self {
      success: true,
      data:    Some(data),
      message: message.into(),
      stack:   None,
    }
  }
}

impl Envelope<()> {
  pub fn failure(message: impl Into<String>) -> Self {
    Self {
      success: false,
      data:    None,
      message: message.into(),
      stack:   None,
    }
  }

  pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
    self.stack = Some(stack.into());
    self
  }
}
