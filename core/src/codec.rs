//! JSON and form encoding at the edge of the helper.
//!
//! Response bodies that are empty, whitespace, or the literal `null` decode to
//! `T::default()`. Anything else that fails to parse is an error and is never
//! replaced by a default.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{HelperError, Result};
use crate::types::FormData;

/// Encode a value as JSON text, for use as a POST/PUT body.
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(HelperError::Serialization)
}

/// Decode response text into `T`.
pub fn deserialize<T: DeserializeOwned + Default>(text: &str) -> Result<T> {
    let text = text.trim();
    if text.is_empty() || text == "null" {
        return Ok(T::default());
    }
    serde_json::from_str(text).map_err(HelperError::Deserialization)
}

/// URL-encode form fields as `k1=v1&k2=v2`.
pub fn encode_form(form: &FormData) -> Result<String> {
    Ok(serde_urlencoded::to_string(form.as_pairs())?)
}
