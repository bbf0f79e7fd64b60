//! Body encoding for pipes
//!
//! A [`Codec`] turns items into request bodies and response bodies back into
//! items. Items are `serde_json::Value`s; typed access goes through
//! [`crate::PipeExt`].

use crate::error::Result;
use serde_json::Value;

/// Converts between items and raw HTTP bodies.
///
/// The `Content-Type` and `Accept` headers come from the pipe's
/// [`PipeConfig`](crate::PipeConfig), so a custom codec should be paired
/// with a matching content type there.
pub trait Codec: Send + Sync + std::fmt::Debug {
    /// Encode an item into a request body
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Codec`] if the item cannot be encoded.
    fn encode(&self, item: &Value) -> Result<Vec<u8>>;

    /// Decode a response body; an empty body decodes to `Value::Null`
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Codec`] if the body is not valid.
    fn decode(&self, body: &[u8]) -> Result<Value>;
}

/// JSON codec
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode(&self, item: &Value) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(item)?)
    }

    fn decode(&self, body: &[u8]) -> Result<Value> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_slice(body)?)
    }
}
