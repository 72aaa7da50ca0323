//! Wire codec
//!
//! Frames are JSON objects with a `type` discriminator and per-variant named
//! fields. This module owns the payload representation, typed field readers
//! that report the offending field on failure, and a builder that omits absent
//! optional fields instead of writing nulls.
//!
//! Numbers keep their kind: integer fields only accept JSON integers, float
//! fields accept any JSON number. Base64 strings are carried as-is.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use super::commands::Command;
use super::error::ProtocolError;
use super::messages::ServerMessage;

/// Discriminator field name
pub const TYPE_FIELD: &str = "type";

/// Structured payload of one frame
pub type Payload = serde_json::Map<String, Value>;

/// Encode a client command (total)
pub fn encode(command: &Command) -> Payload {
	command.to_payload()
}

/// Decode a server payload into its typed message
pub fn decode(payload: &Payload) -> Result<ServerMessage, ProtocolError> {
	ServerMessage::from_payload(payload)
}

/// Parse frame text into a payload
pub fn parse_frame(text: &str) -> Result<Payload, ProtocolError> {
	match serde_json::from_str::<Value>(text)? {
		Value::Object(map) => Ok(map),
		_ => Err(ProtocolError::missing_discriminator()),
	}
}

/// Serialize a payload to frame text
pub fn to_frame(payload: Payload) -> String {
	Value::Object(payload).to_string()
}

/// Read the discriminator of a payload
pub fn discriminator(payload: &Payload) -> Result<&str, ProtocolError> {
	payload.get(TYPE_FIELD).and_then(Value::as_str).ok_or_else(ProtocolError::missing_discriminator)
}

/// Typed access to the fields of one payload.
///
/// A field that is absent or `null` counts as "not present". Present values
/// of the wrong JSON kind are always an error, also for optional fields.
pub struct FieldReader<'a> {
	payload: &'a Payload,
	kind: &'a str,
}

impl<'a> FieldReader<'a> {
	pub fn new(payload: &'a Payload, kind: &'a str) -> Self {
		FieldReader { payload, kind }
	}

	fn value(&self, field: &str) -> Option<&'a Value> {
		match self.payload.get(field) {
			None | Some(Value::Null) => None,
			Some(v) => Some(v),
		}
	}

	fn malformed(&self, field: &str) -> ProtocolError {
		ProtocolError::malformed(self.kind, field)
	}

	fn optional<T>(
		&self,
		field: &str,
		convert: impl FnOnce(&'a Value) -> Option<T>,
	) -> Result<Option<T>, ProtocolError> {
		match self.value(field) {
			None => Ok(None),
			Some(v) => convert(v).map(Some).ok_or_else(|| self.malformed(field)),
		}
	}

	fn required<T>(&self, field: &str, convert: impl FnOnce(&'a Value) -> Option<T>) -> Result<T, ProtocolError> {
		self.optional(field, convert)?.ok_or_else(|| self.malformed(field))
	}

	pub fn string(&self, field: &str) -> Result<String, ProtocolError> {
		self.required(field, |v| v.as_str().map(str::to_string))
	}

	pub fn opt_string(&self, field: &str) -> Result<Option<String>, ProtocolError> {
		self.optional(field, |v| v.as_str().map(str::to_string))
	}

	pub fn bool(&self, field: &str) -> Result<bool, ProtocolError> {
		self.required(field, Value::as_bool)
	}

	pub fn opt_bool(&self, field: &str) -> Result<Option<bool>, ProtocolError> {
		self.optional(field, Value::as_bool)
	}

	/// Integer field; floats are rejected
	pub fn int(&self, field: &str) -> Result<i64, ProtocolError> {
		self.required(field, Value::as_i64)
	}

	pub fn opt_int(&self, field: &str) -> Result<Option<i64>, ProtocolError> {
		self.optional(field, Value::as_i64)
	}

	/// Floating point field; integers are accepted as exact values
	pub fn float(&self, field: &str) -> Result<f64, ProtocolError> {
		self.required(field, Value::as_f64)
	}

	pub fn string_list(&self, field: &str) -> Result<Vec<String>, ProtocolError> {
		let items = self.required(field, Value::as_array)?;
		items
			.iter()
			.map(|item| item.as_str().map(str::to_string).ok_or_else(|| self.malformed(field)))
			.collect()
	}

	/// Nested record decoded through serde
	pub fn record<T: DeserializeOwned>(&self, field: &str) -> Result<T, ProtocolError> {
		let value = self.value(field).ok_or_else(|| self.malformed(field))?;
		T::deserialize(value).map_err(|_| self.malformed(field))
	}
}

/// Builds a payload for one discriminator
pub struct PayloadBuilder {
	payload: Payload,
}

impl PayloadBuilder {
	pub fn new(kind: &str) -> Self {
		let mut payload = Payload::new();
		payload.insert(TYPE_FIELD.to_string(), Value::String(kind.to_string()));
		PayloadBuilder { payload }
	}

	pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
		self.payload.insert(name.to_string(), value.into());
		self
	}

	/// Write the field only when present
	pub fn opt_field<V: Into<Value>>(self, name: &str, value: Option<V>) -> Self {
		match value {
			Some(v) => self.field(name, v),
			None => self,
		}
	}

	pub fn record<T: Serialize>(self, name: &str, value: &T) -> Self {
		match serde_json::to_value(value) {
			Ok(v) => self.field(name, v),
			Err(e) => {
				warn!("Cannot serialize field '{}': {}", name, e);
				self
			}
		}
	}

	pub fn build(self) -> Payload {
		self.payload
	}
}


// vim: ts=4
