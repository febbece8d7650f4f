// Capability argument extraction
//
// Handlers read their inputs through `Arguments` so that missing or malformed
// parameters are reported uniformly and before any network call is made.

use serde_json::{Map, Value};

use crate::error::DomainError;

/// Named arguments of a single capability call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
	inner: Map<String, Value>,
}

impl From<Map<String, Value>> for Arguments {
	fn from(inner: Map<String, Value>) -> Self {
		Self { inner }
	}
}

impl Arguments {
	pub fn new() -> Self {
		Self::default()
	}

	/// Accept a JSON object, or `null` for "no arguments".
	pub fn from_value(value: Value) -> Result<Self, DomainError> {
		match value {
			Value::Null => Ok(Self::new()),
			Value::Object(inner) => Ok(Self { inner }),
			other => Err(
				DomainError::validation(format!(
					"arguments must be a JSON object, got {}",
					type_name(&other)
				))
				.with_code("INVALID_ARGUMENTS"),
			),
		}
	}

	pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.inner.insert(name.into(), value.into());
		self
	}

	/// Raw value of `name`; an explicit `null` counts as absent.
	pub fn get(&self, name: &str) -> Option<&Value> {
		self.inner.get(name).filter(|v| !v.is_null())
	}

	pub fn is_empty(&self) -> bool {
		self.inner.is_empty()
	}

	pub fn required_str(&self, name: &str) -> Result<String, DomainError> {
		self
			.optional_str(name)?
			.ok_or_else(|| DomainError::parameter_missing(name))
	}

	/// String argument. Numbers are accepted and rendered as text; a blank
	/// string is treated as absent.
	pub fn optional_str(&self, name: &str) -> Result<Option<String>, DomainError> {
		match self.get(name) {
			None => Ok(None),
			Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
			Some(Value::String(s)) => Ok(Some(s.clone())),
			Some(Value::Number(n)) => Ok(Some(n.to_string())),
			Some(other) => Err(invalid(name, format!("must be a string, got {}", type_name(other)))),
		}
	}

	pub fn optional_u32(&self, name: &str) -> Result<Option<u32>, DomainError> {
		let parsed = match self.get(name) {
			None => return Ok(None),
			Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
			Some(Value::String(s)) if s.trim().is_empty() => return Ok(None),
			Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
			Some(_) => None,
		};
		parsed
			.map(Some)
			.ok_or_else(|| invalid(name, "must be a non-negative integer"))
	}

	pub fn optional_bool(&self, name: &str) -> Result<Option<bool>, DomainError> {
		match self.get(name) {
			None => Ok(None),
			Some(Value::Bool(b)) => Ok(Some(*b)),
			Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
				"true" => Ok(Some(true)),
				"false" => Ok(Some(false)),
				"" => Ok(None),
				_ => Err(invalid(name, "must be true or false")),
			},
			Some(_) => Err(invalid(name, "must be true or false")),
		}
	}

	/// List of strings given either as a JSON array or as a comma separated
	/// string. Blank entries are dropped.
	pub fn optional_string_list(&self, name: &str) -> Result<Option<Vec<String>>, DomainError> {
		let items = match self.get(name) {
			None => return Ok(None),
			Some(Value::String(s)) => s
				.split(',')
				.map(str::trim)
				.filter(|s| !s.is_empty())
				.map(String::from)
				.collect(),
			Some(Value::Array(values)) => {
				let mut items = Vec::with_capacity(values.len());
				for value in values {
					match value {
						Value::String(s) if s.trim().is_empty() => {},
						Value::String(s) => items.push(s.trim().to_string()),
						Value::Number(n) => items.push(n.to_string()),
						other => {
							return Err(invalid(
								name,
								format!("must contain only strings, found {}", type_name(other)),
							));
						},
					}
				}
				items
			},
			Some(other) => {
				return Err(invalid(
					name,
					format!("must be an array of strings, got {}", type_name(other)),
				));
			},
		};
		Ok(Some(items))
	}

	/// Like [`optional_string_list`](Self::optional_string_list) but at least one entry is required.
	pub fn required_string_list(&self, name: &str) -> Result<Vec<String>, DomainError> {
		match self.optional_string_list(name)? {
			Some(items) if !items.is_empty() => Ok(items),
			_ => Err(DomainError::parameter_missing(name)),
		}
	}

	/// Optional string restricted to `allowed` (exact match).
	pub fn one_of(&self, name: &str, allowed: &[&str]) -> Result<Option<String>, DomainError> {
		match self.optional_str(name)? {
			Some(value) if !allowed.contains(&value.as_str()) => Err(invalid(
				name,
				format!("must be one of {}, got '{value}'", allowed.join(", ")),
			)),
			value => Ok(value),
		}
	}

	pub fn optional_object(&self, name: &str) -> Result<Option<Map<String, Value>>, DomainError> {
		match self.get(name) {
			None => Ok(None),
			Some(Value::Object(map)) => Ok(Some(map.clone())),
			Some(other) => Err(invalid(name, format!("must be an object, got {}", type_name(other)))),
		}
	}
}

fn invalid(name: &str, problem: impl std::fmt::Display) -> DomainError {
	DomainError::validation(format!("the '{name}' parameter {problem}"))
		.with_code(format!("INVALID_{}", name.to_ascii_uppercase()))
}

fn type_name(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
