// Registry construction errors

use thiserror::Error;

use crate::error::DomainError;

/// Errors raised while assembling the capability registry
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
	#[error("duplicate capability name: '{0}'")]
	DuplicateCapability(String),

	#[error("invalid input schema for capability '{name}': {message}")]
	InvalidSchema { name: String, message: String },
}

impl RegistryError {
	pub fn invalid_schema(name: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidSchema {
			name: name.into(),
			message: message.into(),
		}
	}

	pub fn code(&self) -> &'static str {
		match self {
			RegistryError::DuplicateCapability(_) => "DUPLICATE_CAPABILITY",
			RegistryError::InvalidSchema { .. } => "INVALID_SCHEMA",
		}
	}
}

impl From<RegistryError> for DomainError {
	fn from(err: RegistryError) -> Self {
		DomainError::internal(err.to_string()).with_code(err.code())
	}
}
