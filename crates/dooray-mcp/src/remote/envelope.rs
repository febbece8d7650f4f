// Response wrappers returned by the Dooray API

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Status header present on every Dooray response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultHeader {
	pub is_successful: bool,
	pub result_code: i64,
	pub result_message: String,
}

/// Standard response wrapper.
///
/// Endpoints that may succeed without a payload are decoded as
/// `RemoteEnvelope<Option<T>>`; a missing or null `result` then becomes `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEnvelope<T> {
	pub header: ResultHeader,
	pub result: T,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub total_count: Option<u64>,
}

impl<T> RemoteEnvelope<T> {
	pub fn is_successful(&self) -> bool {
		self.header.is_successful
	}

	/// Error describing a semantically failed envelope
	pub fn failure(&self) -> DomainError {
		envelope_failure(&self.header)
	}

	/// Unwrap the payload, turning `isSuccessful == false` into an API error.
	pub fn into_result(self) -> Result<T, DomainError> {
		if self.header.is_successful {
			Ok(self.result)
		} else {
			Err(envelope_failure(&self.header))
		}
	}
}

impl<T> RemoteEnvelope<Vec<T>> {
	pub fn into_page(self) -> Result<Page<T>, DomainError> {
		let total_count = self.total_count;
		let items = self.into_result()?;
		Ok(Page { items, total_count })
	}
}

fn envelope_failure(header: &ResultHeader) -> DomainError {
	DomainError::api(
		header.result_message.clone(),
		format!("DOORAY_API_{}", header.result_code),
	)
}

/// A list result together with the remote total, when the endpoint reports one
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub total_count: Option<u64>,
}

impl<T> Page<T> {
	/// Remote total if reported, otherwise the number of items on this page
	pub fn total(&self) -> u64 {
		self.total_count.unwrap_or(self.items.len() as u64)
	}
}

/// Minimal shape of an error response body
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorEnvelope {
	pub header: ErrorHeader,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorHeader {
	pub result_message: String,
}
