// Remote Dooray API access
//
// - `client`: pooled HTTP client, credentials and endpoint construction
// - `envelope`: the `{header, result, totalCount}` response wrapper
// - `invoker`: single-shot execution and outcome classification

mod client;
mod envelope;
mod invoker;

pub use client::{DoorayClient, RemoteCall};
pub use envelope::{ErrorEnvelope, ErrorHeader, Page, RemoteEnvelope, ResultHeader};
pub use invoker::RemoteInvoker;
