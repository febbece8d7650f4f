// Dooray MCP capability server
//
// Exposes the Dooray collaboration suite (wiki, project tasks, messenger,
// calendar, drive) as named, schema-described capabilities that an MCP host
// invokes over stdio.

pub mod args;
pub mod capabilities;
pub mod category;
pub mod config;
pub mod error;
pub mod registry;
pub mod remote;
pub mod server;
pub mod shaping;
pub mod types;

pub use args::Arguments;
pub use category::{Category, CategoryFilterReport, parse_enabled_categories, parse_with_report};
pub use config::{ClientConfig, ConfigError, parse_duration};
pub use error::{DomainError, ErrorKind, ErrorResponse};
pub use registry::{Capability, CapabilityDescriptor, CapabilityRegistry, RegistryError, ToolResponse};
pub use remote::{DoorayClient, RemoteInvoker};
pub use server::McpServer;
