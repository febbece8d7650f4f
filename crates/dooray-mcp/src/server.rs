// MCP host transport: newline-delimited JSON-RPC 2.0 over a byte stream
//
// Requests are served concurrently, one task each. Responses are written by a
// single writer task in completion order.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use serde_json::{Value, json};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

use crate::registry::CapabilityRegistry;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

/// Serves the capability registry to an MCP host.
#[derive(Debug, Clone)]
pub struct McpServer {
	registry: Arc<CapabilityRegistry>,
	name: String,
	version: String,
	instructions: Option<String>,
}

/// A decoded incoming line
#[derive(Debug, Clone, PartialEq)]
enum Incoming {
	Request { id: Value, method: String, params: Value },
	Notification { method: String, params: Value },
}

impl McpServer {
	pub fn new(registry: Arc<CapabilityRegistry>) -> Self {
		Self {
			registry,
			name: env!("CARGO_PKG_NAME").to_string(),
			version: env!("CARGO_PKG_VERSION").to_string(),
			instructions: None,
		}
	}

	pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
		self.instructions = Some(instructions.into());
		self
	}

	pub fn registry(&self) -> &Arc<CapabilityRegistry> {
		&self.registry
	}

	/// Serve the host over this process's stdin and stdout.
	pub async fn serve_stdio(self) -> io::Result<()> {
		self.run(BufReader::new(tokio::io::stdin()), tokio::io::stdout()).await
	}

	/// Serve until `reader` reaches end of input.
	///
	/// Requests still in flight at end of input are aborted and get no response.
	pub async fn run<R, W>(self, reader: R, writer: W) -> io::Result<()>
	where
		R: AsyncBufRead + Unpin,
		W: AsyncWrite + Unpin + Send + 'static,
	{
		let server = Arc::new(self);
		let (tx, rx) = mpsc::unbounded_channel::<Value>();
		let writer_task = tokio::spawn(write_responses(rx, writer));
		let mut in_flight: HashMap<String, AbortHandle> = HashMap::new();

		let mut lines = reader.lines();
		while let Some(line) = lines.next_line().await? {
			if line.trim().is_empty() {
				continue;
			}
			match decode(&line) {
				Err(error) => {
					let _ = tx.send(error);
				},
				Ok(Incoming::Notification { method, params }) => {
					if method == "notifications/cancelled" {
						cancel(&mut in_flight, &params);
					} else {
						server.handle_notification(&method);
					}
				},
				Ok(Incoming::Request { id, method, params }) => {
					in_flight.retain(|_, handle| !handle.is_finished());
					let key = id.to_string();
					let server = server.clone();
					let tx = tx.clone();
					let task = tokio::spawn(async move {
						let response = server.handle_request(id, &method, params).await;
						let _ = tx.send(response);
					});
					in_flight.insert(key, task.abort_handle());
				},
			}
		}

		in_flight.retain(|_, handle| !handle.is_finished());
		info!(
			target: "dooray::server",
			in_flight = in_flight.len(),
			"host closed the connection"
		);
		for (_, handle) in in_flight.drain() {
			handle.abort();
		}
		drop(tx);
		match writer_task.await {
			Ok(result) => result,
			Err(e) => Err(io::Error::other(e)),
		}
	}

	/// Answer one line sequentially; `None` for notifications.
	pub async fn handle_line(&self, line: &str) -> Option<Value> {
		match decode(line) {
			Err(error) => Some(error),
			Ok(Incoming::Notification { method, .. }) => {
				self.handle_notification(&method);
				None
			},
			Ok(Incoming::Request { id, method, params }) => {
				Some(self.handle_request(id, &method, params).await)
			},
		}
	}

	async fn handle_request(&self, id: Value, method: &str, params: Value) -> Value {
		debug!(target: "dooray::server", %method, %id, "request");
		match method {
			"initialize" => result(id, self.initialize_result()),
			"ping" => result(id, json!({})),
			"tools/list" => result(id, json!({"tools": self.registry.tools()})),
			"tools/call" => self.call_tool(id, params).await,
			_ => error(id, METHOD_NOT_FOUND, format!("Method not found: {method}")),
		}
	}

	fn handle_notification(&self, method: &str) {
		match method {
			"notifications/initialized" => {
				info!(
					target: "dooray::server",
					capabilities = self.registry.len(),
					"host initialized"
				);
			},
			"notifications/cancelled" => {},
			_ => warn!(target: "dooray::server", %method, "ignoring unknown notification"),
		}
	}

	fn initialize_result(&self) -> Value {
		let mut result = json!({
			"protocolVersion": PROTOCOL_VERSION,
			"capabilities": {"tools": {}},
			"serverInfo": {"name": self.name, "version": self.version},
		});
		if let Some(instructions) = &self.instructions {
			result["instructions"] = json!(instructions);
		}
		result
	}

	async fn call_tool(&self, id: Value, params: Value) -> Value {
		let Some(name) = params.get("name").and_then(Value::as_str) else {
			return error(id, INVALID_PARAMS, "tools/call requires a string 'name'");
		};
		let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

		let outcome = self.registry.call(name, arguments).await.into_call_result();
		match serde_json::to_value(&outcome) {
			Ok(value) => result(id, value),
			Err(e) => error(id, INTERNAL_ERROR, format!("failed to encode tool result: {e}")),
		}
	}
}

fn decode(line: &str) -> Result<Incoming, Value> {
	let message: Value = serde_json::from_str(line)
		.map_err(|e| error(Value::Null, PARSE_ERROR, format!("Parse error: {e}")))?;

	let id = message.get("id").cloned();
	let Some(method) = message.get("method").and_then(Value::as_str) else {
		return Err(error(
			id.unwrap_or(Value::Null),
			INVALID_REQUEST,
			"Invalid request: missing method",
		));
	};
	let method = method.to_string();
	let params = message.get("params").cloned().unwrap_or(Value::Null);

	Ok(match id {
		Some(id) => Incoming::Request { id, method, params },
		None => Incoming::Notification { method, params },
	})
}

fn cancel(in_flight: &mut HashMap<String, AbortHandle>, params: &Value) {
	let Some(request_id) = params.get("requestId") else {
		return;
	};
	if let Some(handle) = in_flight.remove(&request_id.to_string()) {
		handle.abort();
		let reason = params.get("reason").and_then(Value::as_str).unwrap_or_default();
		debug!(
			target: "dooray::server",
			id = %request_id,
			reason = %reason,
			"request cancelled by host"
		);
	}
}

async fn write_responses<W>(mut rx: mpsc::UnboundedReceiver<Value>, mut writer: W) -> io::Result<()>
where
	W: AsyncWrite + Unpin,
{
	while let Some(message) = rx.recv().await {
		let mut line = message.to_string();
		line.push('\n');
		writer.write_all(line.as_bytes()).await?;
		writer.flush().await?;
	}
	Ok(())
}

fn result(id: Value, result: Value) -> Value {
	json!({"jsonrpc": "2.0", "id": id, "result": result})
}

fn error(id: Value, code: i64, message: impl Into<String>) -> Value {
	json!({
		"jsonrpc": "2.0",
		"id": id,
		"error": {"code": code, "message": message.into()},
	})
}
