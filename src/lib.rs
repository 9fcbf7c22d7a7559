//! # toolcall - one round of function calling against a local model
//!
//! A small, pragmatic Rust library that asks an OpenAI-compatible
//! chat-completions server (LM Studio by default) a question, runs the tool
//! the model asks for, hands the result back and returns the model's answer.
//!
//! ## Architecture
//!
//! 1. **Providers** act as factories to create Clients.
//! 2. **Clients** store authentication and configuration state and send
//!    chat-completion requests.
//! 3. **Tools** are typed local functions collected in a `ToolRegistry`,
//!    which validates the model's arguments against each tool's schema.
//! 4. **Orchestrator** wraps a Client and a registry and runs the
//!    request → dispatch → finalize sequence.
//!
//! ## Example
//! ```no_run
//! use toolcall::providers::LmStudio;
//! use toolcall::receipt::ReceiptTool;
//! use toolcall::tools::ToolRegistry;
//! use toolcall::Orchestrator;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = LmStudio::from_env()?;
//!     let tools = ToolRegistry::new().register(ReceiptTool)?;
//!
//!     let outcome = Orchestrator::new(client, tools)
//!         .with_system_prompt("Sum the receipt prices yourself and report the total.")
//!         .run("Please give me a receipt for order number 1017.")
//!         .await?;
//!
//!     println!("{}", outcome.answer);
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod api;
pub mod client;
pub mod http;
pub mod model;
pub mod options;
pub mod providers;
pub mod receipt;
pub mod schema;
pub mod tools;

pub use agent::{AgentError, Orchestrator, RunOutcome, RunState};
pub use client::{Client, ClientError};
pub use model::{Message, Response, Role, ToolCall, Usage};
pub use schema::ParameterSchema;
pub use tools::{LocalTool, ToolDefinition, ToolError, ToolRegistry, ToolService};
