//! Protocol stack abstraction for the OPC UA connection probe
//!
//! This crate defines the primitives the probe consumes (`connect`,
//! `create_session`, `read`, `close`, `disconnect`), the connect strategy that
//! is handed to the stack, and a scripted in-memory stack.

pub mod client;
pub mod scripted;
pub mod strategy;

pub use client::{ClientFactory, ClientOptions, UaClient, UaSession};
pub use scripted::{CallRecord, ConnectBehavior, ReadBehavior, Script, ScriptedStack, SessionBehavior};
pub use strategy::{ConnectStrategy, connect_with_retry};
