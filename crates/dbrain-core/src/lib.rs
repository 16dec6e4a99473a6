//! Core domain and application logic for the d-brain bot.
//!
//! This crate is framework-agnostic. Telegram, Deepgram, the LLM providers and
//! Todoist live behind ports (traits) implemented in adapter crates; the
//! handlers here only talk to those ports.

pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod git;
pub mod handlers;
pub mod http;
pub mod keyboard;
pub mod logging;
pub mod messaging;
pub mod ports;
pub mod processor;
pub mod retry;
pub mod session;
pub mod storage;

pub use errors::{Error, Result};
