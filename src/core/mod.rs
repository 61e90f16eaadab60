//! Core interpreter — recipe model, validation, command table, execution.

pub mod collector;
pub mod context;
pub mod error;
pub mod executor;
pub mod interpreter;
pub mod parser;
pub mod registry;
pub mod settings;
pub mod substitute;
pub mod types;
pub mod validator;
