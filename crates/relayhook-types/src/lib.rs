//! Core types for the relayhook message dispatch runtime.
//!
//! This crate defines the data structures shared by the wire protocol, the
//! dispatch runtime and the command-line agent. It contains no business logic.

pub mod config;
pub mod error;
pub mod message;
