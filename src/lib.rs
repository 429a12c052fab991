//! Client library for a knowledge-base scoped AI chatbot backend.
//!
//! The crate is split along the three cooperating pieces of the client:
//! authentication (token lifecycle and session state), the HTTP layer
//! (credential injection and session-expiry policy) and the chat layer
//! (services and conversation state management).

// Strict linting: unsafe code, undocumented public items and unused code
// are all rejected at compile time.
#![deny(warnings)]
#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(unused_variables)]
#![deny(unused_must_use)]
#![deny(non_snake_case)]
#![deny(non_camel_case_types)]
#![deny(non_upper_case_globals)]
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
// Clippy discipline.
#![deny(clippy::all)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::print_stdout)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

/// HTTP client wrapper with bearer-token injection and 401 handling.
pub mod api;
/// Authentication service, session object and token inspection.
pub mod auth;
/// Chat service and conversation state management.
pub mod chat;
/// Client configuration.
pub mod config;
/// Error types for the client.
pub mod error;
/// Token storage backends.
pub mod storage;
