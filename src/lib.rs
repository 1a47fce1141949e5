//! Resilia is a terminal client for the Resilia mental health companion.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`core`] owns the persisted session, the request gateway that attaches
//!   the bearer credential, and the auth and chat services built on them.
//! - [`api`] defines the request and response payloads of the backend.
//! - [`cli`] parses arguments and runs the one-shot commands and the
//!   interactive chat.
//! - [`utils`] holds URL joining, line input and transcript logging.
//!
//! The binary (`src/main.rs`) routes through [`crate::cli::main`].

pub mod api;
pub mod cli;
pub mod core;
pub mod utils;
