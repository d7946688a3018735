//! Panvert API Library
//!
//! This crate provides the HTTP handlers, middleware, background job runner
//! and application setup for the conversion service.

mod api_doc;
mod handlers;
mod middleware;
mod services;
mod utils;

pub mod error;
pub mod setup;
pub mod state;

pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
