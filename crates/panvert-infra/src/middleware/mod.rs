//! Shared HTTP middleware for Panvert services

pub mod request_id;

pub use request_id::{request_id_middleware, RequestId};
