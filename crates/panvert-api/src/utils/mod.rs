pub mod ip_extraction;
pub mod stream;
pub mod upload;
