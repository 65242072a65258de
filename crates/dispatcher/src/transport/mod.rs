//! Batch transport implementations

mod http;

pub use http::{classify_status, HttpTransport, MAX_ERROR_BODY_CHARS};
