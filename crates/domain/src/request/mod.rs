//! Outgoing HTTP request types

mod method;
mod spec;

pub use method::HttpMethod;
pub use spec::{AUTHORIZATION, CONTENT_TYPE, HttpRequest, JSON_CONTENT_TYPE};
