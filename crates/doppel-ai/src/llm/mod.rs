pub mod http;
pub mod json;

pub use http::HttpCompletionBackend;
pub use json::{parse_structured, strip_code_fence};
