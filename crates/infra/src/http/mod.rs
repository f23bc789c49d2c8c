//! Graph API executor and its sub-operations

pub mod batch;
pub mod classify;
pub mod client;
pub mod inspect;
pub mod pagination;
pub mod request;
pub mod response;

pub use batch::BatchOperation;
pub use classify::{classify, error_from_response, parse_retry_after};
pub use client::{GraphApiClient, GraphApiClientBuilder};
pub use inspect::parse_inspection;
pub use pagination::next_cursor;
pub use request::{FilePart, GraphRequest};
pub use response::GraphResponse;
