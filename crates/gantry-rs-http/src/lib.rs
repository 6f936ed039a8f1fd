//! HTTP layer for the gantry toolkit.
//!
//! This crate defines the transport-agnostic value types the pipeline moves
//! around: the inbound [`Request`], the composable [`Response`], the JSON
//! body [`merge`](body::merge) policy, and the [`ResponseMapper`] registry
//! that turns application codes into canonical HTTP answers.

pub mod body;
pub mod codes;
pub mod mapper;
pub mod request;
pub mod response;

pub use mapper::{GetOptions, ResponseMapper, ResponseMapperConfig};
pub use request::{Request, RequestBuilder};
pub use response::Response;
