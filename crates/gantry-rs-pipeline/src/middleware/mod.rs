//! Built-in middleware and handlers: CORS, throttling, request deadlines,
//! access logging, and the API status endpoint.

mod api_status;
mod cors;
mod request_logger;
mod throttle;
mod timeout;

pub use api_status::api_status;
pub use cors::Cors;
pub use request_logger::RequestLogger;
pub use throttle::Throttle;
pub use timeout::Timeout;
