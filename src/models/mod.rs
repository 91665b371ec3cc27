pub mod metrics;
pub mod request;

pub use metrics::*;
pub use request::*;
