pub mod config;
pub mod error;
pub mod logging;
pub mod service;

pub use config::*;
pub use error::ReportError;
pub use logging::init_tracing;
pub use service::*;
