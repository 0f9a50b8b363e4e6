pub mod calculator;
pub mod cohort;
pub mod engine;
pub mod error;
pub mod graph;
pub mod model;
pub mod resolver;

pub use calculator::*;
pub use cohort::*;
pub use engine::*;
pub use error::AttainError;
pub use graph::*;
pub use model::*;
pub use resolver::*;
