pub mod error;
pub mod ndjson;
pub mod report;

pub use error::{ReportError, Result};
pub use ndjson::{create_or_extend, read_graph, write_graph};
pub use report::{validation_report, write_validation_report};
