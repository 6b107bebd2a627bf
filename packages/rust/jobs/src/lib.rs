//! Background conversion jobs for the web server.
//!
//! - [`JobStore`]: the explicit in-memory job registry
//! - [`WorkerPool`] / [`JobQueue`]: a task queue drained by a fixed pool of tokio workers
//! - [`JobService`]: start, poll, download and clean up jobs

pub mod service;
pub mod store;
pub mod worker;

pub use service::{JobService, StartJob, validate_address};
pub use store::{JobEntry, JobRecord, JobStore, JobView};
pub use worker::{ConvertTask, JobQueue, WorkerPool};
