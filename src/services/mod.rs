//! Services
//!
//! Business logic services for the application.
//! Services handle the core functionality and are called by commands.

pub mod pipeline;
pub mod probe;
pub mod process;
pub mod staging;
pub mod visualization;

pub use pipeline::PipelineRunner;
pub use process::{InvocationHandle, ProcessSupervisor, SupervisorConfig};
pub use staging::{FileStager, StagingReport};
