//! Data Models
//!
//! Settings, launch plans and command response types.

pub mod invocation;
pub mod response;
pub mod settings;

pub use invocation::*;
pub use response::*;
pub use settings::*;
