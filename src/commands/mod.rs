//! Commands
//!
//! Entry points exposed to the front-end. Each command takes the shared
//! [`AppState`](crate::state::AppState) and returns a
//! [`CommandResponse`](crate::models::response::CommandResponse), except
//! `run_process`, which hands back a live event stream.

pub mod pipeline;
pub mod probes;
pub mod prompts;
pub mod settings;

pub use pipeline::*;
pub use probes::*;
pub use prompts::*;
pub use settings::*;
