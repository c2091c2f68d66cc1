//! High-level operations shared by clients.

mod processes;

pub use processes::{CreatedProcess, NewProcess, ProcessService};
