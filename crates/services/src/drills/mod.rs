mod session;
mod workflow;

// Public API of the drill subsystem.
pub use crate::error::DrillError;
pub use session::{DrillCompletion, DrillSession};
pub use workflow::{AnswerResult, DrillService};
