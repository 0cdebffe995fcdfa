mod progress;
mod service;
mod view;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use progress::SessionProgress;
pub use service::{AnswerOutcome, QuizSession};
pub use view::{AnalysisBreakdownItem, AnalysisService};
pub use workflow::{QuizLoopService, SessionAnswerOutcome};
