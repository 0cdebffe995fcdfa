mod answer;
mod ids;
mod question;
mod result;

pub use answer::Answer;
pub use ids::{ParseIdError, QuestionId, SessionId};
pub use question::{Question, QuestionError};
pub use result::{AnswerRecord, SessionResult, SessionResultError, NOT_ANSWERED};
