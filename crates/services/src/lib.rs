#![forbid(unsafe_code)]

pub mod error;
pub mod gate;
pub mod http;
pub mod remote;
pub mod sessions;

pub use quiz_core::Clock;

pub use error::{GateError, SessionError};
pub use gate::{
    ExternalDetector, HttpIdentityGateway, IdentityGateway, LivenessCheck, LoginGate,
    StaticIdentityGateway, StubAlwaysTrue,
};
pub use http::{ApiClient, ApiConfig};
pub use remote::{HttpQuestionSource, HttpResultBackend};

pub use sessions::{
    AnalysisBreakdownItem, AnalysisService, AnswerOutcome, QuizLoopService, QuizSession,
    SessionAnswerOutcome, SessionProgress,
};
