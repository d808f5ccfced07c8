mod models;

pub use models::{Session, SessionState, TokenPair, UserId, UserSummary, DEFAULT_TOKEN_TYPE};
