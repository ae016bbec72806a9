//! Client-side half of the app: API calls, credential handling, the global
//! membership mirror, and the optimistic like/save controller.

mod api;
mod controller;
mod feed_cache;
mod membership;
mod session;

pub use api::ApiClient;
pub use controller::{InteractionApi, InteractionController, MarkState, ToggleOutcome};
pub use feed_cache::FeedCache;
pub use membership::MembershipStore;
pub use session::{
    CredentialStore, MemoryCredentialStore, Notifier, SessionEvent, SessionGuard, TracingNotifier,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("request failed with status {status}: {message}")]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("server rejected the request: {0}")]
    Rejected(String),

    #[error("not logged in")]
    NotLoggedIn,
}
