#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Session engine for the interactive assistant.
//!
//! The engine reads lines from an audit-mirrored input, dispatches each one
//! (exit, local-file embedding, forget, or a question for the backend) and
//! writes framed replies through an audit-mirrored output.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

pub mod embed;
pub mod error;
pub mod memory;
pub mod request;
pub mod session;
pub mod stream;
pub mod summarize;

pub use error::{Error, Result};
pub use memory::{ConversationMemory, Exchange};
pub use request::{CtrlC, Interrupt, InterruptWatcher};
pub use session::{Directive, Session, SessionBuilder, Termination};
pub use stream::{MirroredReader, MirroredWriter, SharedSink};
pub use summarize::{SUMMARY_PURPOSE, summarize};

/// Failure modes of a backend request.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The request observed its cancellation token and stopped.
    #[error("request cancelled")]
    Cancelled,

    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

/// Question-answering collaborator.
///
/// Examples given through [`Backend::give_example`] accumulate as few-shot
/// context for later questions until [`Backend::reset`] is called.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Answer `question`, aborting promptly once `cancel` is triggered.
    async fn ask(
        &self,
        question: &str,
        cancel: &CancellationToken,
    ) -> std::result::Result<String, BackendError>;

    fn give_example(&mut self, question: &str, answer: &str);

    fn reset(&mut self);

    /// Replace the standing instructions sent ahead of every question.
    fn set_purpose(&mut self, instructions: &str);
}

/// Fetches readable text for a locator (bare domain or full URL).
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn get_content(&self, locator: &str) -> anyhow::Result<String>;
}
