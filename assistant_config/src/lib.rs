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

mod audit_log;
mod schema;

pub use audit_log::{
    AUDIT_LOG_SUBDIR, audit_log_dir, create_audit_log, create_audit_log_at,
    resolve_audit_log_dir,
};
pub use schema::{API_KEY_VAR, BASE_URL_VAR, Config, MODEL_VAR};
