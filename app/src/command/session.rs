use std::path::Path;

use assistant_config::{Config, create_audit_log};
use assistant_core::{Session, SharedSink, Termination};
use tracing::info;

/// Runs the interactive session on stdin/stdout, mirrored to a fresh audit
/// log.
#[derive(Debug, Clone, Copy)]
pub struct SessionStrategy;

impl super::CommandStrategy for SessionStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::from_env()?;
        info!("Using model {}", config.model);

        let (log_path, log_file) = create_audit_log()?;
        eprintln!("{}", audit_log_notice(&log_path));
        let backend = super::backend_from_config(config);

        let mut session = Session::builder(backend, SharedSink::new(log_file)).build()?;
        let termination = session.run().await?;

        match termination {
            Termination::Exit => info!("Session closed by user"),
            Termination::EndOfInput => info!("Session closed at end of input"),
        }
        info!(
            "{} exchanges recorded, audit log at {}",
            session.memory().len(),
            log_path.display()
        );
        Ok(())
    }
}

/// Startup line telling the user where the transcript goes.
fn audit_log_notice(path: &Path) -> String {
    format!("Audit log: {}", path.display())
}
