use std::sync::Arc;

use assistant_config::Config;
use assistant_core::{CtrlC, InterruptWatcher, summarize};
use assistant_tools::{FetchConfig, WebContent};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct TldrInput {
    /// Bare domain or full URL.
    pub locator: String,
}

/// Summarises the readable text of a web page.
#[derive(Debug, Clone, Copy)]
pub struct TldrStrategy;

impl super::CommandStrategy for TldrStrategy {
    type Input = TldrInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::from_env()?;
        let mut backend = super::backend_from_config(config);
        let content = WebContent::new(FetchConfig::default())?;

        let token = CancellationToken::new();
        let _watcher = InterruptWatcher::spawn(Arc::new(CtrlC), token.clone());

        let summary = summarize(&mut backend, &content, &input.locator, &token).await?;
        println!("{summary}");
        Ok(())
    }
}
