//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, dispatched
//! statically from `main`.

use assistant_config::Config;
use assistant_providers::OpenAiBackend;

mod session;
mod tldr;
mod version;

pub use session::SessionStrategy;
pub use tldr::{TldrInput, TldrStrategy};
pub use version::VersionStrategy;

/// Contract shared by all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Build the backend from the environment configuration.
fn backend_from_config(config: Config) -> OpenAiBackend {
    OpenAiBackend::new(config.api_key)
        .with_model(config.model)
        .with_base_url(config.base_url)
}
