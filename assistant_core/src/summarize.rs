use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::{Backend, BackendError, ContentSource, Error, Result};

pub const SUMMARY_PURPOSE: &str =
    "Please summarise the provided text as best you can. The shorter the better.";

/// Fetch the readable text behind `locator` and ask `backend` to summarise it.
pub async fn summarize<B, C>(
    backend: &mut B,
    content: &C,
    locator: &str,
    cancel: &CancellationToken,
) -> Result<String>
where
    B: Backend,
    C: ContentSource + ?Sized,
{
    backend.set_purpose(SUMMARY_PURPOSE);

    let text = content.get_content(locator).await.map_err(Error::Content)?;
    info!("Summarising {locator}: {} chars of content", text.len());

    match backend.ask(&text, cancel).await {
        Ok(summary) => Ok(summary),
        Err(BackendError::Cancelled) => Err(Error::Cancelled),
        Err(BackendError::Failed(e)) => Err(Error::Backend(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    #[derive(Default)]
    struct EchoBackend {
        purpose: Option<String>,
    }

    #[async_trait]
    impl Backend for EchoBackend {
        async fn ask(
            &self,
            question: &str,
            cancel: &CancellationToken,
        ) -> std::result::Result<String, BackendError> {
            if cancel.is_cancelled() {
                return Err(BackendError::Cancelled);
            }
            Ok(format!(
                "[{}] {question}",
                self.purpose.as_deref().unwrap_or_default()
            ))
        }

        fn give_example(&mut self, _question: &str, _answer: &str) {}

        fn reset(&mut self) {}

        fn set_purpose(&mut self, instructions: &str) {
            self.purpose = Some(instructions.to_string());
        }
    }

    struct StaticContent(Option<&'static str>);

    #[async_trait]
    impl ContentSource for StaticContent {
        async fn get_content(&self, locator: &str) -> anyhow::Result<String> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| anyhow::anyhow!("no content for {locator}"))
        }
    }

    #[tokio::test]
    async fn test_summary_uses_purpose_and_content() {
        let mut backend = EchoBackend::default();
        let content = StaticContent(Some("article body"));
        let token = CancellationToken::new();

        let Ok(summary) = summarize(&mut backend, &content, "example.com", &token).await else {
            panic!("summary failed");
        };
        assert_eq!(summary, format!("[{SUMMARY_PURPOSE}] article body"));
    }

    #[tokio::test]
    async fn test_content_failure_is_reported() {
        let mut backend = EchoBackend::default();
        let content = StaticContent(None);
        let token = CancellationToken::new();

        let result = summarize(&mut backend, &content, "example.com", &token).await;
        assert!(matches!(result, Err(Error::Content(_))));
    }

    #[tokio::test]
    async fn test_cancelled_summary() {
        let mut backend = EchoBackend::default();
        let content = StaticContent(Some("article body"));
        let token = CancellationToken::new();
        token.cancel();

        let result = summarize(&mut backend, &content, "example.com", &token).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
