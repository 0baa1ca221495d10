// Copyright (c) 2024-2026 Martin Schröder <info@swedishembedded.com>
//
// SPDX-License-Identifier: MIT
use async_trait::async_trait;

use confab_history::History;

use crate::session::{Session, SessionOptions};

/// A model provider: the factory for sessions plus the auxiliary services
/// the runtime consumes (token counting for compaction, embeddings for
/// hosts that want them).  HTTP drivers implement this outside the core.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider id for logs and error messages.
    fn name(&self) -> &str;

    /// Open a session.  The options' tool list and response schema are
    /// validated by the driver before any network traffic.
    async fn new_session(&self, options: SessionOptions) -> anyhow::Result<Box<dyn Session>>;

    /// Count the tokens a history would occupy.
    ///
    /// The default is the characters ÷ 4 estimate; drivers with a real
    /// tokenizer endpoint override this.
    async fn count_tokens(&self, history: &History) -> anyhow::Result<usize> {
        Ok(history.approx_tokens())
    }

    /// Generate embeddings.  Not used by the agent loop; the default
    /// reports the capability as unsupported.
    async fn generate_embedding(
        &self,
        _dimension: usize,
        _inputs: Vec<String>,
    ) -> anyhow::Result<Vec<Vec<f64>>> {
        anyhow::bail!("provider `{}` does not support embeddings", self.name())
    }
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use confab_history::Message;

    use super::*;

    struct Bare;

    #[async_trait]
    impl Provider for Bare {
        fn name(&self) -> &str {
            "bare"
        }
        async fn new_session(&self, _o: SessionOptions) -> anyhow::Result<Box<dyn Session>> {
            anyhow::bail!("no sessions")
        }
    }

    #[tokio::test]
    async fn default_count_tokens_uses_chars_over_four() {
        let mut h = History::default();
        h.append(Message::user("12345678"));
        assert_eq!(Bare.count_tokens(&h).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn default_embedding_is_unsupported() {
        let err = Bare
            .generate_embedding(8, vec!["x".into()])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not support embeddings"));
    }
}
