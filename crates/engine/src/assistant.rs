//! Assistant relay: stateless request/response bridge from a free-text
//! question to the AI-assistant endpoint.
//!
//! Lifecycle is independent of the alert stream. One in-flight request
//! per relay; the transcript is display history only and has no effect
//! on later requests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use alertdash_core::AssistantError;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;

#[derive(Debug, Serialize)]
struct QuestionBody<'a> {
    question: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnswerBody {
    answer: String,
    #[serde(default)]
    citations: Option<HashMap<String, String>>,
}

/// One completed question/answer pair.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
    pub citations: Option<HashMap<String, String>>,
}

struct RelayInner {
    client: reqwest::Client,
    base_url: String,
    in_flight: AtomicBool,
    transcript: Mutex<Vec<Exchange>>,
}

/// Cheaply cloneable handle to the relay.
#[derive(Clone)]
pub struct AssistantRelay {
    inner: Arc<RelayInner>,
}

/// Clears the in-flight flag on every exit path from `ask`.
struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl AssistantRelay {
    pub fn new(config: &Config) -> Result<Self, AssistantError> {
        let client = reqwest::Client::builder()
            .timeout(config.assistant_timeout)
            .build()
            .map_err(|err| AssistantError::Transport {
                status: None,
                detail: format!("client build failed: {err}"),
            })?;
        Ok(Self {
            inner: Arc::new(RelayInner {
                client,
                base_url: config.api_base_url.clone(),
                in_flight: AtomicBool::new(false),
                transcript: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Ask the assistant one question.
    ///
    /// Empty or whitespace-only questions are rejected without a
    /// network call; a second `ask` while one is pending returns
    /// [`AssistantError::Busy`] (callers should disable submission
    /// during an outstanding request). No retry on failure.
    pub async fn ask(&self, question: &str) -> Result<String, AssistantError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AssistantError::EmptyQuestion);
        }

        if self
            .inner
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(AssistantError::Busy);
        }
        let _guard = InFlightGuard(&self.inner.in_flight);

        debug!(%question, "assistant question sent");
        let url = format!("{}/api/ai-assistant", self.inner.base_url);
        let response = self
            .inner
            .client
            .post(&url)
            .json(&QuestionBody { question })
            .send()
            .await
            .map_err(|err| AssistantError::Transport {
                status: None,
                detail: err.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "assistant request rejected");
            return Err(AssistantError::Transport {
                status: Some(status.as_u16()),
                detail: format!("assistant endpoint returned {status}"),
            });
        }

        let body: AnswerBody = response.json().await.map_err(|err| AssistantError::Shape {
            detail: err.to_string(),
        })?;

        self.inner.transcript.lock().push(Exchange {
            question: question.to_string(),
            answer: body.answer.clone(),
            citations: body.citations,
        });
        Ok(body.answer)
    }

    /// Whether a request is currently outstanding (UI should disable
    /// submission while true).
    pub fn is_busy(&self) -> bool {
        self.inner.in_flight.load(Ordering::SeqCst)
    }

    /// Prior question/answer pairs, oldest first.
    pub fn transcript(&self) -> Vec<Exchange> {
        self.inner.transcript.lock().clone()
    }
}
