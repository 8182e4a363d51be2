//! Lifecycle of one generation request at a time.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use shared::{
    domain::Phase,
    error::{ClientError, DEFAULT_GENERATION_ERROR},
    protocol::{generated_outputs, GenerationRequest, GENERATE_PATH},
};
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;
use tracing::{debug, info, warn};

use crate::transport::{Transport, TransportRequest};

/// Observable state of the request controller. Outputs exist only on
/// success and the error message only on failure.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Pending,
    Succeeded {
        outputs: Vec<String>,
    },
    Failed {
        message: String,
    },
}

impl RequestState {
    pub fn phase(&self) -> Phase {
        match self {
            RequestState::Idle => Phase::Idle,
            RequestState::Pending => Phase::Pending,
            RequestState::Succeeded { .. } => Phase::Succeeded,
            RequestState::Failed { .. } => Phase::Failed,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Pending)
    }

    pub fn outputs(&self) -> Option<&[String]> {
        match self {
            RequestState::Succeeded { outputs } => Some(outputs),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            RequestState::Failed { message } => Some(message),
            _ => None,
        }
    }

    fn failed(err: &ClientError) -> Self {
        RequestState::Failed {
            message: err.user_message(DEFAULT_GENERATION_ERROR),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The request ran and its result landed in state.
    Completed(Phase),
    /// The controller was stopped while the request was in flight.
    Discarded,
    RejectedEmptyPrompt,
    RejectedPending,
    RejectedStopped,
}

struct RequestInner {
    state: RequestState,
    ticket: u64,
    running: bool,
    /// A transport call is outstanding, possibly one abandoned by `stop`.
    in_flight: bool,
}

pub struct RequestController {
    transport: Arc<dyn Transport>,
    inner: Mutex<RequestInner>,
    snapshots: watch::Sender<RequestState>,
}

impl RequestController {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        let (snapshots, _) = watch::channel(RequestState::Idle);
        Self {
            transport,
            inner: Mutex::new(RequestInner {
                state: RequestState::Idle,
                ticket: 0,
                running: true,
                in_flight: false,
            }),
            snapshots,
        }
    }

    pub fn snapshot(&self) -> RequestState {
        self.lock().state.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.snapshots.subscribe()
    }

    pub fn changes(&self) -> WatchStream<RequestState> {
        WatchStream::new(self.subscribe())
    }

    /// Re-enables submissions after [`RequestController::stop`].
    pub fn start(&self) {
        self.lock().running = true;
    }

    /// Drops any in-flight result and rejects further submissions until
    /// restarted. A pending request is reset to idle. The abandoned call is
    /// not cancelled, so after a restart `submit` keeps answering
    /// [`SubmitOutcome::RejectedPending`] until that call has resolved.
    pub fn stop(&self) {
        let mut inner = self.lock();
        inner.running = false;
        inner.ticket += 1;
        if inner.state.is_pending() {
            inner.state = RequestState::Idle;
            self.publish(&inner);
        }
    }

    /// Runs one generation request to completion. Rejected without any state
    /// change when the prompt is blank or another request is pending.
    pub async fn submit(&self, request: GenerationRequest) -> SubmitOutcome {
        let ticket = {
            let mut inner = self.lock();
            if !inner.running {
                debug!("generate: submit rejected, controller stopped");
                return SubmitOutcome::RejectedStopped;
            }
            if !request.is_submittable() {
                debug!("generate: submit rejected, empty prompt");
                return SubmitOutcome::RejectedEmptyPrompt;
            }
            if inner.state.is_pending() || inner.in_flight {
                debug!("generate: submit rejected, request already in flight");
                return SubmitOutcome::RejectedPending;
            }
            inner.in_flight = true;
            inner.ticket += 1;
            inner.state = RequestState::Pending;
            self.publish(&inner);
            inner.ticket
        };

        info!(
            tone = %request.tone,
            sentiment = %request.sentiment,
            length = %request.length,
            variants = request.variant_count(),
            "generate: request sent"
        );
        let next = match self.send(&request).await {
            Ok(outputs) => {
                info!("generate: received {} outputs", outputs.len());
                RequestState::Succeeded { outputs }
            }
            Err(err) => {
                warn!("generate: request failed: {err}");
                RequestState::failed(&err)
            }
        };

        let mut inner = self.lock();
        inner.in_flight = false;
        if !inner.running || inner.ticket != ticket {
            debug!("generate: discarding result of abandoned request");
            return SubmitOutcome::Discarded;
        }
        let phase = next.phase();
        inner.state = next;
        self.publish(&inner);
        SubmitOutcome::Completed(phase)
    }

    async fn send(&self, request: &GenerationRequest) -> Result<Vec<String>, ClientError> {
        let body = serde_json::to_value(request.to_body())
            .map_err(|err| ClientError::Validation(err.to_string()))?;
        let response = self
            .transport
            .send(TransportRequest::post_json(GENERATE_PATH, body))
            .await?;
        if !response.is_success() {
            return Err(ClientError::Status(response.status));
        }
        Ok(generated_outputs(response.body.as_ref().unwrap_or(&Value::Null)))
    }

    fn publish(&self, inner: &RequestInner) {
        self.snapshots.send_replace(inner.state.clone());
    }

    fn lock(&self) -> MutexGuard<'_, RequestInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
#[path = "tests/request_tests.rs"]
mod tests;
