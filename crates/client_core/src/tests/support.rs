//! In-memory transport whose calls are answered by the test, in any order.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::transport::{Transport, TransportError, TransportRequest, TransportResponse};

pub type Reply = Result<TransportResponse, TransportError>;

pub struct PendingCall {
    pub request: TransportRequest,
    respond: oneshot::Sender<Reply>,
}

impl PendingCall {
    pub fn reply(self, reply: Reply) {
        let _ = self.respond.send(reply);
    }
}

pub struct ScriptedTransport {
    calls: mpsc::UnboundedSender<PendingCall>,
}

impl ScriptedTransport {
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<PendingCall>) {
        let (calls, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { calls }), rx)
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let (respond, reply) = oneshot::channel();
        self.calls
            .send(PendingCall { request, respond })
            .map_err(|_| TransportError::Network("scripted transport closed".into()))?;
        reply
            .await
            .map_err(|_| TransportError::Network("scripted reply dropped".into()))?
    }
}
