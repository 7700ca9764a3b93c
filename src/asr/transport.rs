//! Transport abstraction for the streaming ASR provider.
//!
//! [`AsrTransport`] is the seam the adapter drives; production code talks
//! to a real provider over a WebSocket-like connection, tests drive
//! [`mock::MockTransport`] instead. A small trait boundary sits wherever an
//! external network service backs a component, the same shape as
//! [`crate::translation::handler::TranslationHandler`].

use async_trait::async_trait;

use super::types::{AsrConnectOptions, AsrError, ProviderEvent};

/// A streaming connection to an ASR provider.
#[async_trait]
pub trait AsrTransport: Send {
    async fn connect(&mut self, options: &AsrConnectOptions) -> Result<(), AsrError>;

    /// Send one PCM frame upstream.
    async fn send_frame(&mut self, frame: &[u8]) -> Result<(), AsrError>;

    /// Send a provider-defined keep-alive when no audio has flowed for a
    /// while (§4.1).
    async fn send_keepalive(&mut self) -> Result<(), AsrError>;

    async fn close(&mut self) -> Result<(), AsrError>;

    /// Receive the next provider event, or `None` once the transport has
    /// been closed and drained.
    async fn recv_event(&mut self) -> Option<ProviderEvent>;
}

/// A hand-rolled in-memory transport for tests, scripted by pushing
/// [`ProviderEvent`]s and optionally failing `connect`/`send_frame`.
pub mod mock {
    use super::*;
    use tokio::sync::mpsc;

    pub struct MockTransport {
        events_rx: mpsc::UnboundedReceiver<ProviderEvent>,
        pub events_tx: mpsc::UnboundedSender<ProviderEvent>,
        pub fail_connect: bool,
        pub fail_connect_auth: bool,
        pub fail_send_until: Option<u32>,
        send_count: u32,
        pub sent_frames: Vec<Vec<u8>>,
        pub keepalives_sent: u32,
        pub connected: bool,
    }

    impl MockTransport {
        pub fn new() -> Self {
            let (tx, rx) = mpsc::unbounded_channel();
            Self {
                events_rx: rx,
                events_tx: tx,
                fail_connect: false,
                fail_connect_auth: false,
                fail_send_until: None,
                send_count: 0,
                sent_frames: Vec::new(),
                keepalives_sent: 0,
                connected: false,
            }
        }

        pub fn push(&self, event: ProviderEvent) {
            let _ = self.events_tx.send(event);
        }
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl AsrTransport for MockTransport {
        async fn connect(&mut self, _options: &AsrConnectOptions) -> Result<(), AsrError> {
            if self.fail_connect_auth {
                return Err(AsrError::AuthError {
                    message: "invalid credentials".into(),
                });
            }
            if self.fail_connect {
                return Err(AsrError::TransportError {
                    message: "mock transport connect failure".into(),
                });
            }
            self.connected = true;
            Ok(())
        }

        async fn send_frame(&mut self, frame: &[u8]) -> Result<(), AsrError> {
            self.send_count += 1;
            if let Some(until) = self.fail_send_until {
                if self.send_count <= until {
                    return Err(AsrError::TransportError {
                        message: "mock transport send failure".into(),
                    });
                }
            }
            self.sent_frames.push(frame.to_vec());
            Ok(())
        }

        async fn send_keepalive(&mut self) -> Result<(), AsrError> {
            self.keepalives_sent += 1;
            Ok(())
        }

        async fn close(&mut self) -> Result<(), AsrError> {
            self.connected = false;
            Ok(())
        }

        async fn recv_event(&mut self) -> Option<ProviderEvent> {
            self.events_rx.recv().await
        }
    }
}
