//! Shared test scaffolding: an in-memory `Transport` that records every
//! send instead of touching a socket, following the teacher's
//! `transaction_test_utils.rs` pattern of a mock transport plus a thin
//! `TestEnvironment`.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use sipstack_core::message::Message;
use sipstack_transport::{Result, Transport};

#[derive(Debug)]
pub struct MockTransport {
    local: SocketAddr,
    sent: Mutex<Vec<(Message, SocketAddr)>>,
    closed: AtomicBool,
}

impl MockTransport {
    pub fn new(local: SocketAddr) -> Arc<Self> {
        Arc::new(Self { local, sent: Mutex::new(Vec::new()), closed: AtomicBool::new(false) })
    }

    pub fn sent_messages(&self) -> Vec<(Message, SocketAddr)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.local)
    }

    async fn send_message(&self, message: Message, destination: SocketAddr) -> Result<()> {
        self.sent.lock().unwrap().push((message, destination));
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}
