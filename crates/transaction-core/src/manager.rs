//! The transaction layer (component I, spec §4.7): a concurrent
//! `TxKey → Transaction` store plus the demultiplexing logic that routes
//! inbound messages to existing transactions or spins up new ones.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, RwLock};

use sipstack_core::header::Header;
use sipstack_core::message::{Message, Request, Response};
use sipstack_core::primitive::Method;
use sipstack_transport::Transport;

use crate::error::{Result, TransactionError};
use crate::event::TransactionEvent;
use crate::key::{make_client_tx_key, make_server_tx_key, TxKey};
use crate::timer::{TimerFactory, TimerSettings, TokioTimerFactory};
use crate::transaction::{Transaction, TransactionKind, TransactionState, TxInput};

/// The default bound on the manager's external event channel; producers
/// block (spec §5's back-pressure) once a consumer falls this far
/// behind.
const EVENT_CHANNEL_CAPACITY: usize = 256;

struct Store {
    transactions: RwLock<HashMap<TxKey, Transaction>>,
    subscribers: RwLock<HashMap<TxKey, Vec<mpsc::Sender<TransactionEvent>>>>,
}

/// Holds every live transaction and drives the inbound/outbound
/// demultiplexing described in spec §4.7. Constructed with
/// [`TransactionManager::new`], which also returns the external event
/// receiver — spec.md's narrower `new_server_transactions`/
/// `stray_responses`/`errors` streams are filtering projections a caller
/// builds over that one receiver (spec §4.7a).
pub struct TransactionManager {
    transport: Arc<dyn Transport>,
    /// The transport-name string `sipstack_transport::is_reliable` keys
    /// on (`"UDP"`, `"TCP"`, ...) — the `Transport` trait itself doesn't
    /// carry this, since reliability is a transport-level property, not
    /// a per-call one (spec §6.1).
    transport_name: String,
    timer_settings: TimerSettings,
    timer_factory: Arc<dyn TimerFactory>,
    store: Arc<Store>,
    internal_tx: mpsc::Sender<TransactionEvent>,
}

impl TransactionManager {
    /// Builds a manager over `transport`, using the default (real)
    /// timer factory. Returns the manager and the external event stream.
    pub fn new(
        transport: Arc<dyn Transport>,
        transport_name: impl Into<String>,
    ) -> (Arc<TransactionManager>, mpsc::Receiver<TransactionEvent>) {
        Self::with_timers(
            transport,
            transport_name,
            TimerSettings::default(),
            Arc::new(TokioTimerFactory),
        )
    }

    /// As [`TransactionManager::new`], but with an injected timer
    /// factory and settings — what tests use to substitute a fast/paused
    /// virtual clock (spec §9).
    pub fn with_timers(
        transport: Arc<dyn Transport>,
        transport_name: impl Into<String>,
        timer_settings: TimerSettings,
        timer_factory: Arc<dyn TimerFactory>,
    ) -> (Arc<TransactionManager>, mpsc::Receiver<TransactionEvent>) {
        let (internal_tx, internal_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let (external_tx, external_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let store = Arc::new(Store {
            transactions: RwLock::new(HashMap::new()),
            subscribers: RwLock::new(HashMap::new()),
        });
        let manager = Arc::new(TransactionManager {
            transport,
            transport_name: transport_name.into(),
            timer_settings,
            timer_factory,
            store: store.clone(),
            internal_tx,
        });
        tokio::spawn(run_dispatch_loop(store, internal_rx, external_tx));
        (manager, external_rx)
    }

    fn reliable(&self) -> bool {
        sipstack_transport::is_reliable(&self.transport_name)
    }

    /// Builds and stores a client transaction for `request` without
    /// sending it; call [`TransactionManager::send_request`] (or
    /// `transaction.start()` directly) to perform the initial send.
    pub async fn create_client_transaction(
        &self,
        request: Request,
        destination: SocketAddr,
    ) -> Result<TxKey> {
        let key = make_client_tx_key(&Message::Request(request.clone()))?;
        let kind = TransactionKind::for_request(&request.method, true);
        let txn = Transaction::new_client(
            kind,
            key.clone(),
            request,
            destination,
            self.transport.clone(),
            self.timer_settings,
            self.timer_factory.clone(),
            self.reliable(),
            self.internal_tx.clone(),
        );
        self.store.transactions.write().await.insert(key.clone(), txn);
        Ok(key)
    }

    /// Starts a previously-created client transaction's initial send.
    pub async fn send_request(&self, key: &TxKey) -> Result<()> {
        let txn = self
            .store
            .transactions
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| TransactionError::TransactionNotFound(key.clone()))?;
        txn.start().await;
        Ok(())
    }

    /// Convenience composing `create_client_transaction` +
    /// `send_request` for callers that don't need the two steps
    /// observable separately.
    pub async fn request(&self, request: Request, destination: SocketAddr) -> Result<TxKey> {
        let key = self.create_client_transaction(request, destination).await?;
        self.send_request(&key).await?;
        Ok(key)
    }

    /// Builds, stores, and starts a server transaction for an inbound
    /// request that matched no existing key.
    pub async fn create_server_transaction(
        &self,
        request: Request,
        source: SocketAddr,
    ) -> Result<TxKey> {
        let key = make_server_tx_key(&request)?;
        let kind = TransactionKind::for_request(&request.method, false);
        let txn = Transaction::new_server(
            kind,
            key.clone(),
            request,
            source,
            self.transport.clone(),
            self.timer_settings,
            self.timer_factory.clone(),
            self.reliable(),
            self.internal_tx.clone(),
        );
        self.store.transactions.write().await.insert(key.clone(), txn);
        Ok(key)
    }

    /// Delivers a response to the server transaction stored under `key`
    /// (spec §6.2's `respond`).
    pub async fn respond(&self, key: &TxKey, response: Response) -> Result<()> {
        let txn = self.transaction(key).await?;
        txn.send(TxInput::Response(response)).await;
        Ok(())
    }

    async fn transaction(&self, key: &TxKey) -> Result<Transaction> {
        self.store
            .transactions
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| TransactionError::TransactionNotFound(key.clone()))
    }

    /// Routes one inbound message per spec §4.7: existing transaction if
    /// the key matches, otherwise a new server transaction for a request
    /// or a stray-response event for a response.
    pub async fn handle_inbound(&self, message: Message, source: SocketAddr) -> Result<()> {
        match message {
            Message::Request(request) => self.handle_inbound_request(request, source).await,
            Message::Response(response) => self.handle_inbound_response(response, source).await,
        }
    }

    async fn handle_inbound_request(&self, request: Request, source: SocketAddr) -> Result<()> {
        let key = match make_server_tx_key(&request) {
            Ok(k) => k,
            Err(_) => {
                let _ = self
                    .internal_tx
                    .send(TransactionEvent::StrayRequest { request, source })
                    .await;
                return Ok(());
            }
        };
        if let Some(txn) = self.store.transactions.read().await.get(&key).cloned() {
            let input = match request.method {
                sipstack_core::primitive::Method::Ack => TxInput::Ack(request),
                sipstack_core::primitive::Method::Cancel => TxInput::Cancel(request),
                _ => TxInput::RequestRetransmit(request),
            };
            txn.send(input).await;
            return Ok(());
        }
        // ACK to a 2xx never creates a new server transaction (property
        // 9) — its INVITE transaction already terminated on the 2xx.
        if matches!(request.method, sipstack_core::primitive::Method::Ack) {
            let _ = self
                .internal_tx
                .send(TransactionEvent::StrayAck { request, source })
                .await;
            return Ok(());
        }
        if matches!(request.method, sipstack_core::primitive::Method::Cancel) {
            let _ = self
                .internal_tx
                .send(TransactionEvent::StrayCancel { request, source })
                .await;
            return Ok(());
        }
        let new_key = self.create_server_transaction(request.clone(), source).await?;
        let event = if matches!(request.method, sipstack_core::primitive::Method::Invite) {
            TransactionEvent::InviteRequest { key: new_key, request, source }
        } else {
            TransactionEvent::NonInviteRequest { key: new_key, request, source }
        };
        let _ = self.internal_tx.send(event).await;
        Ok(())
    }

    async fn handle_inbound_response(&self, response: Response, source: SocketAddr) -> Result<()> {
        let key = match make_client_tx_key(&Message::Response(response.clone())) {
            Ok(k) => k,
            Err(_) => {
                let _ = self
                    .internal_tx
                    .send(TransactionEvent::StrayResponse { response, source })
                    .await;
                return Ok(());
            }
        };
        match self.store.transactions.read().await.get(&key).cloned() {
            Some(txn) => {
                txn.send(TxInput::Response(response)).await;
                Ok(())
            }
            None => {
                let _ = self
                    .internal_tx
                    .send(TransactionEvent::StrayResponse { response, source })
                    .await;
                Ok(())
            }
        }
    }

    /// Builds and sends a `CANCEL` for a live client INVITE transaction
    /// (RFC 3261 §9). The CANCEL is its own client non-INVITE
    /// transaction, keyed with the same branch as the INVITE it targets,
    /// sent to the same destination.
    pub async fn cancel_invite_transaction(&self, key: &TxKey) -> Result<TxKey> {
        let txn = self.transaction(key).await?;
        if txn.kind() != TransactionKind::ClientInvite {
            return Err(TransactionError::UnexpectedMessage {
                key: key.clone(),
                reason: "cancel_invite_transaction called on a non-INVITE transaction".into(),
            });
        }
        let cancel = build_cancel(txn.original_request());
        self.request(cancel, txn.remote_addr()).await
    }

    pub async fn transaction_state(&self, key: &TxKey) -> Option<TransactionState> {
        self.store.transactions.read().await.get(key).map(|t| t.state())
    }

    pub async fn transaction_exists(&self, key: &TxKey) -> bool {
        self.store.transactions.read().await.contains_key(key)
    }

    pub async fn active_transactions(&self) -> Vec<TxKey> {
        self.store.transactions.read().await.keys().cloned().collect()
    }

    pub async fn transaction_count(&self) -> usize {
        self.store.transactions.read().await.len()
    }

    /// Polls (bounded by `timeout`) for `key`'s transaction to reach
    /// `target`. A diagnostic/test helper, not part of the FSM's own
    /// notification path.
    pub async fn wait_for_transaction_state(
        &self,
        key: &TxKey,
        target: TransactionState,
        timeout: Duration,
    ) -> Result<()> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            if self.transaction_state(key).await == Some(target) {
                return Ok(());
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(TransactionError::Timeout { key: key.clone() });
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    /// A per-key event subscription layered on top of the global event
    /// stream: every event the manager would otherwise only publish
    /// globally is also forwarded here while `key`'s transaction is
    /// live.
    pub async fn subscribe_to_transaction(&self, key: &TxKey) -> mpsc::Receiver<TransactionEvent> {
        let (tx, rx) = mpsc::channel(32);
        self.store.subscribers.write().await.entry(key.clone()).or_default().push(tx);
        rx
    }

    /// Removes every transaction that has already reached `Terminated`.
    /// The dispatch loop does this continuously as `TransactionTerminated`
    /// events arrive; this is for callers that want a synchronous sweep
    /// (e.g. before reporting `transaction_count`).
    pub async fn cleanup_terminated_transactions(&self) {
        let mut transactions = self.store.transactions.write().await;
        transactions.retain(|_, txn| !txn.state().is_terminal());
    }

    /// Terminates every live transaction, drains the store, and closes
    /// the transport (spec §5's `cancel`).
    pub async fn shutdown(&self) {
        let keys: Vec<TxKey> = self.store.transactions.read().await.keys().cloned().collect();
        for key in keys {
            if let Some(txn) = self.store.transactions.read().await.get(&key).cloned() {
                txn.terminate().await;
            }
        }
        self.store.transactions.write().await.clear();
        self.store.subscribers.write().await.clear();
        let _ = self.transport.close().await;
    }
}

/// A `CANCEL` for `invite` (RFC 3261 §9.1): same request-URI, same
/// top `Via` (so it keys to the same server transaction), same
/// `From`/`Call-ID`/`CSeq` sequence number, `Max-Forwards` reset, no
/// body, `CSeq` method replaced with `CANCEL`.
fn build_cancel(invite: &Request) -> Request {
    let mut headers = Vec::new();
    for h in &invite.headers {
        match h {
            Header::Via(hops) => headers.push(Header::Via(vec![hops[0].clone()])),
            Header::From(_) | Header::To(_) | Header::CallId(_) | Header::Route(_) => headers.push(h.clone()),
            Header::MaxForwards(_) => headers.push(Header::MaxForwards(70)),
            _ => {}
        }
    }
    let seq_no = invite
        .header(|h| match h {
            Header::CSeq { seq_no, .. } => Some(*seq_no),
            _ => None,
        })
        .unwrap_or(1);
    headers.push(Header::CSeq { seq_no, method: Method::Cancel });
    headers.push(Header::ContentLength(0));
    Request {
        method: Method::Cancel,
        recipient: invite.recipient.clone(),
        sip_version: invite.sip_version.clone(),
        headers,
        body: String::new(),
    }
}

/// Consumes the internal event channel every transaction publishes to,
/// fans each event out to per-key subscribers and the external channel,
/// and prunes the store when a transaction reports
/// `TransactionTerminated` — the policy spec §4.7/§7 describes as "the
/// layer's serve loop removes them from the store", recovering the
/// marker event locally rather than republishing it.
async fn run_dispatch_loop(
    store: Arc<Store>,
    mut internal_rx: mpsc::Receiver<TransactionEvent>,
    external_tx: mpsc::Sender<TransactionEvent>,
) {
    while let Some(event) = internal_rx.recv().await {
        if let Some(key) = event.key() {
            if let Some(subs) = store.subscribers.read().await.get(key) {
                for sub in subs {
                    let _ = sub.send(event.clone()).await;
                }
            }
        }
        if let TransactionEvent::TransactionTerminated { key } = &event {
            store.transactions.write().await.remove(key);
            store.subscribers.write().await.remove(key);
            continue;
        }
        let _ = external_tx.send(event).await;
    }
}
