//! The four RFC 3261 §17 transaction state machines (component H) and
//! the event loop that drives each instance. Every transaction owns one
//! `tokio` task that reads its command channel in arrival order — spec
//! §5's "`spin(input)` is the only entry point and serializes all state
//! transitions" holds because that task is the sole writer of the FSM's
//! mutable context; [`Transaction::send`] only ever posts to the
//! channel.

mod client_invite;
mod client_non_invite;
mod server_invite;
mod server_non_invite;

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use sipstack_core::message::{Message, Request, Response};
use sipstack_core::primitive::Method;
use sipstack_transport::Transport;

use crate::event::TransactionEvent;
use crate::key::TxKey;
use crate::timer::{TimerFactory, TimerSettings};

/// Which of the four FSMs a [`Transaction`] is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    ClientInvite,
    ClientNonInvite,
    ServerInvite,
    ServerNonInvite,
}

impl TransactionKind {
    pub fn for_request(method: &Method, client: bool) -> Self {
        match (client, matches!(method, Method::Invite)) {
            (true, true) => TransactionKind::ClientInvite,
            (true, false) => TransactionKind::ClientNonInvite,
            (false, true) => TransactionKind::ServerInvite,
            (false, false) => TransactionKind::ServerNonInvite,
        }
    }

    pub fn is_invite(self) -> bool {
        matches!(self, TransactionKind::ClientInvite | TransactionKind::ServerInvite)
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TransactionKind::ClientInvite => "client-invite",
            TransactionKind::ClientNonInvite => "client-non-invite",
            TransactionKind::ServerInvite => "server-invite",
            TransactionKind::ServerNonInvite => "server-non-invite",
        };
        write!(f, "{s}")
    }
}

/// A state shared by name across all four FSMs; not every variant is
/// reachable by every kind (spec §4.5 names the reachable subset per
/// FSM — e.g. `Calling` is client-INVITE only, `Confirmed` server-INVITE
/// only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionState {
    Calling,
    Trying,
    Proceeding,
    Completed,
    Confirmed,
    Terminated,
}

impl TransactionState {
    fn as_u8(self) -> u8 {
        match self {
            TransactionState::Calling => 0,
            TransactionState::Trying => 1,
            TransactionState::Proceeding => 2,
            TransactionState::Completed => 3,
            TransactionState::Confirmed => 4,
            TransactionState::Terminated => 5,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            0 => TransactionState::Calling,
            1 => TransactionState::Trying,
            2 => TransactionState::Proceeding,
            3 => TransactionState::Completed,
            4 => TransactionState::Confirmed,
            _ => TransactionState::Terminated,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TransactionState::Terminated)
    }
}

/// A lock-free, concurrently-readable publication of a transaction's
/// current state, so `TransactionManager::transaction_state` and similar
/// introspection never contends with the FSM's own single-writer loop.
#[derive(Debug)]
pub struct AtomicTransactionState(AtomicU8);

impl AtomicTransactionState {
    pub fn new(initial: TransactionState) -> Self {
        Self(AtomicU8::new(initial.as_u8()))
    }

    pub fn load(&self) -> TransactionState {
        TransactionState::from_u8(self.0.load(Ordering::Acquire))
    }

    fn store(&self, state: TransactionState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }
}

/// Inputs the FSM tables dispatch on (spec §4.5's `request_received,
/// ack_received, user_1xx, user_2xx, user_3xx_plus, timer_A..J,
/// transport_error, delete`). `Response` doubles as "inbound response"
/// on the client side and "the response the TU hands this transaction to
/// send" on the server side; its status code alone decides provisional
/// vs final.
#[derive(Debug, Clone)]
pub enum TxInput {
    RequestRetransmit(Request),
    Ack(Request),
    Cancel(Request),
    Response(Response),
    Timer(&'static str),
    TransportError(String),
    Terminate,
}

/// The effect a table transition produces. Step functions return these
/// as data so the tables stay declarative (spec §9: "do not inline
/// transitions into imperative handler chains"); the event loop is what
/// actually calls the transport and timer provider.
enum Effect {
    Send(Message),
    ScheduleTimer { name: &'static str, after: Duration },
    CancelTimer(&'static str),
    CancelAllTimers,
    Emit(TransactionEvent),
}

/// Mutable per-transaction context. Only the event loop task ever reads
/// or writes this; every field not relevant to a given `TransactionKind`
/// simply stays at its default.
struct Ctx {
    request: Request,
    last_response: Option<Response>,
    last_ack: Option<Request>,
    a_interval: Duration,
    e_interval: Duration,
    g_interval: Duration,
}

/// A transition's outcome: the next state plus the effects, in order,
/// that realize it.
struct Step {
    next: TransactionState,
    effects: Vec<Effect>,
}

impl Step {
    fn to(next: TransactionState) -> Self {
        Self { next, effects: Vec::new() }
    }

    fn with(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }

    fn extend(mut self, effects: impl IntoIterator<Item = Effect>) -> Self {
        self.effects.extend(effects);
        self
    }
}

struct Inner {
    kind: TransactionKind,
    key: TxKey,
    state: AtomicTransactionState,
    remote_addr: SocketAddr,
    transport: Arc<dyn Transport>,
    /// The transaction's own request, kept immutable and outside `Ctx`
    /// so it can be read from outside the event loop (e.g. to build a
    /// `CANCEL` for a live client INVITE transaction).
    original_request: Request,
    events_tx: mpsc::Sender<TransactionEvent>,
    cmd_tx: mpsc::Sender<TxInput>,
}

/// A live transaction: a cheaply-cloneable handle over the task that
/// owns its FSM context. Dropping every clone does not stop the event
/// loop — termination only happens via the FSM reaching `Terminated`, a
/// transport error, or an explicit [`Transaction::terminate`].
#[derive(Clone)]
pub struct Transaction {
    inner: Arc<Inner>,
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("kind", &self.inner.kind)
            .field("key", &self.inner.key)
            .field("state", &self.inner.state.load())
            .finish()
    }
}

impl Transaction {
    pub fn key(&self) -> &TxKey {
        &self.inner.key
    }

    pub fn kind(&self) -> TransactionKind {
        self.inner.kind
    }

    pub fn state(&self) -> TransactionState {
        self.inner.state.load()
    }

    pub fn remote_addr(&self) -> SocketAddr {
        self.inner.remote_addr
    }

    pub fn original_request(&self) -> &Request {
        &self.inner.original_request
    }

    /// Feeds one input to the FSM. Serialization is by construction: the
    /// channel has one consumer, the event loop task, which processes
    /// sends strictly in arrival order (spec §5's ordering guarantee).
    pub async fn send(&self, input: TxInput) {
        let _ = self.inner.cmd_tx.send(input).await;
    }

    /// Equivalent to a transport error from the caller's perspective:
    /// drives the FSM straight to `Terminated`.
    pub async fn terminate(&self) {
        let _ = self.inner.cmd_tx.send(TxInput::Terminate).await;
    }

    /// Performs the client transaction's initial send (the request
    /// itself) and starts its retransmit/timeout timers. Split out from
    /// `new_client` so creating a transaction (keying, storage) is
    /// observable separately from starting it, matching
    /// `create_client_transaction` + `send_request` in
    /// [`crate::manager::TransactionManager`].
    pub async fn start(&self) {
        let _ = self.inner.cmd_tx.send(TxInput::Timer("start")).await;
    }

    /// Builds a client transaction for an outbound request and starts
    /// its event loop. Does not perform the initial send — call
    /// [`Transaction::start`] once the caller is ready to transmit.
    pub fn new_client(
        kind: TransactionKind,
        key: TxKey,
        request: Request,
        remote_addr: SocketAddr,
        transport: Arc<dyn Transport>,
        timer_settings: TimerSettings,
        timer_factory: Arc<dyn TimerFactory>,
        reliable: bool,
        events_tx: mpsc::Sender<TransactionEvent>,
    ) -> Transaction {
        let initial = match kind {
            TransactionKind::ClientInvite => TransactionState::Calling,
            TransactionKind::ClientNonInvite => TransactionState::Trying,
            _ => unreachable!("new_client only builds client transactions"),
        };
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let inner = Arc::new(Inner {
            kind,
            key: key.clone(),
            state: AtomicTransactionState::new(initial),
            remote_addr,
            transport: transport.clone(),
            original_request: request.clone(),
            events_tx: events_tx.clone(),
            cmd_tx: cmd_tx.clone(),
        });
        let ctx = Ctx {
            request: request.clone(),
            last_response: None,
            last_ack: None,
            a_interval: timer_settings.timer_a_initial(),
            e_interval: timer_settings.timer_e_initial(),
            g_interval: timer_settings.timer_g_initial(),
        };
        let txn = Transaction { inner: inner.clone() };
        tokio::spawn(run_event_loop(
            inner,
            ctx,
            cmd_rx,
            timer_settings,
            timer_factory,
            reliable,
        ));
        txn
    }

    /// Creates a server transaction for an inbound request and starts
    /// its event loop. The caller (the transaction layer) is responsible
    /// for invoking `respond` (via `send(TxInput::Response(..))`) once
    /// the TU produces a response.
    pub fn new_server(
        kind: TransactionKind,
        key: TxKey,
        request: Request,
        remote_addr: SocketAddr,
        transport: Arc<dyn Transport>,
        timer_settings: TimerSettings,
        timer_factory: Arc<dyn TimerFactory>,
        reliable: bool,
        events_tx: mpsc::Sender<TransactionEvent>,
    ) -> Transaction {
        let initial = match kind {
            TransactionKind::ServerInvite => TransactionState::Proceeding,
            TransactionKind::ServerNonInvite => TransactionState::Trying,
            _ => unreachable!("new_server only builds server transactions"),
        };
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let inner = Arc::new(Inner {
            kind,
            key: key.clone(),
            state: AtomicTransactionState::new(initial),
            remote_addr,
            transport: transport.clone(),
            original_request: request.clone(),
            events_tx: events_tx.clone(),
            cmd_tx: cmd_tx.clone(),
        });
        let ctx = Ctx {
            request: request.clone(),
            last_response: None,
            last_ack: None,
            a_interval: timer_settings.timer_a_initial(),
            e_interval: timer_settings.timer_e_initial(),
            g_interval: timer_settings.timer_g_initial(),
        };
        let txn = Transaction { inner: inner.clone() };
        tokio::spawn(run_event_loop(
            inner,
            ctx,
            cmd_rx,
            timer_settings,
            timer_factory,
            reliable,
        ));
        if matches!(kind, TransactionKind::ServerInvite) {
            let starter = cmd_tx.clone();
            tokio::spawn(async move {
                let _ = starter.send(TxInput::Timer("start")).await;
            });
        }
        txn
    }
}

fn dispatch(
    kind: TransactionKind,
    key: &TxKey,
    state: TransactionState,
    input: TxInput,
    ctx: &mut Ctx,
    settings: &TimerSettings,
    reliable: bool,
) -> Step {
    match kind {
        TransactionKind::ClientInvite => client_invite::step(key, state, input, ctx, settings, reliable),
        TransactionKind::ClientNonInvite => {
            client_non_invite::step(key, state, input, ctx, settings, reliable)
        }
        TransactionKind::ServerInvite => server_invite::step(key, state, input, ctx, settings, reliable),
        TransactionKind::ServerNonInvite => {
            server_non_invite::step(key, state, input, ctx, settings, reliable)
        }
    }
}

async fn run_event_loop(
    inner: Arc<Inner>,
    mut ctx: Ctx,
    mut cmd_rx: mpsc::Receiver<TxInput>,
    settings: TimerSettings,
    timer_factory: Arc<dyn TimerFactory>,
    reliable: bool,
) {
    while let Some(input) = cmd_rx.recv().await {
        let current = inner.state.load();
        if current.is_terminal() {
            continue;
        }
        let step = dispatch(inner.kind, &inner.key, current, input, &mut ctx, &settings, reliable);
        let next = step.next;
        for effect in step.effects {
            run_effect(&inner, effect, &timer_factory).await;
        }
        if next != current {
            inner.state.store(next);
            let _ = inner
                .events_tx
                .send(TransactionEvent::StateChanged {
                    key: inner.key.clone(),
                    kind: inner.kind,
                    old_state: current,
                    new_state: next,
                })
                .await;
        }
        if next.is_terminal() {
            let _ = inner
                .events_tx
                .send(TransactionEvent::TransactionTerminated { key: inner.key.clone() })
                .await;
            break;
        }
    }
}

async fn run_effect(inner: &Arc<Inner>, effect: Effect, timer_factory: &Arc<dyn TimerFactory>) {
    match effect {
        Effect::Send(message) => {
            if let Err(e) = inner.transport.send_message(message, inner.remote_addr).await {
                let _ = inner
                    .cmd_tx
                    .send(TxInput::TransportError(e.to_string()))
                    .await;
            }
        }
        Effect::ScheduleTimer { name, after } => {
            let cmd_tx = inner.cmd_tx.clone();
            let factory = timer_factory.clone();
            tokio::spawn(async move {
                factory.sleep(after).await;
                let _ = cmd_tx.send(TxInput::Timer(name)).await;
            });
        }
        // Pending timers are allowed to fire into a state that no longer
        // cares about them; `dispatch`'s tables treat a timer input that
        // doesn't apply to the current state as a no-op, so explicit
        // cancellation is an optimization, not a correctness requirement.
        Effect::CancelTimer(_) | Effect::CancelAllTimers => {}
        Effect::Emit(event) => {
            let _ = inner.events_tx.send(event).await;
        }
    }
}
