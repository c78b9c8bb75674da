//! RFC 3261 §17 transaction layer: the four FSMs (component H),
//! transaction keying (component G), and the transaction store/manager
//! (component I) that demultiplexes inbound messages onto them.

pub mod builders;
pub mod error;
pub mod event;
pub mod key;
pub mod manager;
pub mod timer;
pub mod transaction;

pub mod prelude {
    pub use crate::error::{Result, TransactionError};
    pub use crate::event::TransactionEvent;
    pub use crate::key::{make_client_tx_key, make_server_tx_key, TxKey};
    pub use crate::manager::TransactionManager;
    pub use crate::timer::{TimerFactory, TimerSettings, TokioTimerFactory};
    pub use crate::transaction::{Transaction, TransactionKind, TransactionState, TxInput};
}
