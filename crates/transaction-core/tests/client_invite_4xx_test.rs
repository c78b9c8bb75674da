//! Scenario S7 — a client INVITE transaction receiving a 4xx response
//! sends an ACK to the Via top with the same branch and method `ACK`,
//! moves to `Completed`, and resends that ACK on a retransmitted 4xx.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use serial_test::serial;

use sipstack_core::header::Header;
use sipstack_core::message::Message;
use sipstack_core::primitive::Method;
use sipstack_transaction::builders::{client_quick, server_quick};
use sipstack_transaction::manager::TransactionManager;
use sipstack_transaction::timer::{TimerSettings, TokioTimerFactory};
use sipstack_transaction::transaction::TransactionState;

use common::MockTransport;

fn destination() -> SocketAddr {
    "10.0.0.9:5060".parse().unwrap()
}

#[tokio::test(start_paused = true)]
#[serial]
async fn four_xx_response_triggers_ack_and_resends_on_retransmit() {
    let transport = MockTransport::new("10.0.0.2:5060".parse().unwrap());
    let (manager, _events) = TransactionManager::with_timers(
        transport.clone(),
        "UDP",
        TimerSettings::default(),
        Arc::new(TokioTimerFactory),
    );

    let invite = client_quick(Method::Invite, "z9hG4bK-s7", "fromtag", "callid-s7", 1, "biloxi.com");
    let key = manager.request(invite.clone(), destination()).await.unwrap();
    tokio::task::yield_now().await;
    assert_eq!(transport.sent_count(), 1, "the initial INVITE should have been sent");

    let not_found = server_quick(&invite, 400, "Bad Request", None);
    manager.handle_inbound(Message::Response(not_found.clone()), destination()).await.unwrap();
    manager
        .wait_for_transaction_state(&key, TransactionState::Completed, Duration::from_secs(1))
        .await
        .unwrap();

    let sent = transport.sent_messages();
    assert_eq!(sent.len(), 2, "the 4xx must trigger exactly one ACK");
    let (ack_message, ack_dest) = &sent[1];
    assert_eq!(*ack_dest, destination());
    match ack_message {
        Message::Request(ack) => {
            assert_eq!(ack.method, Method::Ack);
            let branch = ack.header(|h| match h {
                Header::Via(hops) => hops[0].branch().map(str::to_string),
                _ => None,
            });
            assert_eq!(branch.as_deref(), Some("z9hG4bK-s7"));
        }
        Message::Response(_) => panic!("expected the client transaction to send an ACK request"),
    }

    // A retransmitted 4xx resends the same ACK.
    manager.handle_inbound(Message::Response(not_found), destination()).await.unwrap();
    tokio::task::yield_now().await;
    assert_eq!(transport.sent_count(), 3, "the retransmitted 4xx must trigger an ACK resend");
}
