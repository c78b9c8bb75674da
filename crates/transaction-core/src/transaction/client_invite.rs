//! Client INVITE FSM (spec §4.5): `Calling → Proceeding → Completed →
//! Terminated`. RFC 6026's `Accepted` state for 2xx retransmit handling
//! is explicitly out of scope (the spec allows but doesn't require it);
//! a 2xx moves straight to `Terminated` and the dialog layer above takes
//! over 2xx retransmits.

use sipstack_core::header::Header;
use sipstack_core::message::{Message, Request, Response};
use sipstack_core::primitive::Method;

use super::{Ctx, Effect, Step, TransactionState, TxInput};
use crate::event::TransactionEvent;
use crate::key::TxKey;
use crate::timer::TimerSettings;

fn build_ack(original: &Request, response: &Response) -> Request {
    let mut headers = Vec::new();
    for h in &original.headers {
        match h {
            Header::Via(hops) => headers.push(Header::Via(vec![hops[0].clone()])),
            Header::From(_) | Header::CallId(_) | Header::MaxForwards(_) | Header::Route(_) => {
                headers.push(h.clone())
            }
            _ => {}
        }
    }
    let to = response
        .header(|h| match h {
            Header::To(a) => Some(a.clone()),
            _ => None,
        })
        .or_else(|| {
            original.header(|h| match h {
                Header::To(a) => Some(a.clone()),
                _ => None,
            })
        });
    if let Some(to) = to {
        headers.push(Header::To(to));
    }
    let seq_no = original
        .header(|h| match h {
            Header::CSeq { seq_no, .. } => Some(*seq_no),
            _ => None,
        })
        .unwrap_or(1);
    headers.push(Header::CSeq { seq_no, method: Method::Ack });
    headers.push(Header::ContentLength(0));
    Request {
        method: Method::Ack,
        recipient: original.recipient.clone(),
        sip_version: original.sip_version.clone(),
        headers,
        body: String::new(),
    }
}

pub(super) fn step(
    key: &TxKey,
    state: TransactionState,
    input: TxInput,
    ctx: &mut Ctx,
    settings: &TimerSettings,
    reliable: bool,
) -> Step {
    match (state, input) {
        (TransactionState::Calling, TxInput::Timer("start")) => {
            ctx.a_interval = settings.timer_a_initial();
            let mut step = Step::to(TransactionState::Calling)
                .with(Effect::Send(Message::Request(ctx.request.clone())))
                .with(Effect::ScheduleTimer { name: "B", after: settings.timer_b() });
            if !reliable {
                step = step.with(Effect::ScheduleTimer { name: "A", after: ctx.a_interval });
            }
            step
        }
        (TransactionState::Calling, TxInput::Timer("A")) => {
            ctx.a_interval = settings.timer_a_next(ctx.a_interval);
            Step::to(TransactionState::Calling)
                .with(Effect::Send(Message::Request(ctx.request.clone())))
                .with(Effect::ScheduleTimer { name: "A", after: ctx.a_interval })
        }
        (TransactionState::Calling, TxInput::Timer("B")) => Step::to(TransactionState::Terminated)
            .with(Effect::CancelAllTimers)
            .with(Effect::Emit(TransactionEvent::TransactionTimeout { key: key.clone() })),

        (TransactionState::Calling, TxInput::Response(resp)) if resp.is_provisional() => {
            Step::to(TransactionState::Proceeding)
                .with(Effect::CancelAllTimers)
                .with(Effect::Emit(TransactionEvent::ProvisionalResponse { key: key.clone(), response: resp }))
        }
        (TransactionState::Calling, TxInput::Response(resp)) if resp.is_success() => {
            Step::to(TransactionState::Terminated)
                .with(Effect::CancelAllTimers)
                .with(Effect::Emit(TransactionEvent::SuccessResponse { key: key.clone(), response: resp }))
        }
        (TransactionState::Calling, TxInput::Response(resp)) => {
            let ack = build_ack(&ctx.request, &resp);
            ctx.last_ack = Some(ack.clone());
            Step::to(TransactionState::Completed)
                .with(Effect::CancelAllTimers)
                .with(Effect::Send(Message::Request(ack)))
                .with(Effect::ScheduleTimer { name: "D", after: settings.timer_d(reliable) })
                .with(Effect::Emit(TransactionEvent::FailureResponse { key: key.clone(), response: resp }))
        }

        (TransactionState::Proceeding, TxInput::Response(resp)) if resp.is_provisional() => {
            Step::to(TransactionState::Proceeding)
                .with(Effect::Emit(TransactionEvent::ProvisionalResponse { key: key.clone(), response: resp }))
        }
        (TransactionState::Proceeding, TxInput::Response(resp)) if resp.is_success() => {
            Step::to(TransactionState::Terminated)
                .with(Effect::Emit(TransactionEvent::SuccessResponse { key: key.clone(), response: resp }))
        }
        (TransactionState::Proceeding, TxInput::Response(resp)) => {
            let ack = build_ack(&ctx.request, &resp);
            ctx.last_ack = Some(ack.clone());
            Step::to(TransactionState::Completed)
                .with(Effect::Send(Message::Request(ack)))
                .with(Effect::ScheduleTimer { name: "D", after: settings.timer_d(reliable) })
                .with(Effect::Emit(TransactionEvent::FailureResponse { key: key.clone(), response: resp }))
        }

        (TransactionState::Completed, TxInput::Response(_)) => {
            let step = Step::to(TransactionState::Completed);
            match &ctx.last_ack {
                Some(ack) => step.with(Effect::Send(Message::Request(ack.clone()))),
                None => step,
            }
        }
        (TransactionState::Completed, TxInput::Timer("D")) => {
            Step::to(TransactionState::Terminated).with(Effect::CancelAllTimers)
        }

        (_, TxInput::TransportError(error)) => Step::to(TransactionState::Terminated)
            .with(Effect::CancelAllTimers)
            .with(Effect::Emit(TransactionEvent::TransportError { key: key.clone(), error })),
        (_, TxInput::Terminate) => Step::to(TransactionState::Terminated).with(Effect::CancelAllTimers),

        (other, _) => Step::to(other),
    }
}
