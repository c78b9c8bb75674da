//! Server INVITE FSM (spec §4.5): `Proceeding → Completed → Confirmed →
//! Terminated`. The 200ms `1xx` timer auto-sends `100 Trying` exactly
//! once if the transaction user hasn't produced a provisional response
//! by then; a 2xx leaves the transaction Terminated immediately,
//! deferring ACK matching to the dialog layer above (spec §4.7, property
//! 9: a 2xx's ACK is never routed back to this transaction).

use sipstack_core::header::Header;
use sipstack_core::message::{Message, Request, Response};

use super::{Ctx, Effect, Step, TransactionState, TxInput};
use crate::event::TransactionEvent;
use crate::key::TxKey;
use crate::timer::TimerSettings;

fn trying_response(request: &Request) -> Response {
    let mut headers = Vec::new();
    for h in &request.headers {
        match h {
            Header::Via(_) | Header::From(_) | Header::To(_) | Header::CallId(_) | Header::CSeq { .. } => {
                headers.push(h.clone())
            }
            _ => {}
        }
    }
    headers.push(Header::ContentLength(0));
    Response {
        sip_version: request.sip_version.clone(),
        status_code: 100,
        reason: "Trying".to_string(),
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
        (TransactionState::Proceeding, TxInput::Timer("start")) => {
            Step::to(TransactionState::Proceeding)
                .with(Effect::ScheduleTimer { name: "1xx", after: std::time::Duration::from_millis(200) })
        }
        (TransactionState::Proceeding, TxInput::Timer("1xx")) => {
            if ctx.last_response.is_some() {
                return Step::to(TransactionState::Proceeding);
            }
            let trying = trying_response(&ctx.request);
            ctx.last_response = Some(trying.clone());
            Step::to(TransactionState::Proceeding).with(Effect::Send(Message::Response(trying)))
        }
        (TransactionState::Proceeding, TxInput::RequestRetransmit(_)) => {
            // The TU may not have answered yet; a retransmit this early
            // still gets a `100 Trying`, the same as if the 1xx timer
            // had fired (spec §8, scenario S6).
            let resp = ctx.last_response.clone().unwrap_or_else(|| trying_response(&ctx.request));
            ctx.last_response = Some(resp.clone());
            Step::to(TransactionState::Proceeding).with(Effect::Send(Message::Response(resp)))
        }
        (TransactionState::Proceeding, TxInput::Response(resp)) if resp.is_provisional() => {
            ctx.last_response = Some(resp.clone());
            Step::to(TransactionState::Proceeding).with(Effect::Send(Message::Response(resp)))
        }
        (TransactionState::Proceeding, TxInput::Response(resp)) if resp.is_success() => {
            Step::to(TransactionState::Terminated)
                .with(Effect::CancelAllTimers)
                .with(Effect::Send(Message::Response(resp.clone())))
                .with(Effect::Emit(TransactionEvent::SuccessResponse { key: key.clone(), response: resp }))
        }
        (TransactionState::Proceeding, TxInput::Response(resp)) => {
            ctx.last_response = Some(resp.clone());
            ctx.g_interval = settings.timer_g_initial();
            let mut step = Step::to(TransactionState::Completed)
                .with(Effect::CancelAllTimers)
                .with(Effect::Send(Message::Response(resp.clone())))
                .with(Effect::ScheduleTimer { name: "H", after: settings.timer_h() })
                .with(Effect::Emit(TransactionEvent::FailureResponse { key: key.clone(), response: resp }));
            if !reliable {
                step = step.with(Effect::ScheduleTimer { name: "G", after: ctx.g_interval });
            }
            step
        }
        (TransactionState::Proceeding, TxInput::Cancel(req)) => Step::to(TransactionState::Proceeding)
            .with(Effect::Emit(TransactionEvent::CancelReceived { key: key.clone(), request: req })),

        (TransactionState::Completed, TxInput::RequestRetransmit(_)) => {
            let step = Step::to(TransactionState::Completed);
            match &ctx.last_response {
                Some(resp) => step.with(Effect::Send(Message::Response(resp.clone()))),
                None => step,
            }
        }
        (TransactionState::Completed, TxInput::Timer("G")) => {
            ctx.g_interval = settings.timer_g_next(ctx.g_interval);
            let step = Step::to(TransactionState::Completed)
                .with(Effect::ScheduleTimer { name: "G", after: ctx.g_interval });
            match &ctx.last_response {
                Some(resp) => step.with(Effect::Send(Message::Response(resp.clone()))),
                None => step,
            }
        }
        (TransactionState::Completed, TxInput::Timer("H")) => {
            Step::to(TransactionState::Terminated)
                .with(Effect::CancelAllTimers)
                .with(Effect::Emit(TransactionEvent::TransactionTimeout { key: key.clone() }))
        }
        (TransactionState::Completed, TxInput::Ack(req)) => Step::to(TransactionState::Confirmed)
            .with(Effect::CancelAllTimers)
            .with(Effect::ScheduleTimer { name: "I", after: settings.timer_i(reliable) })
            .with(Effect::Emit(TransactionEvent::AckReceived { key: key.clone(), request: req })),

        (TransactionState::Confirmed, TxInput::Ack(_)) => Step::to(TransactionState::Confirmed),
        (TransactionState::Confirmed, TxInput::Timer("I")) => {
            Step::to(TransactionState::Terminated).with(Effect::CancelAllTimers)
        }

        (_, TxInput::TransportError(error)) => Step::to(TransactionState::Terminated)
            .with(Effect::CancelAllTimers)
            .with(Effect::Emit(TransactionEvent::TransportError { key: key.clone(), error })),
        (_, TxInput::Terminate) => Step::to(TransactionState::Terminated).with(Effect::CancelAllTimers),

        (other, _) => Step::to(other),
    }
}
