//! Client non-INVITE FSM (spec §4.5): `Trying → Proceeding → Completed →
//! Terminated`. Timer E keeps retransmitting (capped at T2) across both
//! `Trying` and `Proceeding`; Timer F is the single timeout that spans
//! both states too.

use sipstack_core::message::Message;

use super::{Ctx, Effect, Step, TransactionState, TxInput};
use crate::event::TransactionEvent;
use crate::key::TxKey;
use crate::timer::TimerSettings;

fn final_event(key: &TxKey, response: sipstack_core::message::Response) -> TransactionEvent {
    if response.is_success() {
        TransactionEvent::SuccessResponse { key: key.clone(), response }
    } else {
        TransactionEvent::FailureResponse { key: key.clone(), response }
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
        (TransactionState::Trying, TxInput::Timer("start")) => {
            ctx.e_interval = settings.timer_e_initial();
            let mut step = Step::to(TransactionState::Trying)
                .with(Effect::Send(Message::Request(ctx.request.clone())))
                .with(Effect::ScheduleTimer { name: "F", after: settings.timer_f() });
            if !reliable {
                step = step.with(Effect::ScheduleTimer { name: "E", after: ctx.e_interval });
            }
            step
        }
        (TransactionState::Trying, TxInput::Timer("E")) | (TransactionState::Proceeding, TxInput::Timer("E")) => {
            ctx.e_interval = settings.timer_e_next(ctx.e_interval);
            Step::to(state)
                .with(Effect::Send(Message::Request(ctx.request.clone())))
                .with(Effect::ScheduleTimer { name: "E", after: ctx.e_interval })
        }
        (TransactionState::Trying, TxInput::Timer("F")) | (TransactionState::Proceeding, TxInput::Timer("F")) => {
            Step::to(TransactionState::Terminated)
                .with(Effect::CancelAllTimers)
                .with(Effect::Emit(TransactionEvent::TransactionTimeout { key: key.clone() }))
        }
        (TransactionState::Trying, TxInput::Response(resp)) if resp.is_provisional() => {
            Step::to(TransactionState::Proceeding)
                .with(Effect::Emit(TransactionEvent::ProvisionalResponse { key: key.clone(), response: resp }))
        }
        (TransactionState::Proceeding, TxInput::Response(resp)) if resp.is_provisional() => {
            Step::to(TransactionState::Proceeding)
                .with(Effect::Emit(TransactionEvent::ProvisionalResponse { key: key.clone(), response: resp }))
        }
        (TransactionState::Trying, TxInput::Response(resp)) | (TransactionState::Proceeding, TxInput::Response(resp)) => {
            let event = final_event(key, resp);
            Step::to(TransactionState::Completed)
                .with(Effect::CancelAllTimers)
                .with(Effect::ScheduleTimer { name: "K", after: settings.timer_k(reliable) })
                .with(Effect::Emit(event))
        }
        (TransactionState::Completed, TxInput::Response(_)) => Step::to(TransactionState::Completed),
        (TransactionState::Completed, TxInput::Timer("K")) => {
            Step::to(TransactionState::Terminated).with(Effect::CancelAllTimers)
        }

        (_, TxInput::TransportError(error)) => Step::to(TransactionState::Terminated)
            .with(Effect::CancelAllTimers)
            .with(Effect::Emit(TransactionEvent::TransportError { key: key.clone(), error })),
        (_, TxInput::Terminate) => Step::to(TransactionState::Terminated).with(Effect::CancelAllTimers),

        (other, _) => Step::to(other),
    }
}
