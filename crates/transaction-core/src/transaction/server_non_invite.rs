//! Server non-INVITE FSM (spec §4.5): `Trying → Proceeding → Completed →
//! Terminated`. No 1xx auto-response here — the TU either answers or the
//! request simply sits until it does; only `INVITE` gets the
//! auto-`Trying` treatment.

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
        (TransactionState::Trying, TxInput::RequestRetransmit(_)) => Step::to(TransactionState::Trying),

        (TransactionState::Trying, TxInput::Response(resp)) if resp.is_provisional() => {
            ctx.last_response = Some(resp.clone());
            Step::to(TransactionState::Proceeding)
                .with(Effect::Emit(TransactionEvent::ProvisionalResponse { key: key.clone(), response: resp.clone() }))
                .with(Effect::Send(Message::Response(resp)))
        }
        (TransactionState::Trying, TxInput::Response(resp)) | (TransactionState::Proceeding, TxInput::Response(resp)) => {
            ctx.last_response = Some(resp.clone());
            let event = final_event(key, resp.clone());
            Step::to(TransactionState::Completed)
                .with(Effect::Send(Message::Response(resp)))
                .with(Effect::ScheduleTimer { name: "J", after: settings.timer_j(reliable) })
                .with(Effect::Emit(event))
        }

        (TransactionState::Proceeding, TxInput::RequestRetransmit(_)) => {
            let step = Step::to(TransactionState::Proceeding);
            match &ctx.last_response {
                Some(resp) => step.with(Effect::Send(Message::Response(resp.clone()))),
                None => step,
            }
        }

        (TransactionState::Completed, TxInput::RequestRetransmit(_)) => {
            let step = Step::to(TransactionState::Completed);
            match &ctx.last_response {
                Some(resp) => step.with(Effect::Send(Message::Response(resp.clone()))),
                None => step,
            }
        }
        (TransactionState::Completed, TxInput::Timer("J")) => {
            Step::to(TransactionState::Terminated).with(Effect::CancelAllTimers)
        }

        (_, TxInput::TransportError(error)) => Step::to(TransactionState::Terminated)
            .with(Effect::CancelAllTimers)
            .with(Effect::Emit(TransactionEvent::TransportError { key: key.clone(), error })),
        (_, TxInput::Terminate) => Step::to(TransactionState::Terminated).with(Effect::CancelAllTimers),

        (other, _) => Step::to(other),
    }
}
