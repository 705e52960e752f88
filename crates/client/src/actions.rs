// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Typed constructors for the service's chat actions.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use cs_core::protocol::{Action, Parameter};
use cs_core::{ClientSideIdGenerator, ClockSource, HistoryMessage, MessageKind};

use crate::action_loop::{ActionError, ActionRequest, ActionRequestLoop, ActionResult};
use crate::history::HistoryStorage;

/// Lowest and highest rating a visitor can give.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

/// Issues chat actions on the action lane.
#[derive(Clone)]
pub struct ChatActions {
    requests: Arc<ActionRequestLoop>,
    history: Arc<dyn HistoryStorage>,
    ids: Arc<ClientSideIdGenerator>,
    clock: Arc<dyn ClockSource>,
}

impl ChatActions {
    pub fn new(
        requests: Arc<ActionRequestLoop>,
        history: Arc<dyn HistoryStorage>,
        ids: Arc<ClientSideIdGenerator>,
        clock: Arc<dyn ClockSource>,
    ) -> Self {
        ChatActions {
            requests,
            history,
            ids,
            clock,
        }
    }

    /// Sends a text message and returns its client-side id.
    ///
    /// A local copy keyed by the client-side id is put on the timeline
    /// before the request goes out; the server's echo replaces it. The copy
    /// is withdrawn if the request cannot be queued or ends in an error.
    pub fn send_message(
        &self,
        text: &str,
        data: Option<Value>,
        completion: impl FnOnce(ActionResult<Value>) + Send + 'static,
    ) -> ActionResult<String> {
        let now = self.clock.now_micros();
        let client_side_id = self.ids.next_id(now);

        let mut request = action(Action::SendMessage)
            .param(Parameter::Message, text)
            .param(Parameter::ClientSideId, client_side_id.as_str());
        if let Some(data) = data {
            request = request.param(Parameter::Data, data.to_string());
        }

        let mut echo = HistoryMessage::new(client_side_id.as_str(), now, text)
            .with_client_side_id(client_side_id.as_str())
            .with_kind(MessageKind::Visitor);
        echo.internal_id = None;
        self.history.upsert(echo);

        let history = Arc::clone(&self.history);
        let echo_id = client_side_id.clone();
        let completion = move |result: ActionResult<Value>| {
            if let Err(e) = &result {
                debug!(client_side_id = %echo_id, "message refused: {}", e);
                withdraw_echo(history.as_ref(), &echo_id);
            }
            completion(result);
        };
        if let Err(e) = self.requests.enqueue(request.on_complete(completion)) {
            self.history.remove(&client_side_id);
            return Err(e);
        }
        debug!(client_side_id = %client_side_id, "message queued");
        Ok(client_side_id)
    }

    /// Starts a chat, optionally addressed to a department and opened with
    /// a first question. Returns the chat's client-side id.
    pub fn start_chat(
        &self,
        department_key: Option<&str>,
        first_question: Option<&str>,
        completion: impl FnOnce(ActionResult<Value>) + Send + 'static,
    ) -> ActionResult<String> {
        let client_side_id = self.ids.next_id(self.clock.now_micros());
        let mut request = action(Action::StartChat)
            .param(Parameter::ForceOnline, flag(true))
            .param(Parameter::ClientSideId, client_side_id.as_str());
        if let Some(key) = department_key {
            request = request.param(Parameter::DepartmentKey, key);
        }
        if let Some(question) = first_question {
            request = request.param(Parameter::FirstQuestion, question);
        }
        self.requests.enqueue(request.on_complete(completion))?;
        Ok(client_side_id)
    }

    pub fn close_chat(
        &self,
        completion: impl FnOnce(ActionResult<Value>) + Send + 'static,
    ) -> ActionResult<()> {
        self.requests
            .enqueue(action(Action::CloseChat).on_complete(completion))
    }

    /// Rates an operator from 1 (worst) to 5 (best).
    pub fn rate_operator(
        &self,
        operator_id: &str,
        rating: u8,
        completion: impl FnOnce(ActionResult<Value>) + Send + 'static,
    ) -> ActionResult<()> {
        let rate = wire_rating(rating)?;
        self.requests.enqueue(
            action(Action::RateOperator)
                .param(Parameter::OperatorId, operator_id)
                .param(Parameter::Rating, rate)
                .on_complete(completion),
        )
    }

    /// Reports whether the visitor is typing. `Some(draft)` means typing
    /// with the current draft; `None` means the visitor stopped and the
    /// draft is discarded.
    pub fn set_visitor_typing(
        &self,
        draft: Option<&str>,
        completion: impl FnOnce(ActionResult<Value>) + Send + 'static,
    ) -> ActionResult<()> {
        let mut request = action(Action::SetVisitorTyping)
            .param(Parameter::VisitorTyping, flag(draft.is_some()))
            .param(Parameter::DeleteDraft, flag(draft.is_none()));
        if let Some(draft) = draft {
            request = request.param(Parameter::Draft, draft);
        }
        self.requests.enqueue(request.on_complete(completion))
    }

    pub fn set_push_token(
        &self,
        token: &str,
        completion: impl FnOnce(ActionResult<Value>) + Send + 'static,
    ) -> ActionResult<()> {
        self.requests.enqueue(
            action(Action::SetPushToken)
                .param(Parameter::PushToken, token)
                .on_complete(completion),
        )
    }
}

/// Removes the local copy of a message unless the server already echoed it.
fn withdraw_echo(history: &dyn HistoryStorage, client_side_id: &str) {
    let unconfirmed = history.full_history().iter().any(|m| {
        m.internal_id.is_none() && m.client_side_id.as_deref() == Some(client_side_id)
    });
    if unconfirmed {
        history.remove(client_side_id);
    }
}

fn action(action: Action) -> ActionRequest {
    ActionRequest::action().param(Parameter::Action, action.as_wire())
}

/// Booleans travel as "1" / "0".
fn flag(value: bool) -> &'static str {
    if value {
        "1"
    } else {
        "0"
    }
}

/// Maps 1..=5 onto the service's -2..=2 scale.
fn wire_rating(rating: u8) -> ActionResult<i64> {
    if !RATING_RANGE.contains(&rating) {
        return Err(ActionError::InvalidArgument(format!(
            "rating must be within 1..=5, got {rating}"
        )));
    }
    Ok(i64::from(rating) - 3)
}

#[cfg(test)]
#[path = "actions_tests.rs"]
mod tests;
