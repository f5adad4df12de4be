//! IPC request handler.

use callpath_core::{AudioEdge, Command, Error as CoreError, StateSnapshot};
use callpath_ipc::{
    CallEventData, CallStateChangedData, ErrorData, ErrorInfo, Event, EventType, Method, ModemEventData,
};
use serde_json::{Value, json};

/// What the event loop should do with a request.
#[derive(Debug)]
pub enum Handled {
    /// Answer right away
    Reply(Result<Value, ErrorInfo>),
    /// Apply the command to the tracker, then answer with [`command_result`]
    Apply(Command),
}

/// Handle an IPC request.
pub fn handle_request(method: &Method, state: &StateSnapshot) -> Handled {
    match method {
        Method::ModemAdded { modem } => Handled::Apply(Command::ModemAdded { modem: modem.clone() }),
        Method::ModemRemoved { modem } => Handled::Apply(Command::ModemRemoved { modem: modem.clone() }),
        Method::CallsListed { modem, calls } => {
            Handled::Apply(Command::CallsListed { modem: modem.clone(), calls: calls.clone() })
        }
        Method::CallAdded { modem, call } => {
            Handled::Apply(Command::CallAdded { modem: modem.clone(), call: call.clone() })
        }
        Method::CallDeleted { modem, call } => {
            Handled::Apply(Command::CallDeleted { modem: modem.clone(), call: call.clone() })
        }
        Method::CallStateChanged { modem, call, old, new, reason } => Handled::Apply(Command::CallStateChanged {
            modem: modem.clone(),
            call: call.clone(),
            old: *old,
            new: *new,
            reason: *reason,
        }),

        Method::GetState => Handled::Reply(to_value(state)),
        Method::GetAudioStatus => Handled::Reply(to_value(&state.audio)),

        // Answered by the IPC server itself
        Method::Subscribe { .. } | Method::Unsubscribe { .. } => Handled::Reply(Err(ErrorInfo::new(
            ErrorInfo::BAD_REQUEST,
            "Subscriptions are handled per connection",
        ))),

        Method::Shutdown => Handled::Apply(Command::Shutdown),
    }
}

/// Response for an applied command.
pub fn command_result(result: &callpath_core::Result<Vec<AudioEdge>>) -> Result<Value, ErrorInfo> {
    match result {
        Ok(edges) => Ok(json!({ "edges": edges })),
        Err(e) => Err(error_info(e)),
    }
}

/// Map a tracker error onto a protocol error.
pub fn error_info(error: &CoreError) -> ErrorInfo {
    let code = match error {
        CoreError::ModemNotFound(_) | CoreError::CallNotFound { .. } => ErrorInfo::NOT_FOUND,
        CoreError::DuplicateModem(_) | CoreError::DuplicateCall { .. } => ErrorInfo::CONFLICT,
        CoreError::InvalidCallState(_) => ErrorInfo::BAD_REQUEST,
        CoreError::CounterUnderflow(_) => ErrorInfo::UNAVAILABLE,
    };
    ErrorInfo::new(code, error.to_string())
}

/// Event announcing a rejected notification.
pub fn error_event(error: &CoreError) -> Event {
    let info = error_info(error);
    Event::new(EventType::Error, &ErrorData { code: info.code, message: info.message })
}

/// Events announcing an applied notification.
pub fn notification_events(command: &Command) -> Vec<Event> {
    match command {
        Command::ModemAdded { modem } => {
            vec![Event::new(EventType::ModemAdded, &ModemEventData { modem: modem.clone() })]
        }
        Command::ModemRemoved { modem } => {
            vec![Event::new(EventType::ModemRemoved, &ModemEventData { modem: modem.clone() })]
        }
        Command::CallsListed { modem, calls } => calls
            .iter()
            .map(|call| {
                Event::new(
                    EventType::CallAdded,
                    &CallEventData { modem: modem.clone(), call: call.path.clone(), state: Some(call.state) },
                )
            })
            .collect(),
        Command::CallAdded { modem, call } => vec![Event::new(
            EventType::CallAdded,
            &CallEventData { modem: modem.clone(), call: call.path.clone(), state: Some(call.state) },
        )],
        Command::CallDeleted { modem, call } => vec![Event::new(
            EventType::CallRemoved,
            &CallEventData { modem: modem.clone(), call: call.clone(), state: None },
        )],
        Command::CallStateChanged { modem, call, old, new, reason } => vec![Event::new(
            EventType::CallStateChanged,
            &CallStateChangedData { modem: modem.clone(), call: call.clone(), old: *old, new: *new, reason: *reason },
        )],
        Command::Shutdown => Vec::new(),
    }
}

fn to_value(value: &impl serde::Serialize) -> Result<Value, ErrorInfo> {
    serde_json::to_value(value).map_err(|e| ErrorInfo::new(500, e.to_string()))
}
