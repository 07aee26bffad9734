//! Per-user conversation state machine
//!
//! ```text
//! Idle --/start--> AwaitingLink --valid link--> Idle (generate)
//!                  AwaitingLink --bad link----> AwaitingLink
//! any  --/cancel-> Idle
//! ```

use linkpdf_core::validate_link;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatState {
    #[default]
    Idle,
    AwaitingLink,
}

/// What the user sent, as far as the conversation cares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Input<'a> {
    Start,
    Cancel,
    Text(&'a str),
}

/// Reply the handler must perform after a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    PromptForLink,
    Cancelled,
    Generate(String),
    RejectLink,
    IdleHint,
}

pub fn transition(state: ChatState, input: Input<'_>) -> (ChatState, Action) {
    match (state, input) {
        (_, Input::Start) => (ChatState::AwaitingLink, Action::PromptForLink),
        (_, Input::Cancel) => (ChatState::Idle, Action::Cancelled),
        (ChatState::AwaitingLink, Input::Text(text)) => {
            let url = text.trim();
            match validate_link(url) {
                Ok(()) => (ChatState::Idle, Action::Generate(url.to_string())),
                Err(_) => (ChatState::AwaitingLink, Action::RejectLink),
            }
        }
        (ChatState::Idle, Input::Text(_)) => (ChatState::Idle, Action::IdleHint),
    }
}
