//! State resolver: the text and menu shown for a participant's state.

use feedback_database::{ParticipantState, Question, User};
use feedback_telegram::Keyboard;

use crate::buttons;
use crate::machine::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub text: String,
    pub keyboard: Keyboard,
}

impl Prompt {
    fn new(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard,
        }
    }
}

/// Greeting sent in reply to `/start`.
pub fn greeting(role: Role) -> Prompt {
    match role {
        Role::Customer => Prompt::new(
            "Greetings 👋\nWith my help, you can leave a \"⭐Review\" \nor ask a \"❓Question\"",
            Keyboard::reply(buttons::customer_main()),
        ),
        Role::Employee => Prompt::new(
            "Greetings 👋\nI implement customer feedback\nTo receive questions click\n\"❓Receive questions\"",
            Keyboard::reply(buttons::employee_main(false)),
        ),
    }
}

/// Confirmation after an employee flips the receive toggle.
pub fn receiver_switched(is_receiver: bool) -> Prompt {
    let text = if is_receiver {
        "Now You receive questions"
    } else {
        "You no longer receive questions"
    };
    Prompt::new(text, Keyboard::reply(buttons::employee_main(is_receiver)))
}

/// Prompt for the participant's current state.
///
/// `open_question` is the customer's open question and only matters in
/// `QuestionDiscussion`. States without a prompt yield `None`.
pub fn resolve(user: &User, open_question: Option<&Question>) -> Option<Prompt> {
    match Role::of(user) {
        Role::Customer => resolve_customer(user.state, open_question),
        Role::Employee => resolve_employee(user),
    }
}

fn resolve_customer(state: ParticipantState, open_question: Option<&Question>) -> Option<Prompt> {
    let prompt = match state {
        ParticipantState::Main => Prompt::new(
            "If you have any questions or review, I'm listening carefully",
            Keyboard::reply(buttons::customer_main()),
        ),
        ParticipantState::Review => Prompt::new(
            "Please rate from 1 to 5",
            Keyboard::reply(buttons::star_ratings()),
        ),
        ParticipantState::ReviewText => Prompt::new(
            "Thank you for your review\nYou can also leave a comment\nOr press \"❌Close\"",
            Keyboard::reply(buttons::close()),
        ),
        ParticipantState::Question => Prompt::new(
            "Please ask your question\nOr click \"❌Close\"",
            Keyboard::reply(buttons::close()),
        ),
        ParticipantState::QuestionDiscussion => match open_question {
            Some(question) => Prompt::new(
                format!(
                    "Your question #{}\nThank you for your question\nAn available employee will answer you shortly",
                    question.id
                ),
                Keyboard::reply(buttons::close()),
            ),
            None => Prompt::new("Please reopen the question", Keyboard::None),
        },
        ParticipantState::New
        | ParticipantState::SwitchReceiver
        | ParticipantState::SearchQuestion => return None,
    };
    Some(prompt)
}

fn resolve_employee(user: &User) -> Option<Prompt> {
    let prompt = match user.state {
        ParticipantState::Main => Prompt::new(
            "Choose an action",
            Keyboard::reply(buttons::employee_main(user.is_receiver)),
        ),
        ParticipantState::Review => Prompt::new(
            "Select Interval",
            Keyboard::reply(buttons::review_intervals()),
        ),
        ParticipantState::QuestionDiscussion => Prompt::new(
            "You have entered a chat with a user",
            Keyboard::reply(buttons::back()),
        ),
        ParticipantState::SearchQuestion => Prompt::new(
            "Enter question number",
            Keyboard::reply(buttons::back()),
        ),
        ParticipantState::SwitchReceiver => receiver_switched(user.is_receiver),
        ParticipantState::New | ParticipantState::ReviewText | ParticipantState::Question => {
            return None
        }
    };
    Some(prompt)
}
