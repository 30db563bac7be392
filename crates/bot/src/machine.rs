//! Participant state machine.
//!
//! Every inbound event is classified once into an [`EventClass`]; the
//! [`transition`] table then decides what, if anything, the event does for a
//! participant of the given [`Role`] in the given state. Combinations missing
//! from the table are ignored without a reply.

use feedback_database::{ParticipantState, QuestionId, User};

use crate::buttons;
use crate::rating::parse_rating;
use crate::reviews::ReportInterval;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Customer,
    Employee,
}

impl Role {
    pub fn of(user: &User) -> Self {
        if user.is_employee {
            Self::Employee
        } else {
            Self::Customer
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    Start,
    ReviewButton,
    QuestionButton,
    Rating(u8),
    Close,
    ToggleReceiver,
    OpenQuestions,
    FindQuestion,
    ReviewsButton,
    Report(ReportInterval),
    Back,
    /// Any other message, including messages without text.
    Text,
    Claim(QuestionId),
    /// Button press with a payload the bot does not recognise.
    UnknownButton,
}

impl EventClass {
    pub fn from_text(text: &str) -> Self {
        match text {
            buttons::START => Self::Start,
            buttons::REVIEW => Self::ReviewButton,
            buttons::QUESTION => Self::QuestionButton,
            buttons::CLOSE => Self::Close,
            buttons::RECEIVE_QUESTIONS | buttons::STOP_RECEIVING => Self::ToggleReceiver,
            buttons::OPEN_QUESTIONS => Self::OpenQuestions,
            buttons::FIND_QUESTION => Self::FindQuestion,
            buttons::REVIEWS => Self::ReviewsButton,
            buttons::FOR_A_DAY => Self::Report(ReportInterval::Day),
            buttons::FOR_A_WEEK => Self::Report(ReportInterval::Week),
            buttons::FOR_A_MONTH => Self::Report(ReportInterval::Month),
            buttons::ALL_RATINGS => Self::Report(ReportInterval::All),
            buttons::BACK => Self::Back,
            other => parse_rating(other).map_or(Self::Text, Self::Rating),
        }
    }

    /// Callback payloads look like `<kind>-<data>`.
    pub fn from_callback(data: &str) -> Self {
        let mut parts = data.splitn(2, '-');
        let kind = parts.next().and_then(|kind| kind.parse::<u32>().ok());
        let payload = parts.next().unwrap_or_default();

        match kind {
            Some(buttons::CLAIM_CALLBACK_KIND) => payload
                .parse::<QuestionId>()
                .map_or(Self::UnknownButton, Self::Claim),
            _ => Self::UnknownButton,
        }
    }

    pub fn is_button_press(self) -> bool {
        matches!(self, Self::Claim(_) | Self::UnknownButton)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Re-register the participant and show the main menu. Valid everywhere.
    Start,
    /// Silent state write.
    Activate(ParticipantState),
    /// State change followed by the prompt of the new state.
    Enter(ParticipantState),
    RecordRating(u8),
    /// Store the message as the pending review comment; `❌Close` stores the placeholder.
    RecordComment,
    CreateQuestion,
    CloseQuestion,
    CustomerReply,
    ToggleReceiver,
    ListOpenQuestions,
    SendReport(ReportInterval),
    ReleaseQuestion,
    EmployeeReply,
    SearchQuestion,
    Claim(QuestionId),
}

/// Look up what an event does. `None` means the event is ignored.
pub fn transition(role: Role, state: ParticipantState, class: EventClass) -> Option<Transition> {
    use EventClass as E;
    use ParticipantState as S;
    use Transition as T;

    if class == E::Start {
        return Some(T::Start);
    }

    let message = !class.is_button_press();

    match (role, state, class) {
        (_, S::New, _) if message => Some(T::Activate(S::Main)),

        (Role::Customer, S::Main, E::ReviewButton) => Some(T::Enter(S::Review)),
        (Role::Customer, S::Main, E::QuestionButton) => Some(T::Enter(S::Question)),

        (Role::Customer, S::Review, E::Rating(rating)) => Some(T::RecordRating(rating)),

        (Role::Customer, S::ReviewText, _) if message => Some(T::RecordComment),

        (Role::Customer, S::Question, E::Close) => Some(T::Enter(S::Main)),
        (Role::Customer, S::Question, _) if message => Some(T::CreateQuestion),

        (Role::Customer, S::QuestionDiscussion, E::Close) => Some(T::CloseQuestion),
        (Role::Customer, S::QuestionDiscussion, _) if message => Some(T::CustomerReply),

        (Role::Employee, S::Main, E::ToggleReceiver) => Some(T::ToggleReceiver),
        (Role::Employee, S::Main, E::OpenQuestions) => Some(T::ListOpenQuestions),
        (Role::Employee, S::Main, E::ReviewsButton) => Some(T::Enter(S::Review)),
        (Role::Employee, S::Main, E::FindQuestion) => Some(T::Enter(S::SearchQuestion)),
        (Role::Employee, S::Main, E::Claim(id)) => Some(T::Claim(id)),

        (Role::Employee, S::Review, E::Report(interval)) => Some(T::SendReport(interval)),
        (Role::Employee, S::Review, E::Back) => Some(T::Enter(S::Main)),

        (Role::Employee, S::QuestionDiscussion, E::Back) => Some(T::ReleaseQuestion),
        (Role::Employee, S::QuestionDiscussion, _) if message => Some(T::EmployeeReply),

        (Role::Employee, S::SearchQuestion, E::Back) => Some(T::Enter(S::Main)),
        (Role::Employee, S::SearchQuestion, _) if message => Some(T::SearchQuestion),

        _ => None,
    }
}
