//! Feedback desk bot core.
//!
//! Routes star ratings and questions from customers to employees. The
//! [`Dispatcher`] applies every inbound event through the transition table in
//! [`machine`], the [`QuestionRouter`] hands new questions to employees and
//! arbitrates claims, and the [`CorrespondenceReplayer`] re-delivers question
//! threads. [`UpdateLoop`] drives it all from the messaging gateway.

pub mod buttons;
pub mod console;
pub mod dispatcher;
pub mod error;
pub mod machine;
pub mod prompts;
pub mod rating;
pub mod replay;
pub mod reviews;
pub mod router;
pub mod updates;

pub use console::{ConsoleCommand, ConsoleParseError, ConsoleReply, OperatorConsole};
pub use dispatcher::Dispatcher;
pub use error::{BotError, BotResult};
pub use machine::{transition, EventClass, Role, Transition};
pub use prompts::Prompt;
pub use rating::parse_rating;
pub use replay::CorrespondenceReplayer;
pub use reviews::{ReportInterval, ReviewReporter};
pub use router::{ClaimOutcome, QuestionRouter};
pub use updates::{BatchSummary, PollSettings, UpdateCursor, UpdateLoop};
