//! Button labels shared by the menus and the event classifier.

pub const START: &str = "/start";

pub const REVIEW: &str = "⭐Review";
pub const QUESTION: &str = "❓Question";
pub const CLOSE: &str = "❌Close";

pub const RECEIVE_QUESTIONS: &str = "❓Receive questions";
pub const STOP_RECEIVING: &str = "❓Do not receive questions";
pub const OPEN_QUESTIONS: &str = "❓Open questions";
pub const FIND_QUESTION: &str = "❓Find a question";
pub const REVIEWS: &str = "⭐Reviews";

pub const FOR_A_DAY: &str = "📅For a day";
pub const FOR_A_WEEK: &str = "📅For a week";
pub const FOR_A_MONTH: &str = "📅For a month";
pub const ALL_RATINGS: &str = "📅All (no text)";
pub const BACK: &str = "↩️Back";

pub const TAKE_QUESTION: &str = "Take question";

/// Callback kind prefix of a claim offer button.
pub const CLAIM_CALLBACK_KIND: u32 = 1;

pub fn customer_main() -> Vec<&'static str> {
    vec![REVIEW, QUESTION]
}

pub fn star_ratings() -> Vec<&'static str> {
    vec!["⭐⭐⭐⭐⭐", "⭐⭐⭐⭐", "⭐⭐⭐", "⭐⭐", "⭐"]
}

pub fn close() -> Vec<&'static str> {
    vec![CLOSE]
}

/// The receive toggle label reflects what pressing it will do.
pub fn employee_main(is_receiver: bool) -> Vec<&'static str> {
    let toggle = if is_receiver {
        STOP_RECEIVING
    } else {
        RECEIVE_QUESTIONS
    };
    vec![toggle, OPEN_QUESTIONS, FIND_QUESTION, REVIEWS]
}

pub fn review_intervals() -> Vec<&'static str> {
    vec![FOR_A_DAY, FOR_A_WEEK, FOR_A_MONTH, ALL_RATINGS, BACK]
}

pub fn back() -> Vec<&'static str> {
    vec![BACK]
}

pub fn claim_payload(question_id: i64) -> String {
    format!("{CLAIM_CALLBACK_KIND}-{question_id}")
}
