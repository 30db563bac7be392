mod support;

use std::sync::Arc;
use std::time::Duration;

use feedback_bot::buttons;
use feedback_bot::dispatcher::{
    ALREADY_ANSWERING, NO_QUESTIONS, QUESTION_NOT_FOUND, QUESTION_TAKEN, WRONG_FORMAT,
};
use feedback_bot::{BotError, OperatorConsole, PollSettings, UpdateCursor, UpdateLoop};
use feedback_database::{ParticipantState, NO_COMMENT};
use feedback_telegram::{Keyboard, Update};
use serde_json::json;
use support::{test_store, Harness, RecordingGateway, Sent};

const CUSTOMER: i64 = 100;
const OTHER_CUSTOMER: i64 = 101;
const THIRD_CUSTOMER: i64 = 102;
const EMPLOYEE: i64 = 200;
const SECOND_EMPLOYEE: i64 = 201;

#[tokio::test]
async fn start_registers_customer_and_shows_main_menu() {
    let harness = Harness::new().await;

    let user = harness.customer(CUSTOMER).await;

    assert!(!user.is_employee);
    assert_eq!(user.state, ParticipantState::Main);
    let (text, keyboard) = harness.gateway.last_text_to(CUSTOMER).unwrap();
    assert!(text.starts_with("Greetings 👋"));
    assert_eq!(keyboard, Keyboard::reply(buttons::customer_main()));
}

#[tokio::test]
async fn review_is_rated_then_commented() {
    let harness = Harness::new().await;
    let customer = harness.customer(CUSTOMER).await;

    harness.text(CUSTOMER, "⭐Review").await.unwrap();
    assert_eq!(harness.user(CUSTOMER).await.state, ParticipantState::Review);
    let (text, keyboard) = harness.gateway.last_text_to(CUSTOMER).unwrap();
    assert_eq!(text, "Please rate from 1 to 5");
    assert_eq!(keyboard, Keyboard::reply(buttons::star_ratings()));

    harness.text(CUSTOMER, "⭐⭐⭐⭐").await.unwrap();
    assert_eq!(harness.user(CUSTOMER).await.state, ParticipantState::ReviewText);
    let pending = harness
        .store
        .reviews()
        .find_awaiting_comment(customer.id)
        .await
        .unwrap()
        .expect("review should wait for a comment");
    assert_eq!(pending.rating, 4);

    harness.text(CUSTOMER, "Quick and friendly").await.unwrap();
    assert_eq!(harness.user(CUSTOMER).await.state, ParticipantState::Main);
    let (text, _) = harness.gateway.last_text_to(CUSTOMER).unwrap();
    assert_eq!(text, "If you have any questions or review, I'm listening carefully");

    let counts = harness.store.reviews().count_by_rating().await.unwrap();
    assert_eq!(counts.get(4), 1);
    assert!(harness
        .store
        .reviews()
        .find_awaiting_comment(customer.id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn closing_the_comment_prompt_stores_placeholder() {
    let harness = Harness::new().await;
    harness.customer(CUSTOMER).await;

    harness.text(CUSTOMER, "⭐Review").await.unwrap();
    harness.text(CUSTOMER, "2").await.unwrap();
    harness.text(CUSTOMER, buttons::CLOSE).await.unwrap();

    let (from, to) = feedback_bot::ReportInterval::Day
        .range(chrono::Utc::now())
        .unwrap();
    let reviews = harness.store.reviews().list_in_range(from, to).await.unwrap();
    assert_eq!(reviews.len(), 1);
    assert_eq!(reviews[0].rating, 2);
    assert_eq!(reviews[0].text, NO_COMMENT);
}

#[tokio::test]
async fn invalid_rating_is_ignored() {
    let harness = Harness::new().await;
    harness.customer(CUSTOMER).await;
    harness.text(CUSTOMER, "⭐Review").await.unwrap();
    harness.gateway.clear();

    harness.text(CUSTOMER, "seven").await.unwrap();

    assert_eq!(harness.user(CUSTOMER).await.state, ParticipantState::Review);
    assert!(harness.gateway.sent().is_empty());
}

#[tokio::test]
async fn new_question_is_offered_to_receiving_employees_only() {
    let harness = Harness::new().await;
    harness.employee(EMPLOYEE, true).await;
    harness.employee(SECOND_EMPLOYEE, false).await;
    harness.customer(CUSTOMER).await;
    harness.gateway.clear();

    let question_id = harness.ask(CUSTOMER, "How do I reset my password?").await;

    let offers = harness.gateway.sent_to(EMPLOYEE);
    assert_eq!(
        offers,
        vec![Sent::Text {
            chat_id: EMPLOYEE,
            text: format!("Question #{question_id}\nHow do I reset my password?"),
            keyboard: Keyboard::inline(buttons::TAKE_QUESTION, format!("1-{question_id}")),
        }]
    );
    assert!(harness.gateway.sent_to(SECOND_EMPLOYEE).is_empty());

    let customer = harness.user(CUSTOMER).await;
    assert_eq!(customer.state, ParticipantState::QuestionDiscussion);
    let (text, keyboard) = harness.gateway.last_text_to(CUSTOMER).unwrap();
    assert!(text.starts_with(&format!("Your question #{question_id}\n")));
    assert_eq!(keyboard, Keyboard::reply(buttons::close()));
}

#[tokio::test]
async fn failed_offer_does_not_stop_fan_out() {
    let harness = Harness::new().await;
    harness.employee(EMPLOYEE, true).await;
    harness.employee(SECOND_EMPLOYEE, true).await;
    harness.customer(CUSTOMER).await;
    harness.gateway.fail_for(EMPLOYEE);

    let question_id = harness.ask(CUSTOMER, "Where is my order?").await;

    assert_eq!(harness.gateway.texts_to(SECOND_EMPLOYEE).len(), 3);
    assert!(harness
        .gateway
        .texts_to(SECOND_EMPLOYEE)
        .contains(&format!("Question #{question_id}\nWhere is my order?")));
    assert_eq!(
        harness.user(CUSTOMER).await.state,
        ParticipantState::QuestionDiscussion
    );
}

#[tokio::test]
async fn claim_replays_thread_in_order_and_enters_discussion() {
    let harness = Harness::new().await;
    let employee = harness.employee(EMPLOYEE, true).await;
    harness.customer(CUSTOMER).await;
    let question_id = harness.ask(CUSTOMER, "Can I change my plan?").await;
    let first = harness.text(CUSTOMER, "I am on the basic tier").await.unwrap();
    let second = harness.text(CUSTOMER, "and pay yearly").await.unwrap();
    harness.gateway.clear();

    harness
        .press(EMPLOYEE, &buttons::claim_payload(question_id))
        .await
        .unwrap();

    let sent = harness.gateway.sent_to(EMPLOYEE);
    assert_eq!(
        sent[..2],
        [
            Sent::Forward {
                to: EMPLOYEE,
                from: CUSTOMER,
                message_id: first,
            },
            Sent::Forward {
                to: EMPLOYEE,
                from: CUSTOMER,
                message_id: second,
            },
        ]
    );
    let (text, keyboard) = harness.gateway.last_text_to(EMPLOYEE).unwrap();
    assert_eq!(text, "You have entered a chat with a user");
    assert_eq!(keyboard, Keyboard::reply(buttons::back()));

    let question = harness
        .store
        .questions()
        .find_by_id(question_id)
        .await
        .unwrap()
        .unwrap();
    assert!(question.is_claimed_by(employee.id));
    assert_eq!(
        harness.user(EMPLOYEE).await.state,
        ParticipantState::QuestionDiscussion
    );
}

#[tokio::test]
async fn only_one_concurrent_claim_wins() {
    let harness = Harness::new().await;
    let first = harness.employee(EMPLOYEE, true).await;
    let second = harness.employee(SECOND_EMPLOYEE, true).await;
    harness.customer(CUSTOMER).await;
    let question_id = harness.ask(CUSTOMER, "Is delivery free?").await;
    harness.gateway.clear();

    let payload = buttons::claim_payload(question_id);
    let (a, b) = tokio::join!(
        harness.press(EMPLOYEE, &payload),
        harness.press(SECOND_EMPLOYEE, &payload)
    );
    a.unwrap();
    b.unwrap();

    let question = harness
        .store
        .questions()
        .find_by_id(question_id)
        .await
        .unwrap()
        .unwrap();
    let winner = question.answerer_id.expect("question should be claimed");
    assert!(winner == first.id || winner == second.id);

    let loser_chat = if winner == first.id { SECOND_EMPLOYEE } else { EMPLOYEE };
    assert_eq!(
        harness.gateway.texts_to(loser_chat),
        vec![QUESTION_TAKEN.to_string()]
    );
    assert_eq!(harness.user(loser_chat).await.state, ParticipantState::Main);
}

#[tokio::test]
async fn lost_claim_keeps_the_previous_claim() {
    let harness = Harness::new().await;
    let first = harness.employee(EMPLOYEE, true).await;
    let second = harness.employee(SECOND_EMPLOYEE, true).await;
    harness.customer(CUSTOMER).await;
    harness.customer(OTHER_CUSTOMER).await;
    let held = harness.ask(CUSTOMER, "Where is my parcel?").await;
    let contested = harness.ask(OTHER_CUSTOMER, "Can I pay by card?").await;

    harness
        .press(EMPLOYEE, &buttons::claim_payload(held))
        .await
        .unwrap();
    harness.text(EMPLOYEE, "/start").await.unwrap();
    harness
        .press(SECOND_EMPLOYEE, &buttons::claim_payload(contested))
        .await
        .unwrap();
    harness.gateway.clear();

    harness
        .press(EMPLOYEE, &buttons::claim_payload(contested))
        .await
        .unwrap();

    assert_eq!(
        harness.gateway.texts_to(EMPLOYEE),
        vec![QUESTION_TAKEN.to_string()]
    );
    let questions = harness.store.questions();
    let held_question = questions.find_by_id(held).await.unwrap().unwrap();
    assert!(held_question.is_claimed_by(first.id));
    let contested_question = questions.find_by_id(contested).await.unwrap().unwrap();
    assert!(contested_question.is_claimed_by(second.id));

    // A successful claim elsewhere hands the held question back.
    harness.customer(THIRD_CUSTOMER).await;
    let fresh = harness.ask(THIRD_CUSTOMER, "Do you gift wrap?").await;
    harness
        .press(EMPLOYEE, &buttons::claim_payload(fresh))
        .await
        .unwrap();
    let held_question = questions.find_by_id(held).await.unwrap().unwrap();
    assert_eq!(held_question.answerer_id, None);
    assert!(questions.find_by_id(fresh).await.unwrap().unwrap().is_claimed_by(first.id));
}

#[tokio::test]
async fn replay_stops_at_first_failed_delivery_and_keeps_claim() {
    let harness = Harness::new().await;
    let employee = harness.employee(EMPLOYEE, true).await;
    harness.customer(CUSTOMER).await;
    let question_id = harness.ask(CUSTOMER, "Is the store open on Sunday?").await;
    let first = harness.text(CUSTOMER, "I mean the one downtown").await.unwrap();
    harness.text(CUSTOMER, "near the station").await.unwrap();
    harness.text(CUSTOMER, "thanks!").await.unwrap();
    harness.gateway.clear();
    harness.gateway.fail_after(EMPLOYEE, 1);

    let result = harness
        .press(EMPLOYEE, &buttons::claim_payload(question_id))
        .await;

    assert!(matches!(result, Err(BotError::Delivery(_))));
    assert_eq!(
        harness.gateway.sent_to(EMPLOYEE),
        vec![Sent::Forward {
            to: EMPLOYEE,
            from: CUSTOMER,
            message_id: first,
        }]
    );
    let question = harness
        .store
        .questions()
        .find_by_id(question_id)
        .await
        .unwrap()
        .unwrap();
    assert!(question.is_claimed_by(employee.id));
    assert_eq!(harness.user(EMPLOYEE).await.state, ParticipantState::Main);

    harness.gateway.recover(EMPLOYEE);
    harness
        .press(EMPLOYEE, &buttons::claim_payload(question_id))
        .await
        .unwrap();
    assert_eq!(
        harness.user(EMPLOYEE).await.state,
        ParticipantState::QuestionDiscussion
    );
}

#[tokio::test]
async fn pressing_take_on_own_question_reenters_discussion() {
    let harness = Harness::new().await;
    harness.employee(EMPLOYEE, true).await;
    harness.customer(CUSTOMER).await;
    let question_id = harness.ask(CUSTOMER, "Do you ship abroad?").await;
    let payload = buttons::claim_payload(question_id);
    harness.press(EMPLOYEE, &payload).await.unwrap();
    let employee = harness.user(EMPLOYEE).await;

    // The offer stays in the chat history and can be pressed from the main menu.
    harness
        .store
        .users()
        .set_state(employee.id, ParticipantState::Main)
        .await
        .unwrap();
    harness.gateway.clear();

    harness.press(EMPLOYEE, &payload).await.unwrap();

    let texts = harness.gateway.texts_to(EMPLOYEE);
    assert_eq!(texts[0], ALREADY_ANSWERING);
    assert_eq!(
        harness.user(EMPLOYEE).await.state,
        ParticipantState::QuestionDiscussion
    );
}

#[tokio::test]
async fn answers_flow_between_customer_and_employee() {
    let harness = Harness::new().await;
    let employee = harness.employee(EMPLOYEE, true).await;
    let customer = harness.customer(CUSTOMER).await;
    let question_id = harness.ask(CUSTOMER, "How long is the warranty?").await;
    harness
        .press(EMPLOYEE, &buttons::claim_payload(question_id))
        .await
        .unwrap();
    harness.gateway.clear();

    let answer = harness.text(EMPLOYEE, "Two years").await.unwrap();
    assert_eq!(
        harness.gateway.sent_to(CUSTOMER),
        vec![Sent::Copy {
            to: CUSTOMER,
            from: EMPLOYEE,
            message_id: answer,
        }]
    );
    let question = harness.store.questions().find_by_id(question_id).await.unwrap().unwrap();
    assert!(question.have_answer);

    let follow_up = harness.text(CUSTOMER, "Even for batteries?").await.unwrap();
    assert!(harness.gateway.sent_to(EMPLOYEE).contains(&Sent::Forward {
        to: EMPLOYEE,
        from: CUSTOMER,
        message_id: follow_up,
    }));
    let question = harness.store.questions().find_by_id(question_id).await.unwrap().unwrap();
    assert!(!question.have_answer);

    let thread = harness
        .store
        .correspondence()
        .list_by_question(question_id)
        .await
        .unwrap();
    let senders: Vec<_> = thread
        .iter()
        .map(|entry| (entry.user_id, entry.is_employee, entry.message_id))
        .collect();
    assert_eq!(
        senders,
        vec![
            (employee.id, true, answer),
            (customer.id, false, follow_up)
        ]
    );
}

#[tokio::test]
async fn customer_close_is_forwarded_and_closes_question() {
    let harness = Harness::new().await;
    harness.employee(EMPLOYEE, true).await;
    harness.customer(CUSTOMER).await;
    let question_id = harness.ask(CUSTOMER, "Can I return this?").await;
    harness
        .press(EMPLOYEE, &buttons::claim_payload(question_id))
        .await
        .unwrap();
    harness.gateway.clear();

    let close = harness.text(CUSTOMER, buttons::CLOSE).await.unwrap();

    let question = harness.store.questions().find_by_id(question_id).await.unwrap().unwrap();
    assert!(question.is_closed);
    assert_eq!(
        harness.gateway.sent_to(EMPLOYEE),
        vec![Sent::Forward {
            to: EMPLOYEE,
            from: CUSTOMER,
            message_id: close,
        }]
    );
    assert_eq!(harness.user(CUSTOMER).await.state, ParticipantState::Main);
    let (text, _) = harness.gateway.last_text_to(CUSTOMER).unwrap();
    assert_eq!(text, "If you have any questions or review, I'm listening carefully");
}

#[tokio::test]
async fn restart_closes_the_open_question() {
    let harness = Harness::new().await;
    harness.customer(CUSTOMER).await;
    let question_id = harness.ask(CUSTOMER, "Anyone there?").await;

    harness.text(CUSTOMER, "/start").await.unwrap();

    let question = harness.store.questions().find_by_id(question_id).await.unwrap().unwrap();
    assert!(question.is_closed);
    assert_eq!(harness.user(CUSTOMER).await.state, ParticipantState::Main);
}

#[tokio::test]
async fn customer_may_ask_again_after_closing() {
    let harness = Harness::new().await;
    harness.customer(CUSTOMER).await;
    let first = harness.ask(CUSTOMER, "First").await;
    harness.text(CUSTOMER, buttons::CLOSE).await.unwrap();

    let second = harness.ask(CUSTOMER, "Second").await;

    assert_ne!(first, second);
    let questions = harness.store.questions();
    assert!(questions.find_by_id(first).await.unwrap().unwrap().is_closed);
    assert!(questions.find_by_id(second).await.unwrap().unwrap().is_open());
}

#[tokio::test]
async fn second_text_after_asking_joins_the_first_question() {
    let harness = Harness::new().await;
    let customer = harness.customer(CUSTOMER).await;

    harness.text(CUSTOMER, buttons::QUESTION).await.unwrap();
    harness.text(CUSTOMER, "Do you repair laptops?").await.unwrap();
    let follow_up = harness.text(CUSTOMER, "And tablets?").await.unwrap();

    let questions = harness.store.questions();
    let open = questions.list_claimable().await.unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(open[0].header, "Do you repair laptops?");
    let thread = harness
        .store
        .correspondence()
        .list_by_question(open[0].id)
        .await
        .unwrap();
    assert_eq!(thread.len(), 1);
    assert_eq!(thread[0].message_id, follow_up);

    // Creation itself does not check for an existing open question.
    let direct = questions.create(customer.id, "Direct").await.unwrap();
    assert_eq!(questions.list_claimable().await.unwrap().len(), 2);
    let newest = questions.find_open_by_asker(customer.id).await.unwrap().unwrap();
    assert_eq!(newest.id, direct.id);
}

#[tokio::test]
async fn employee_flag_decides_role_on_every_event() {
    let harness = Harness::new().await;
    harness.customer(CUSTOMER).await;
    harness.gateway.clear();

    harness.text(CUSTOMER, buttons::RECEIVE_QUESTIONS).await.unwrap();
    assert!(harness.gateway.sent().is_empty());

    harness
        .store
        .users()
        .set_employee_by_chat_id(CUSTOMER, true)
        .await
        .unwrap();
    harness.text(CUSTOMER, buttons::RECEIVE_QUESTIONS).await.unwrap();

    assert!(harness.user(CUSTOMER).await.is_receiver);
    let (text, _) = harness.gateway.last_text_to(CUSTOMER).unwrap();
    assert_eq!(text, "Now You receive questions");
}

#[tokio::test]
async fn failed_prompt_restores_previous_state() {
    let harness = Harness::new().await;
    harness.customer(CUSTOMER).await;
    harness.gateway.fail_for(CUSTOMER);

    let error = harness.text(CUSTOMER, "⭐Review").await.unwrap_err();

    assert!(matches!(error, BotError::Delivery(_)));
    assert_eq!(harness.user(CUSTOMER).await.state, ParticipantState::Main);

    harness.gateway.recover(CUSTOMER);
    harness.text(CUSTOMER, "⭐Review").await.unwrap();
    assert_eq!(harness.user(CUSTOMER).await.state, ParticipantState::Review);
}

#[tokio::test]
async fn toggling_receiver_flips_flag_and_menu() {
    let harness = Harness::new().await;
    harness.employee(EMPLOYEE, false).await;

    harness.text(EMPLOYEE, buttons::RECEIVE_QUESTIONS).await.unwrap();
    let user = harness.user(EMPLOYEE).await;
    assert!(user.is_receiver);
    assert_eq!(user.state, ParticipantState::Main);
    let (_, keyboard) = harness.gateway.last_text_to(EMPLOYEE).unwrap();
    assert_eq!(keyboard, Keyboard::reply(buttons::employee_main(true)));

    harness.text(EMPLOYEE, buttons::STOP_RECEIVING).await.unwrap();
    assert!(!harness.user(EMPLOYEE).await.is_receiver);
    let (text, _) = harness.gateway.last_text_to(EMPLOYEE).unwrap();
    assert_eq!(text, "You no longer receive questions");
}

#[tokio::test]
async fn failed_toggle_confirmation_keeps_flag() {
    let harness = Harness::new().await;
    harness.employee(EMPLOYEE, false).await;
    harness.gateway.fail_for(EMPLOYEE);

    let error = harness.text(EMPLOYEE, buttons::RECEIVE_QUESTIONS).await.unwrap_err();

    assert!(matches!(error, BotError::Delivery(_)));
    assert!(!harness.user(EMPLOYEE).await.is_receiver);
}

#[tokio::test]
async fn open_questions_lists_claimable_questions() {
    let harness = Harness::new().await;
    harness.employee(EMPLOYEE, false).await;
    harness.gateway.clear();

    harness.text(EMPLOYEE, buttons::OPEN_QUESTIONS).await.unwrap();
    assert_eq!(harness.gateway.texts_to(EMPLOYEE), vec![NO_QUESTIONS.to_string()]);

    harness.customer(CUSTOMER).await;
    harness.customer(OTHER_CUSTOMER).await;
    let first = harness.ask(CUSTOMER, "One").await;
    let second = harness.ask(OTHER_CUSTOMER, "Two").await;
    harness.gateway.clear();

    harness.text(EMPLOYEE, buttons::OPEN_QUESTIONS).await.unwrap();
    assert_eq!(
        harness.gateway.texts_to(EMPLOYEE),
        vec![
            format!("Question #{first}\nOne"),
            format!("Question #{second}\nTwo")
        ]
    );
}

#[tokio::test]
async fn search_handles_bad_input_and_unknown_numbers() {
    let harness = Harness::new().await;
    harness.employee(EMPLOYEE, false).await;
    harness.customer(CUSTOMER).await;
    let question_id = harness.ask(CUSTOMER, "Lost my receipt").await;
    let detail = harness.text(CUSTOMER, "It was last Tuesday").await.unwrap();

    harness.text(EMPLOYEE, buttons::FIND_QUESTION).await.unwrap();
    assert_eq!(
        harness.user(EMPLOYEE).await.state,
        ParticipantState::SearchQuestion
    );
    harness.gateway.clear();

    harness.text(EMPLOYEE, "number five").await.unwrap();
    harness.text(EMPLOYEE, "999").await.unwrap();
    assert_eq!(
        harness.gateway.texts_to(EMPLOYEE),
        vec![WRONG_FORMAT.to_string(), QUESTION_NOT_FOUND.to_string()]
    );
    harness.gateway.clear();

    harness.text(EMPLOYEE, &question_id.to_string()).await.unwrap();
    assert_eq!(
        harness.gateway.sent_to(EMPLOYEE),
        vec![
            Sent::Text {
                chat_id: EMPLOYEE,
                text: "Lost my receipt".to_string(),
                keyboard: Keyboard::None,
            },
            Sent::Forward {
                to: EMPLOYEE,
                from: CUSTOMER,
                message_id: detail,
            },
        ]
    );
    assert_eq!(
        harness.user(EMPLOYEE).await.state,
        ParticipantState::SearchQuestion
    );
}

#[tokio::test]
async fn review_reports_list_reviews_and_counts() {
    let harness = Harness::new().await;
    harness.customer(CUSTOMER).await;
    harness.text(CUSTOMER, "⭐Review").await.unwrap();
    harness.text(CUSTOMER, "5").await.unwrap();
    harness.text(CUSTOMER, "Excellent").await.unwrap();

    harness.employee(EMPLOYEE, false).await;
    harness.text(EMPLOYEE, buttons::REVIEWS).await.unwrap();
    let (text, _) = harness.gateway.last_text_to(EMPLOYEE).unwrap();
    assert_eq!(text, "Select Interval");
    harness.gateway.clear();

    harness.text(EMPLOYEE, buttons::FOR_A_DAY).await.unwrap();
    assert_eq!(
        harness.gateway.texts_to(EMPLOYEE),
        vec!["⭐⭐⭐⭐⭐\nExcellent".to_string()]
    );
    harness.gateway.clear();

    harness.text(EMPLOYEE, buttons::ALL_RATINGS).await.unwrap();
    let texts = harness.gateway.texts_to(EMPLOYEE);
    assert_eq!(texts.len(), 1);
    assert!(texts[0].lines().any(|line| line == "⭐⭐⭐⭐⭐ - 1"));
    assert!(texts[0].lines().any(|line| line == "⭐ - 0"));

    harness.text(EMPLOYEE, buttons::BACK).await.unwrap();
    assert_eq!(harness.user(EMPLOYEE).await.state, ParticipantState::Main);
}

#[tokio::test]
async fn customer_cannot_claim_questions() {
    let harness = Harness::new().await;
    harness.customer(CUSTOMER).await;
    harness.customer(OTHER_CUSTOMER).await;
    let question_id = harness.ask(CUSTOMER, "Hello?").await;
    harness.gateway.clear();

    harness
        .press(OTHER_CUSTOMER, &buttons::claim_payload(question_id))
        .await
        .unwrap();

    assert!(harness.gateway.sent().is_empty());
    let question = harness.store.questions().find_by_id(question_id).await.unwrap().unwrap();
    assert!(!question.is_claimed());
}

#[tokio::test]
async fn unknown_participant_is_reported() {
    let harness = Harness::new().await;

    let error = harness.text(CUSTOMER, "hello").await.unwrap_err();

    assert!(matches!(error, BotError::NotFound(_)));
    assert!(harness.gateway.sent().is_empty());
}

fn text_update(update_id: i64, chat_id: i64, text: &str) -> Update {
    serde_json::from_value(json!({
        "update_id": update_id,
        "message": {
            "message_id": update_id * 10,
            "from": {"id": chat_id, "is_bot": false, "first_name": "Test"},
            "chat": {"id": chat_id, "type": "private"},
            "date": 0,
            "text": text
        }
    }))
    .unwrap()
}

#[tokio::test]
async fn update_loop_advances_cursor_past_failures() {
    let (store, _dir) = test_store().await;
    let gateway = Arc::new(RecordingGateway::default());
    let updates = UpdateLoop::new(
        store.clone(),
        gateway.clone(),
        PollSettings {
            timeout_seconds: 0,
            interval: Duration::from_millis(1),
            batch_limit: 10,
        },
    );
    gateway.queue_updates(vec![
        text_update(40, CUSTOMER, "/start"),
        text_update(41, OTHER_CUSTOMER, "no start yet"),
        serde_json::from_value(json!({"update_id": 42})).unwrap(),
    ]);

    let cursor = updates.load_cursor().await.unwrap();
    assert_eq!(cursor, UpdateCursor::default());
    let summary = updates.run_once(cursor).await.unwrap();

    assert_eq!(summary.fetched, 3);
    assert_eq!(summary.handled, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.cursor.next_update_id(), 43);
    assert_eq!(store.cursor().load().await.unwrap(), 43);

    let empty = updates.run_once(summary.cursor).await.unwrap();
    assert_eq!(empty.fetched, 0);
    assert_eq!(gateway.requested_offsets(), vec![0, 43]);
    assert_eq!(
        store.users().find_by_chat_id(CUSTOMER).await.unwrap().unwrap().state,
        ParticipantState::Main
    );
}

#[tokio::test]
async fn update_loop_stops_on_shutdown() {
    let (store, _dir) = test_store().await;
    let gateway = Arc::new(RecordingGateway::default());
    store.cursor().save(7).await.unwrap();
    let updates = UpdateLoop::new(
        store,
        gateway.clone(),
        PollSettings {
            timeout_seconds: 0,
            interval: Duration::from_millis(5),
            batch_limit: 10,
        },
    );

    tokio::time::timeout(
        Duration::from_secs(5),
        updates.run(tokio::time::sleep(Duration::from_millis(50))),
    )
    .await
    .expect("loop should stop")
    .unwrap();

    let offsets = gateway.requested_offsets();
    assert!(!offsets.is_empty());
    assert!(offsets.iter().all(|offset| *offset == 7));
}

#[tokio::test]
async fn console_manages_employees() {
    let harness = Harness::new().await;
    let console = OperatorConsole::new(harness.store.clone());

    let reply = console.execute_line("abn @alice").await.unwrap();
    assert_eq!(reply.lines, vec!["Employee added".to_string()]);

    let reply = console.execute_line("ge").await.unwrap();
    assert_eq!(
        reply.lines,
        vec![
            "UserID:  Nickname: alice".to_string(),
            "(empty fields are filled when the employee uses the bot)".to_string()
        ]
    );

    harness
        .text_from(EMPLOYEE, Some("alice"), "/start")
        .await
        .unwrap();
    let alice = harness.user(EMPLOYEE).await;
    assert!(alice.is_employee);
    let (text, _) = harness.gateway.last_text_to(EMPLOYEE).unwrap();
    assert!(text.contains("To receive questions click"));

    let reply = console.execute_line("rbi 200").await.unwrap();
    assert_eq!(reply.lines, vec!["Employee removed".to_string()]);
    assert!(!harness.user(EMPLOYEE).await.is_employee);

    assert_eq!(
        console.execute_line("rbi 999").await.unwrap().lines,
        vec!["Employee not found".to_string()]
    );
    assert_eq!(
        console.execute_line("ge").await.unwrap().lines,
        vec!["No employees".to_string()]
    );
    assert_eq!(
        console.execute_line("abi x").await.unwrap().lines,
        vec!["Wrong format".to_string()]
    );
    assert!(console.execute_line("   ").await.unwrap().lines.is_empty());
    assert!(console.execute_line("close").await.unwrap().close);
}
