use std::sync::Arc;

use skycast_domain::event::EventName;
use skycast_domain::subscription::Frequency;
use skycast_messaging::BusMessage;
use skycast_messaging::consumer::IdempotentConsumer;
use skycast_messaging::memory::{AckOutcome, InMemoryBroker, InMemoryIdempotenceStore};
use skycast_testing::factory::{TEST_EMAIL, user_subscribed_body};

use skycast_notification::usecase::notify::ConfirmationEmailHandler;

use crate::helpers::{RecordingMailer, enqueue, never_cancelled};

const QUEUE: &str = "user_subscribed";

struct Fixture {
    broker: InMemoryBroker,
    store: InMemoryIdempotenceStore,
    mailer: Arc<RecordingMailer>,
}

impl Fixture {
    fn new(mailer: RecordingMailer) -> Self {
        Self {
            broker: InMemoryBroker::new(),
            store: InMemoryIdempotenceStore::new(),
            mailer: Arc::new(mailer),
        }
    }

    async fn consume(&self, messages: Vec<BusMessage>) {
        enqueue(&self.broker, QUEUE, messages).await;
        let consumer = IdempotentConsumer::new(
            QUEUE,
            Arc::new(self.broker.clone()),
            Arc::new(ConfirmationEmailHandler::new(self.mailer.clone())),
            Arc::new(self.store.clone()),
        );
        consumer.run(never_cancelled()).await.unwrap();
    }
}

fn delivery() -> (String, BusMessage) {
    let body = user_subscribed_body("Kyiv", Frequency::Daily);
    let message = BusMessage::json(&body)
        .unwrap()
        .with_message_id(body.message_id);
    (body.message_id.to_string(), message)
}

#[test]
fn should_consume_the_user_subscribed_queue() {
    assert_eq!(EventName::UserSubscribed.queue(), QUEUE);
}

#[tokio::test]
async fn should_send_once_for_repeated_deliveries() {
    let f = Fixture::new(RecordingMailer::default());
    let (id, message) = delivery();

    f.consume(vec![message; 5]).await;

    let sent = f.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, TEST_EMAIL);
    assert!(sent[0].text.contains("https://skycast.test/api/confirm/"));
    assert_eq!(f.store.processed(), vec![id]);
    assert_eq!(f.broker.outcomes(), vec![AckOutcome::Ack; 5]);
}

#[tokio::test]
async fn should_leave_no_record_when_send_fails() {
    let f = Fixture::new(RecordingMailer::failing_first(1));
    let (_, message) = delivery();

    f.consume(vec![message]).await;

    assert_eq!(f.mailer.attempts(), 1);
    assert!(f.mailer.sent().is_empty());
    assert!(f.store.processed().is_empty());
    assert_eq!(f.broker.outcomes(), vec![AckOutcome::Nack { requeue: false }]);
}

#[tokio::test]
async fn should_send_on_redelivery_after_failure() {
    let f = Fixture::new(RecordingMailer::failing_first(1));
    let (id, message) = delivery();

    f.consume(vec![message.clone(), message]).await;

    assert_eq!(f.mailer.attempts(), 2);
    assert_eq!(f.mailer.sent().len(), 1);
    assert_eq!(f.store.processed(), vec![id]);
    assert_eq!(
        f.broker.outcomes(),
        vec![AckOutcome::Nack { requeue: false }, AckOutcome::Ack]
    );
}

#[tokio::test]
async fn should_reject_malformed_body_without_sending() {
    let f = Fixture::new(RecordingMailer::default());
    let message = BusMessage::from_json_bytes(br#"{"email":"test@example.com"}"#.to_vec())
        .with_message_id(uuid::Uuid::new_v4());

    f.consume(vec![message]).await;

    assert_eq!(f.mailer.attempts(), 0);
    assert!(f.store.processed().is_empty());
    assert_eq!(f.broker.outcomes(), vec![AckOutcome::Nack { requeue: false }]);
}

#[tokio::test]
async fn should_treat_distinct_message_ids_independently() {
    let f = Fixture::new(RecordingMailer::default());
    let (first_id, first) = delivery();
    let (second_id, second) = delivery();

    f.consume(vec![first.clone(), second, first]).await;

    assert_eq!(f.mailer.sent().len(), 2);
    assert_eq!(f.store.processed(), vec![first_id, second_id]);
}
