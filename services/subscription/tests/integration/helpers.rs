use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use skycast_domain::subscription::{Frequency, Subscription};
use skycast_messaging::Publisher;
use skycast_messaging::memory::{InMemoryBroker, InMemoryOutbox};
use skycast_messaging::outbox::NewOutboxMessage;
use uuid::Uuid;

use skycast_subscription::domain::repository::{
    CityValidatorPort, ConfirmedSubscriptions, OutboxWriter, PageCursor, SubscriptionRepository,
    SubscriptionScope, UnitOfWork,
};
use skycast_subscription::error::SubscriptionServiceError;
use skycast_subscription::events::{WriterDispatcher, writer_dispatcher};
use skycast_subscription::links::LinkBuilder;
use skycast_subscription::state::AppState;

pub const BASE_URL: &str = "https://skycast.test";

// ── MockDb ───────────────────────────────────────────────────────────────────

/// Committed subscription rows plus an outbox. Scopes buffer their writes and
/// apply them on commit, so a dropped scope leaves no trace.
#[derive(Clone, Default)]
pub struct MockDb {
    pub subscriptions: Arc<Mutex<Vec<Subscription>>>,
    pub outbox: InMemoryOutbox,
    fail_outbox: Arc<AtomicBool>,
    fail_pages: Arc<AtomicBool>,
    insert_conflict: Arc<AtomicBool>,
    commits: Arc<AtomicUsize>,
}

impl MockDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(rows: Vec<Subscription>) -> Self {
        let db = Self::new();
        db.subscriptions.lock().unwrap().extend(rows);
        db
    }

    pub fn rows(&self) -> Vec<Subscription> {
        self.subscriptions.lock().unwrap().clone()
    }

    pub fn find(&self, token: &str) -> Option<Subscription> {
        self.rows().into_iter().find(|s| s.token == token)
    }

    pub fn commits(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }

    pub fn set_fail_outbox(&self, fail: bool) {
        self.fail_outbox.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_pages(&self, fail: bool) {
        self.fail_pages.store(fail, Ordering::SeqCst);
    }

    /// Makes the next inserts lose to a concurrent writer on the unique
    /// lookup index, after `exists_by_lookup` has already answered false.
    pub fn set_insert_conflict(&self, conflict: bool) {
        self.insert_conflict.store(conflict, Ordering::SeqCst);
    }

    fn write_outbox(&self, message: NewOutboxMessage) -> Result<(), SubscriptionServiceError> {
        if self.fail_outbox.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("outbox insert failed").into());
        }
        self.outbox.save(message);
        Ok(())
    }
}

enum Write {
    Insert(Subscription),
    Update(Subscription),
    Delete(Uuid),
    Outbox(NewOutboxMessage),
}

pub struct MockScope {
    db: MockDb,
    writes: Mutex<Vec<Write>>,
}

impl UnitOfWork for MockDb {
    type Scope = MockScope;

    async fn begin(&self) -> Result<MockScope, SubscriptionServiceError> {
        Ok(MockScope {
            db: self.clone(),
            writes: Mutex::new(Vec::new()),
        })
    }
}

impl SubscriptionRepository for MockScope {
    async fn exists_by_lookup(
        &self,
        email: &str,
        city: &str,
        frequency: Frequency,
    ) -> Result<bool, SubscriptionServiceError> {
        Ok(self
            .db
            .rows()
            .iter()
            .any(|s| s.email == email && s.city == city && s.frequency == frequency))
    }

    async fn create(&self, subscription: &Subscription) -> Result<(), SubscriptionServiceError> {
        if self.db.insert_conflict.load(Ordering::SeqCst) {
            return Err(SubscriptionServiceError::AlreadySubscribed);
        }
        self.writes
            .lock()
            .unwrap()
            .push(Write::Insert(subscription.clone()));
        Ok(())
    }

    async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Subscription>, SubscriptionServiceError> {
        Ok(self.db.find(token))
    }

    async fn save_confirmation(
        &self,
        subscription: &Subscription,
    ) -> Result<(), SubscriptionServiceError> {
        self.writes
            .lock()
            .unwrap()
            .push(Write::Update(subscription.clone()));
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<(), SubscriptionServiceError> {
        self.writes.lock().unwrap().push(Write::Delete(id));
        Ok(())
    }
}

#[async_trait::async_trait]
impl OutboxWriter for MockScope {
    async fn save(&self, message: NewOutboxMessage) -> Result<(), SubscriptionServiceError> {
        if self.db.fail_outbox.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("outbox insert failed").into());
        }
        self.writes.lock().unwrap().push(Write::Outbox(message));
        Ok(())
    }
}

impl SubscriptionScope for MockScope {
    async fn commit(self) -> Result<(), SubscriptionServiceError> {
        let writes = self.writes.into_inner().unwrap();
        let mut rows = self.db.subscriptions.lock().unwrap();
        for write in writes {
            match write {
                Write::Insert(sub) => rows.push(sub),
                Write::Update(sub) => {
                    if let Some(row) = rows.iter_mut().find(|r| r.id == sub.id) {
                        *row = sub;
                    }
                }
                Write::Delete(id) => rows.retain(|r| r.id != id),
                Write::Outbox(message) => {
                    self.db.outbox.save(message);
                }
            }
        }
        self.db.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl ConfirmedSubscriptions for MockDb {
    async fn confirmed_page(
        &self,
        frequency: Frequency,
        after: Option<PageCursor>,
        limit: u64,
    ) -> Result<Vec<Subscription>, SubscriptionServiceError> {
        if self.fail_pages.load(Ordering::SeqCst) {
            return Err(anyhow::anyhow!("connection reset").into());
        }
        let mut rows: Vec<_> = self
            .rows()
            .into_iter()
            .filter(|s| s.confirmed && s.frequency == frequency)
            .filter(|s| match &after {
                Some(c) => (&s.city, s.id) > (&c.city, c.id),
                None => true,
            })
            .collect();
        rows.sort_by(|a, b| (&a.city, a.id).cmp(&(&b.city, b.id)));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

#[async_trait::async_trait]
impl OutboxWriter for MockDb {
    async fn save(&self, message: NewOutboxMessage) -> Result<(), SubscriptionServiceError> {
        self.write_outbox(message)
    }
}

// ── MockValidator ────────────────────────────────────────────────────────────

/// Knows a fixed set of cities, keyed by lower-case name.
#[derive(Clone)]
pub struct MockValidator {
    cities: Arc<HashMap<String, String>>,
    unavailable: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl MockValidator {
    pub fn new(cities: &[&str]) -> Self {
        Self {
            cities: Arc::new(
                cities
                    .iter()
                    .map(|c| (c.to_lowercase(), (*c).to_owned()))
                    .collect(),
            ),
            unavailable: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockValidator {
    fn default() -> Self {
        Self::new(&["London", "Kyiv", "Lviv", "Odesa"])
    }
}

impl CityValidatorPort for MockValidator {
    async fn validate(&self, city: &str) -> Result<String, SubscriptionServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(SubscriptionServiceError::Unavailable(
                "weather service unavailable".into(),
            ));
        }
        self.cities
            .get(&city.trim().to_lowercase())
            .cloned()
            .ok_or(SubscriptionServiceError::InvalidCity)
    }
}

// ── Wiring ───────────────────────────────────────────────────────────────────

pub fn dispatcher(broker: &InMemoryBroker) -> Arc<WriterDispatcher> {
    let publisher: Arc<dyn Publisher> = Arc::new(broker.clone());
    Arc::new(writer_dispatcher(LinkBuilder::new(BASE_URL), publisher))
}

pub struct Harness {
    pub db: MockDb,
    pub validator: MockValidator,
    pub broker: InMemoryBroker,
    pub state: AppState<MockDb, MockValidator>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_db(MockDb::new())
    }

    pub fn with_db(db: MockDb) -> Self {
        let validator = MockValidator::default();
        let broker = InMemoryBroker::new();
        let state = AppState {
            uow: db.clone(),
            validator: validator.clone(),
            dispatcher: dispatcher(&broker),
        };
        Self {
            db,
            validator,
            broker,
            state,
        }
    }
}
