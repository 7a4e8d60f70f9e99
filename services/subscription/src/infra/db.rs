use anyhow::Context as _;
use chrono::Utc;
use sea_orm::sea_query::{Expr, LockBehavior, LockType};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use skycast_domain::subscription::{Frequency, Subscription};
use skycast_messaging::outbox::{
    NewOutboxMessage, OutboxBatch, OutboxError, OutboxMessage, OutboxStatus, OutboxStore,
};
use skycast_subscription_schema::{outbox, subscriptions};

use crate::domain::repository::{
    ConfirmedSubscriptions, OutboxWriter, PageCursor, SubscriptionRepository, SubscriptionScope,
    UnitOfWork,
};
use crate::error::SubscriptionServiceError;

// ── Unit of work ─────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUnitOfWork {
    pub db: DatabaseConnection,
}

impl UnitOfWork for DbUnitOfWork {
    type Scope = DbScope;

    async fn begin(&self) -> Result<DbScope, SubscriptionServiceError> {
        let txn = self.db.begin().await.context("begin transaction")?;
        Ok(DbScope { txn })
    }
}

/// Repositories bound to one open transaction.
pub struct DbScope {
    txn: DatabaseTransaction,
}

impl SubscriptionRepository for DbScope {
    async fn exists_by_lookup(
        &self,
        email: &str,
        city: &str,
        frequency: Frequency,
    ) -> Result<bool, SubscriptionServiceError> {
        exists_by_lookup(&self.txn, email, city, frequency).await
    }

    async fn create(&self, subscription: &Subscription) -> Result<(), SubscriptionServiceError> {
        insert_subscription(&self.txn, subscription).await
    }

    async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<Subscription>, SubscriptionServiceError> {
        find_by_token(&self.txn, token).await
    }

    async fn save_confirmation(
        &self,
        subscription: &Subscription,
    ) -> Result<(), SubscriptionServiceError> {
        save_confirmation(&self.txn, subscription).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), SubscriptionServiceError> {
        delete_subscription(&self.txn, id).await
    }
}

#[async_trait::async_trait]
impl OutboxWriter for DbScope {
    async fn save(&self, message: NewOutboxMessage) -> Result<(), SubscriptionServiceError> {
        insert_outbox(&self.txn, message).await
    }
}

impl SubscriptionScope for DbScope {
    async fn commit(self) -> Result<(), SubscriptionServiceError> {
        self.txn.commit().await.context("commit transaction")?;
        Ok(())
    }
}

// ── Pooled repository ────────────────────────────────────────────────────────

/// Subscription queries outside any transaction.
#[derive(Clone)]
pub struct DbSubscriptionRepository {
    pub db: DatabaseConnection,
}

impl ConfirmedSubscriptions for DbSubscriptionRepository {
    async fn confirmed_page(
        &self,
        frequency: Frequency,
        after: Option<PageCursor>,
        limit: u64,
    ) -> Result<Vec<Subscription>, SubscriptionServiceError> {
        let mut query = subscriptions::Entity::find()
            .filter(subscriptions::Column::Confirmed.eq(true))
            .filter(subscriptions::Column::Frequency.eq(frequency.as_str()));
        if let Some(cursor) = after {
            query = query.filter(
                Condition::any()
                    .add(subscriptions::Column::City.gt(cursor.city.clone()))
                    .add(
                        Condition::all()
                            .add(subscriptions::Column::City.eq(cursor.city))
                            .add(subscriptions::Column::Id.gt(cursor.id)),
                    ),
            );
        }
        let models = query
            .order_by_asc(subscriptions::Column::City)
            .order_by_asc(subscriptions::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .context("page confirmed subscriptions")?;
        models
            .into_iter()
            .map(|m| subscription_from_model(m).map_err(Into::into))
            .collect()
    }
}

#[async_trait::async_trait]
impl OutboxWriter for DbSubscriptionRepository {
    async fn save(&self, message: NewOutboxMessage) -> Result<(), SubscriptionServiceError> {
        insert_outbox(&self.db, message).await
    }
}

// ── Queries ──────────────────────────────────────────────────────────────────

async fn exists_by_lookup<C: ConnectionTrait>(
    conn: &C,
    email: &str,
    city: &str,
    frequency: Frequency,
) -> Result<bool, SubscriptionServiceError> {
    let count = subscriptions::Entity::find()
        .filter(subscriptions::Column::Email.eq(email))
        .filter(subscriptions::Column::City.eq(city))
        .filter(subscriptions::Column::Frequency.eq(frequency.as_str()))
        .count(conn)
        .await
        .context("lookup subscription")?;
    Ok(count > 0)
}

async fn insert_subscription<C: ConnectionTrait>(
    conn: &C,
    sub: &Subscription,
) -> Result<(), SubscriptionServiceError> {
    subscriptions::ActiveModel {
        id: Set(sub.id),
        email: Set(sub.email.clone()),
        city: Set(sub.city.clone()),
        frequency: Set(sub.frequency.as_str().to_owned()),
        token: Set(sub.token.clone()),
        confirmed: Set(sub.confirmed),
        created_at: Set(sub.created_at),
        updated_at: Set(sub.updated_at),
    }
    .insert(conn)
    .await
    .map_err(|err| classify_insert_error(err.sql_err(), err))?;
    Ok(())
}

/// Unique index over `(email, city, frequency)`.
const LOOKUP_UNIQUE_INDEX: &str = "uq_subscriptions_email_city_frequency";

/// A concurrent subscribe can pass `exists_by_lookup` and still lose the
/// insert to the unique index; that is a conflict, not a server fault.
fn classify_insert_error(sql_err: Option<SqlErr>, err: DbErr) -> SubscriptionServiceError {
    match sql_err {
        Some(SqlErr::UniqueConstraintViolation(message))
            if message.contains(LOOKUP_UNIQUE_INDEX) =>
        {
            SubscriptionServiceError::AlreadySubscribed
        }
        _ => anyhow::Error::new(err).context("insert subscription").into(),
    }
}

async fn find_by_token<C: ConnectionTrait>(
    conn: &C,
    token: &str,
) -> Result<Option<Subscription>, SubscriptionServiceError> {
    let model = subscriptions::Entity::find()
        .filter(subscriptions::Column::Token.eq(token))
        .one(conn)
        .await
        .context("find subscription by token")?;
    Ok(model.map(subscription_from_model).transpose()?)
}

async fn save_confirmation<C: ConnectionTrait>(
    conn: &C,
    sub: &Subscription,
) -> Result<(), SubscriptionServiceError> {
    subscriptions::ActiveModel {
        id: Set(sub.id),
        confirmed: Set(sub.confirmed),
        updated_at: Set(sub.updated_at),
        ..Default::default()
    }
    .update(conn)
    .await
    .context("confirm subscription")?;
    Ok(())
}

async fn delete_subscription<C: ConnectionTrait>(
    conn: &C,
    id: Uuid,
) -> Result<(), SubscriptionServiceError> {
    subscriptions::Entity::delete_by_id(id)
        .exec(conn)
        .await
        .context("delete subscription")?;
    Ok(())
}

async fn insert_outbox<C: ConnectionTrait>(
    conn: &C,
    message: NewOutboxMessage,
) -> Result<(), SubscriptionServiceError> {
    let row = OutboxMessage::from_new(message);
    outbox::ActiveModel {
        id: Set(row.id),
        aggregate_id: Set(row.aggregate_id),
        message_id: Set(row.message_id),
        event_type: Set(row.event_type),
        payload: Set(row.payload),
        status: Set(row.status.as_str().to_owned()),
        attempts: Set(row.attempts),
        created_at: Set(row.created_at),
        updated_at: Set(row.updated_at),
    }
    .insert(conn)
    .await
    .context("insert outbox message")?;
    Ok(())
}

pub(crate) fn subscription_from_model(model: subscriptions::Model) -> anyhow::Result<Subscription> {
    let frequency: Frequency = model
        .frequency
        .parse()
        .with_context(|| format!("subscription {} has frequency {:?}", model.id, model.frequency))?;
    Ok(Subscription {
        id: model.id,
        email: model.email,
        city: model.city,
        frequency,
        token: model.token,
        confirmed: model.confirmed,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

// ── Outbox store ─────────────────────────────────────────────────────────────

/// Relay-side access to the outbox table.
#[derive(Clone)]
pub struct DbOutboxStore {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl OutboxStore for DbOutboxStore {
    async fn begin(&self) -> Result<Box<dyn OutboxBatch>, OutboxError> {
        let txn = self
            .db
            .begin()
            .await
            .context("begin outbox batch")
            .map_err(OutboxError::Storage)?;
        Ok(Box::new(DbOutboxBatch { txn }))
    }
}

pub struct DbOutboxBatch {
    txn: DatabaseTransaction,
}

#[async_trait::async_trait]
impl OutboxBatch for DbOutboxBatch {
    async fn pending(&mut self, limit: u64) -> Result<Vec<OutboxMessage>, OutboxError> {
        let models = outbox::Entity::find()
            .filter(
                outbox::Column::Status.is_in([
                    OutboxStatus::Pending.as_str(),
                    OutboxStatus::Failed.as_str(),
                ]),
            )
            .order_by_asc(outbox::Column::CreatedAt)
            .limit(limit)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .all(&self.txn)
            .await
            .context("select pending outbox messages")
            .map_err(OutboxError::Storage)?;
        models
            .into_iter()
            .map(|m| outbox_from_model(m).map_err(OutboxError::Storage))
            .collect()
    }

    async fn update_status(&mut self, id: Uuid, status: OutboxStatus) -> Result<(), OutboxError> {
        let result = outbox::Entity::update_many()
            .col_expr(outbox::Column::Status, Expr::value(status.as_str()))
            .col_expr(
                outbox::Column::Attempts,
                Expr::col(outbox::Column::Attempts).add(1),
            )
            .col_expr(outbox::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(outbox::Column::Id.eq(id))
            .exec(&self.txn)
            .await
            .context("update outbox status")
            .map_err(OutboxError::Storage)?;
        if result.rows_affected == 0 {
            return Err(OutboxError::Storage(anyhow::anyhow!(
                "outbox message {id} not found"
            )));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), OutboxError> {
        self.txn
            .commit()
            .await
            .context("commit outbox batch")
            .map_err(OutboxError::Storage)
    }
}

pub(crate) fn outbox_from_model(model: outbox::Model) -> anyhow::Result<OutboxMessage> {
    let status = model
        .status
        .parse::<OutboxStatus>()
        .map_err(anyhow::Error::msg)?;
    Ok(OutboxMessage {
        id: model.id,
        aggregate_id: model.aggregate_id,
        message_id: model.message_id,
        event_type: model.event_type,
        payload: model.payload,
        status,
        attempts: model.attempts,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
