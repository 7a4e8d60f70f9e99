use anyhow::Context as _;
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DatabaseTransaction, EntityTrait, TransactionTrait};

use skycast_messaging::consumer::{IdempotenceError, IdempotenceStore, IdempotenceTx};
use skycast_notification_schema::notification_idempotence::{self, Column, Entity};

/// Processed-message set backed by the `notification_idempotence` table.
#[derive(Clone)]
pub struct DbIdempotenceStore {
    pub db: DatabaseConnection,
}

#[async_trait::async_trait]
impl IdempotenceStore for DbIdempotenceStore {
    async fn begin(&self) -> Result<Box<dyn IdempotenceTx>, IdempotenceError> {
        let txn = self
            .db
            .begin()
            .await
            .context("begin idempotence transaction")
            .map_err(IdempotenceError)?;
        Ok(Box::new(DbIdempotenceTx { txn }))
    }
}

/// Holds the claim until commit; dropping it rolls the insert back.
pub struct DbIdempotenceTx {
    txn: DatabaseTransaction,
}

#[async_trait::async_trait]
impl IdempotenceTx for DbIdempotenceTx {
    async fn try_claim(&mut self, message_id: &str) -> Result<bool, IdempotenceError> {
        let row = notification_idempotence::ActiveModel {
            message_id: Set(message_id.to_owned()),
            processed_at: Set(Utc::now()),
        };
        let inserted = Entity::insert(row)
            .on_conflict(OnConflict::column(Column::MessageId).do_nothing().to_owned())
            .exec_without_returning(&self.txn)
            .await
            .context("insert idempotence row")
            .map_err(IdempotenceError)?;
        Ok(inserted > 0)
    }

    async fn commit(self: Box<Self>) -> Result<(), IdempotenceError> {
        self.txn
            .commit()
            .await
            .context("commit idempotence transaction")
            .map_err(IdempotenceError)
    }
}
