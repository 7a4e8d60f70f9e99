use sea_orm_migration::prelude::*;

use skycast_notification_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
