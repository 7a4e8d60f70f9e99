use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Subscriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Subscriptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Subscriptions::Email).string().not_null())
                    .col(ColumnDef::new(Subscriptions::City).string().not_null())
                    .col(ColumnDef::new(Subscriptions::Frequency).string().not_null())
                    .col(
                        ColumnDef::new(Subscriptions::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::Confirmed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Subscriptions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(Subscriptions::Table)
                    .col(Subscriptions::Email)
                    .col(Subscriptions::City)
                    .col(Subscriptions::Frequency)
                    .unique()
                    .name("uq_subscriptions_email_city_frequency")
                    .to_owned(),
            )
            .await?;

        // Keyset scan of confirmed subscribers, grouped by city.
        manager
            .create_index(
                Index::create()
                    .table(Subscriptions::Table)
                    .col(Subscriptions::Frequency)
                    .col(Subscriptions::Confirmed)
                    .col(Subscriptions::City)
                    .col(Subscriptions::Id)
                    .name("idx_subscriptions_fanout")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Subscriptions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Subscriptions {
    Table,
    Id,
    Email,
    City,
    Frequency,
    Token,
    Confirmed,
    CreatedAt,
    UpdatedAt,
}
