use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Stock ledger rows: quantity is the level immediately after the change
        manager
            .create_table(
                Table::create()
                    .table(ProductHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProductHistory::Id)
                            .uuid()
                            .primary_key()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductHistory::ProductId).uuid().not_null())
                    .col(ColumnDef::new(ProductHistory::Date).date().not_null())
                    .col(ColumnDef::new(ProductHistory::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(ProductHistory::ChangeAmount)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ProductHistory::ChangeType).string().not_null())
                    .col(ColumnDef::new(ProductHistory::ReferenceId).uuid().null())
                    .col(ColumnDef::new(ProductHistory::Sequence).integer().not_null())
                    .col(
                        ColumnDef::new(ProductHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_product_history_product")
                            .from(ProductHistory::Table, ProductHistory::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_product_history_product_date")
                    .table(ProductHistory::Table)
                    .col(ProductHistory::ProductId)
                    .col(ProductHistory::Date)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Forecasting::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Forecasting::Id).uuid().primary_key().not_null())
                    .col(ColumnDef::new(Forecasting::ProductId).uuid().not_null())
                    .col(ColumnDef::new(Forecasting::Date).date().not_null())
                    .col(
                        ColumnDef::new(Forecasting::PredictedDemand)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Forecasting::ConfidenceScore).decimal().null())
                    .col(ColumnDef::new(Forecasting::ModelType).string().null())
                    .col(
                        ColumnDef::new(Forecasting::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Forecasting::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_forecasting_product")
                            .from(Forecasting::Table, Forecasting::ProductId)
                            .to(Products::Table, Products::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Forecasting::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ProductHistory::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ProductHistory {
    Table,
    Id,
    ProductId,
    Date,
    Quantity,
    ChangeAmount,
    ChangeType,
    ReferenceId,
    Sequence,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Forecasting {
    Table,
    Id,
    ProductId,
    Date,
    PredictedDemand,
    ConfidenceScore,
    ModelType,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Products {
    Table,
    Id,
}
