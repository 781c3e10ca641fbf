use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Items::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Items::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Items::MerchantId).big_integer().not_null())
                    .col(ColumnDef::new(Items::Provider).string_len(50).not_null())
                    .col(ColumnDef::new(Items::ProviderItemId).string().not_null())
                    .col(ColumnDef::new(Items::Name).string().not_null())
                    .col(ColumnDef::new(Items::Description).text().null())
                    .col(ColumnDef::new(Items::CategoryId).string().null())
                    .col(ColumnDef::new(Items::CategoryName).string().null())
                    .col(
                        ColumnDef::new(Items::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Items::IsAvailable)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Items::ProviderVersion).big_integer().null())
                    .col(ColumnDef::new(Items::ProviderUpdatedAt).timestamp().null())
                    .col(ColumnDef::new(Items::LastSeenAt).timestamp().null())
                    .col(ColumnDef::new(Items::Raw).json().null())
                    .col(ColumnDef::new(Items::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Items::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // Upsert key: one row per provider item per merchant
        manager
            .create_index(
                Index::create()
                    .name("idx_items_merchant_provider_item")
                    .table(Items::Table)
                    .col(Items::MerchantId)
                    .col(Items::Provider)
                    .col(Items::ProviderItemId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Reconciliation pass filters on merchant + last_seen_at
        manager
            .create_index(
                Index::create()
                    .name("idx_items_merchant_last_seen")
                    .table(Items::Table)
                    .col(Items::MerchantId)
                    .col(Items::LastSeenAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Items::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Items {
    Table,
    Id,
    MerchantId,
    Provider,
    ProviderItemId,
    Name,
    Description,
    CategoryId,
    CategoryName,
    IsDeleted,
    IsAvailable,
    ProviderVersion,
    ProviderUpdatedAt,
    LastSeenAt,
    Raw,
    CreatedAt,
    UpdatedAt,
}
