use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Merchants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Merchants::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Merchants::Name).string().not_null())
                    .col(
                        ColumnDef::new(Merchants::Provider)
                            .string_len(50)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Merchants::ProviderMerchantId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Merchants::AccessToken).text().not_null())
                    .col(ColumnDef::new(Merchants::RefreshToken).text().not_null())
                    .col(
                        ColumnDef::new(Merchants::TokenExpiresAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Merchants::TokenScopes).json().not_null())
                    .col(ColumnDef::new(Merchants::Locations).json().not_null())
                    .col(
                        ColumnDef::new(Merchants::ConnectedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Merchants::LastRefreshedAt)
                            .timestamp()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Merchants::RefreshFailureCount)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Merchants::Revoked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Merchants::ScopesMismatch)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Merchants::OnboardingCompleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Merchants::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Merchants::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        // One merchant row per provider account
        manager
            .create_index(
                Index::create()
                    .name("idx_merchants_provider_merchant")
                    .table(Merchants::Table)
                    .col(Merchants::Provider)
                    .col(Merchants::ProviderMerchantId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Eligibility scans filter on revoked + last_refreshed_at
        manager
            .create_index(
                Index::create()
                    .name("idx_merchants_last_refreshed_at")
                    .table(Merchants::Table)
                    .col(Merchants::LastRefreshedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Merchants::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Merchants {
    Table,
    Id,
    Name,
    Provider,
    ProviderMerchantId,
    AccessToken,
    RefreshToken,
    TokenExpiresAt,
    TokenScopes,
    Locations,
    ConnectedAt,
    LastRefreshedAt,
    RefreshFailureCount,
    Revoked,
    ScopesMismatch,
    OnboardingCompleted,
    CreatedAt,
    UpdatedAt,
}
