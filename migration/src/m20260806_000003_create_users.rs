use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Users::Table)
                    .if_not_exists()
                    // Auth provider UID, assigned externally
                    .col(ColumnDef::new(Users::Id).string().not_null().primary_key())
                    .col(ColumnDef::new(Users::MerchantId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Users::AccountSetupComplete)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Users::ProviderUserId).string().null())
                    .col(ColumnDef::new(Users::Role).string_len(20).not_null())
                    .col(ColumnDef::new(Users::Email).string().null())
                    .col(ColumnDef::new(Users::EmailVerifiedAt).timestamp().null())
                    .col(
                        ColumnDef::new(Users::EmailVerificationSentAt)
                            .timestamp()
                            .null(),
                    )
                    .col(ColumnDef::new(Users::PasswordSetAt).timestamp().null())
                    .col(ColumnDef::new(Users::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(Users::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_users_merchant_id")
                    .table(Users::Table)
                    .col(Users::MerchantId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Users::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    MerchantId,
    AccountSetupComplete,
    ProviderUserId,
    Role,
    Email,
    EmailVerifiedAt,
    EmailVerificationSentAt,
    PasswordSetAt,
    CreatedAt,
    UpdatedAt,
}
