use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MagicLinkTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MagicLinkTokens::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MagicLinkTokens::UserId).uuid().not_null())
                    .col(ColumnDef::new(MagicLinkTokens::Token).string().not_null())
                    .col(
                        ColumnDef::new(MagicLinkTokens::UserAgent)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MagicLinkTokens::IpAddress)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MagicLinkTokens::DeviceCategory)
                            .small_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MagicLinkTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MagicLinkTokens::UsedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(MagicLinkTokens::InvalidatedBy).small_integer())
                    .col(ColumnDef::new(MagicLinkTokens::DeletedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(MagicLinkTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MagicLinkTokens::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(MagicLinkTokens::Table, MagicLinkTokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique token value backs the cross-token uniqueness invariant.
        manager
            .create_index(
                Index::create()
                    .table(MagicLinkTokens::Table)
                    .col(MagicLinkTokens::Token)
                    .name("idx_magic_link_tokens_token")
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(MagicLinkTokens::Table)
                    .col(MagicLinkTokens::UserId)
                    .name("idx_magic_link_tokens_user_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MagicLinkTokens::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum MagicLinkTokens {
    Table,
    Id,
    UserId,
    Token,
    UserAgent,
    IpAddress,
    DeviceCategory,
    ExpiresAt,
    UsedAt,
    InvalidatedBy,
    DeletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
}
