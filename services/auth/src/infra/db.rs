use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DatabaseTransaction,
    EntityTrait, QueryFilter, QuerySelect, TransactionTrait,
};
use uuid::Uuid;

use meridian_auth_schema::{magic_link_tokens, outbox_events, users};
use meridian_domain::user::{UserRole, UserStatus};

use crate::domain::repository::{MagicLinkRepository, UserRepository};
use crate::domain::types::{
    AuthUser, DeviceCategory, InvalidationReason, MagicLinkToken, OutboxEvent, RequestDevice,
};
use crate::error::AuthServiceError;

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(user_from_model).transpose()
    }
}

/// Unknown role/status wire values are a data defect, not a fallback case:
/// a guessed role would grant the wrong privileges downstream.
fn user_from_model(model: users::Model) -> Result<AuthUser, AuthServiceError> {
    let role = u8::try_from(model.role)
        .ok()
        .and_then(UserRole::from_u8)
        .ok_or_else(|| anyhow::anyhow!("unknown user role wire value {}", model.role))?;
    let status = u8::try_from(model.status)
        .ok()
        .and_then(UserStatus::from_u8)
        .ok_or_else(|| anyhow::anyhow!("unknown user status wire value {}", model.status))?;
    Ok(AuthUser {
        id: model.id,
        email: model.email,
        name: model.name,
        role,
        status,
    })
}

// ── MagicLink repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbMagicLinkRepository {
    pub db: DatabaseConnection,
}

impl MagicLinkRepository for DbMagicLinkRepository {
    async fn issue(
        &self,
        token: &MagicLinkToken,
        event: &OutboxEvent,
    ) -> Result<(), AuthServiceError> {
        self.db
            .transaction::<_, (), sea_orm::DbErr>(|txn| {
                let token = token.clone();
                let event = event.clone();
                Box::pin(async move {
                    lock_user_row(txn, token.user_id).await?;
                    supersede_valid_tokens(txn, token.user_id, token.created_at).await?;
                    insert_magic_link_token(txn, &token).await?;
                    insert_outbox_event(txn, &event).await?;
                    Ok(())
                })
            })
            .await
            .context("issue magic link with outbox")?;
        Ok(())
    }

    async fn redeem(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<MagicLinkToken>, AuthServiceError> {
        // Conditional update: succeeds for at most one caller per token.
        let result = magic_link_tokens::Entity::update_many()
            .col_expr(magic_link_tokens::Column::UsedAt, Expr::value(Some(now)))
            .col_expr(magic_link_tokens::Column::UpdatedAt, Expr::value(now))
            .filter(magic_link_tokens::Column::Token.eq(token))
            .filter(magic_link_tokens::Column::UsedAt.is_null())
            .filter(magic_link_tokens::Column::InvalidatedBy.is_null())
            .filter(magic_link_tokens::Column::DeletedAt.is_null())
            .filter(magic_link_tokens::Column::ExpiresAt.gt(now))
            .exec(&self.db)
            .await
            .context("redeem magic link")?;

        if result.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_token(token).await
    }

    async fn find_by_token(
        &self,
        token: &str,
    ) -> Result<Option<MagicLinkToken>, AuthServiceError> {
        let model = magic_link_tokens::Entity::find()
            .filter(magic_link_tokens::Column::Token.eq(token))
            .filter(magic_link_tokens::Column::DeletedAt.is_null())
            .one(&self.db)
            .await
            .context("find magic link by token")?;
        Ok(model.map(token_from_model))
    }

    async fn invalidate_active(
        &self,
        user_id: Uuid,
        reason: InvalidationReason,
    ) -> Result<u64, AuthServiceError> {
        let now = Utc::now();
        let result = magic_link_tokens::Entity::update_many()
            .col_expr(
                magic_link_tokens::Column::InvalidatedBy,
                Expr::value(Some(reason.as_i16())),
            )
            .col_expr(magic_link_tokens::Column::UpdatedAt, Expr::value(now))
            .filter(magic_link_tokens::Column::UserId.eq(user_id))
            .filter(magic_link_tokens::Column::UsedAt.is_null())
            .filter(magic_link_tokens::Column::InvalidatedBy.is_null())
            .filter(magic_link_tokens::Column::DeletedAt.is_null())
            .filter(magic_link_tokens::Column::ExpiresAt.gt(now))
            .exec(&self.db)
            .await
            .context("invalidate active magic links")?;
        Ok(result.rows_affected)
    }

    async fn mark_invalidated(
        &self,
        id: Uuid,
        reason: InvalidationReason,
    ) -> Result<(), AuthServiceError> {
        let now = Utc::now();
        magic_link_tokens::ActiveModel {
            id: Set(id),
            invalidated_by: Set(Some(reason.as_i16())),
            updated_at: Set(now),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("mark magic link invalidated")?;
        Ok(())
    }
}

/// Serialize concurrent issuance per user with `SELECT ... FOR UPDATE` on the
/// users row. Without it, two READ COMMITTED transactions could each supersede
/// zero rows and both insert, leaving two valid tokens for one user.
async fn lock_user_row(txn: &DatabaseTransaction, user_id: Uuid) -> Result<(), sea_orm::DbErr> {
    users::Entity::find_by_id(user_id)
        .lock_exclusive()
        .one(txn)
        .await?;
    Ok(())
}

/// Invalidate the user's currently-valid tokens (reason = new-request) ahead
/// of inserting a replacement. Runs inside the issue transaction.
async fn supersede_valid_tokens(
    txn: &DatabaseTransaction,
    user_id: Uuid,
    now: DateTime<Utc>,
) -> Result<(), sea_orm::DbErr> {
    magic_link_tokens::Entity::update_many()
        .col_expr(
            magic_link_tokens::Column::InvalidatedBy,
            Expr::value(Some(InvalidationReason::NewRequest.as_i16())),
        )
        .col_expr(magic_link_tokens::Column::UpdatedAt, Expr::value(now))
        .filter(magic_link_tokens::Column::UserId.eq(user_id))
        .filter(magic_link_tokens::Column::UsedAt.is_null())
        .filter(magic_link_tokens::Column::InvalidatedBy.is_null())
        .filter(magic_link_tokens::Column::DeletedAt.is_null())
        .filter(magic_link_tokens::Column::ExpiresAt.gt(now))
        .exec(txn)
        .await?;
    Ok(())
}

async fn insert_magic_link_token(
    txn: &DatabaseTransaction,
    token: &MagicLinkToken,
) -> Result<(), sea_orm::DbErr> {
    magic_link_tokens::ActiveModel {
        id: Set(token.id),
        user_id: Set(token.user_id),
        token: Set(token.token.clone()),
        user_agent: Set(token.device.user_agent.clone()),
        ip_address: Set(token.device.ip_address.clone()),
        device_category: Set(token.device.category.as_i16()),
        expires_at: Set(token.expires_at),
        used_at: Set(None),
        invalidated_by: Set(None),
        deleted_at: Set(None),
        created_at: Set(token.created_at),
        updated_at: Set(token.updated_at),
    }
    .insert(txn)
    .await?;
    Ok(())
}

async fn insert_outbox_event(
    txn: &DatabaseTransaction,
    event: &OutboxEvent,
) -> Result<(), sea_orm::DbErr> {
    let now = Utc::now();
    outbox_events::ActiveModel {
        id: Set(event.id),
        kind: Set(event.kind.clone()),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

fn token_from_model(model: magic_link_tokens::Model) -> MagicLinkToken {
    MagicLinkToken {
        id: model.id,
        user_id: model.user_id,
        token: model.token,
        device: RequestDevice {
            user_agent: model.user_agent,
            ip_address: model.ip_address,
            category: DeviceCategory::from_i16(model.device_category)
                .unwrap_or(DeviceCategory::Desktop),
        },
        expires_at: model.expires_at,
        used_at: model.used_at,
        invalidated_by: model.invalidated_by.and_then(InvalidationReason::from_i16),
        deleted_at: model.deleted_at,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
