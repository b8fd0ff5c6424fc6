use sea_orm::entity::prelude::*;

/// Minimal user record owned by the auth service.
/// Stores only the fields needed to authenticate and mint a session
/// (email lookup, display name, role/status assertion).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub name: String,
    pub role: i16,
    pub status: i16,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::magic_link_tokens::Entity")]
    MagicLinkTokens,
}

impl Related<super::magic_link_tokens::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MagicLinkTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
