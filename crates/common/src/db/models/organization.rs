//! Organization entity

use sea_orm::entity::prelude::*;

use crate::auth::OrganizationRecord;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "organizations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false, column_type = "Text")]
    pub id: String,

    #[sea_orm(column_type = "Text", unique)]
    pub org_name: String,

    /// Plaintext or argon2 PHC string, depending on the configured scheme
    #[sea_orm(column_type = "Text")]
    pub password: String,
}

impl From<Model> for OrganizationRecord {
    fn from(model: Model) -> Self {
        OrganizationRecord {
            id: model.id,
            org_name: model.org_name,
            password: model.password,
        }
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::organization_tenant::Entity")]
    Tenant,
}

impl Related<super::organization_tenant::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tenant.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
