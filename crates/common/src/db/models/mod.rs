//! SeaORM entity models
//!
//! Directory tables: organizations and their tenant mapping

mod organization;
mod organization_tenant;

pub use organization::{
    Entity as OrganizationEntity,
    Model as Organization,
    Column as OrganizationColumn,
};

pub use organization_tenant::{
    Entity as OrganizationTenantEntity,
    Model as OrganizationTenant,
};
