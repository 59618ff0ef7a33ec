use crate::models::hazard::HazardKind;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "alerts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub longitude: f64,
    pub latitude: f64,
    /// Radius of effect in meters.
    pub effect_radius: i32,
    pub country: Option<String>,
    pub city: Option<String>,
    pub county: Option<String>,
    /// Reporter; nulled if the account is deleted, the alert is retained.
    pub reported_by: Option<i32>,
    pub source_url: Option<String>,
    pub positive_votes: i32,
    pub negative_votes: i32,
    pub hazard_kind: Option<String>,
    pub hazard_detail_id: Option<i32>,
    /// When the alert expires and the sweep archives it.
    pub soft_deletion_time: DateTime,
    /// Soft-delete flag; false means archived.
    pub is_active: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl Model {
    pub fn kind(&self) -> Option<HazardKind> {
        self.hazard_kind.as_deref().and_then(HazardKind::parse)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ReportedBy",
        to = "super::user::Column::Id"
    )]
    Reporter,
    #[sea_orm(
        belongs_to = "super::hazard_detail::Entity",
        from = "Column::HazardDetailId",
        to = "super::hazard_detail::Column::Id"
    )]
    HazardDetail,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reporter.def()
    }
}

impl Related<super::hazard_detail::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::HazardDetail.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
