use crate::models::hazard::HazardDetails;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Kind-specific payload owned by exactly one alert. The `data` column
/// holds the serialized [`HazardDetails`] union, tagged by `kind`.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, ToSchema)]
#[sea_orm(table_name = "hazard_details")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub kind: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub data: Json,
    pub created_at: DateTime,
}

impl Model {
    /// Decode the stored payload. Returns None for rows written with a
    /// schema this build no longer understands.
    pub fn details(&self) -> Option<HazardDetails> {
        serde_json::from_value(self.data.clone()).ok()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
