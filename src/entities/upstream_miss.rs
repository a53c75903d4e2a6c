use sea_orm::entity::prelude::*;
use serde::Serialize;

/// A remote id the provider answered "does not exist" for.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "upstream_miss")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub kind: RecordKind,
    pub remote_id: i64,
    pub recorded_at: i64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum RecordKind {
    #[sea_orm(string_value = "movie")]
    Movie,
    #[sea_orm(string_value = "person")]
    Person,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
