use sea_orm::entity::prelude::*;

/// A barber's recurring weekly schedule: at most one row per weekday
/// (0 = Sunday .. 6 = Saturday). No row, or is_working = false, means the
/// barber is unavailable that day.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "work_schedules")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub barber_id: Uuid,
    pub weekday: i16,
    pub start_time: String,
    pub end_time: String,
    pub is_working: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::BarberId",
        to = "super::users::Column::Id"
    )]
    Barber,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Barber.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
