use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::work_schedules::Entity")]
    WorkSchedules,
}

impl Related<super::work_schedules::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::WorkSchedules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
