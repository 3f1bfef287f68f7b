use sea_orm::entity::prelude::*;

/// Salon opening hours, one row per weekday (0 = Sunday .. 6 = Saturday).
/// These bound every barber's bookable window at that salon.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "operating_hours")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub salon_id: Uuid,
    pub weekday: i16,
    pub start_time: String,
    pub end_time: String,
    pub is_open: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::salons::Entity",
        from = "Column::SalonId",
        to = "super::salons::Column::Id"
    )]
    Salon,
}

impl Related<super::salons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Salon.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
