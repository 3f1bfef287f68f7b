use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: Uuid,
    pub customer_id: Uuid,
    pub barber_id: Uuid,
    pub service_id: Uuid,
    pub salon_id: Uuid,
    pub date: Date,
    pub start_time: String,
    pub end_time: String,
    pub status: String,
    pub is_walk_in: bool,
    pub queue_number: Option<i32>,
    pub estimated_wait_time: Option<i32>,
    pub cancellation_reason: Option<String>,
    pub cancelled_by: Option<String>,
    pub cancellation_time: Option<DateTimeWithTimeZone>,
    pub is_emergency: bool,
    pub emergency_details: Option<String>,
    pub completed_by: Option<String>,
    pub price: Option<i64>,
    pub is_paid: bool,
    pub payment_method: Option<String>,
    pub products_used: Option<Json>,
    pub rating: Option<i16>,
    pub review: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::CustomerId",
        to = "super::users::Column::Id"
    )]
    Customer,
    #[sea_orm(
        belongs_to = "super::services::Entity",
        from = "Column::ServiceId",
        to = "super::services::Column::Id"
    )]
    Service,
    #[sea_orm(
        belongs_to = "super::salons::Entity",
        from = "Column::SalonId",
        to = "super::salons::Column::Id"
    )]
    Salon,
}

impl Related<super::services::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl Related<super::salons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Salon.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
