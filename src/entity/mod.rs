pub mod appointments;
pub mod audit_logs;
pub mod operating_hours;
pub mod salons;
pub mod services;
pub mod users;
pub mod work_schedules;

pub use appointments::Entity as Appointments;
pub use audit_logs::Entity as AuditLogs;
pub use operating_hours::Entity as OperatingHours;
pub use salons::Entity as Salons;
pub use services::Entity as Services;
pub use users::Entity as Users;
pub use work_schedules::Entity as WorkSchedules;
