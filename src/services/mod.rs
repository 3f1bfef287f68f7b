pub mod appointment_service;
pub mod availability_service;
pub mod catalog_service;
pub mod emergency_service;
