use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        appointments::{
            AppointmentList, CancelAppointmentRequest, CompleteAppointmentRequest,
            CreateAppointmentRequest, EmergencyCancelRequest, EmergencyCancelResult,
            UpdateAppointmentRequest, WalkInRequest,
        },
        availability::{AvailabilityQuery, DayAvailability},
    },
    models::{Appointment, CancelledBy, CompletedBy, ProductUsed, Role, Status, TimeSlot},
    response::{ApiResponse, Meta},
    routes::{appointments, availability, health, params},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        availability::get_availability,
        appointments::list_appointments,
        appointments::create_appointment,
        appointments::get_appointment,
        appointments::update_appointment,
        appointments::cancel_appointment,
        appointments::complete_appointment,
        appointments::create_walk_in,
        appointments::emergency_cancel
    ),
    components(
        schemas(
            Appointment,
            Status,
            Role,
            CancelledBy,
            CompletedBy,
            ProductUsed,
            TimeSlot,
            DayAvailability,
            AvailabilityQuery,
            AppointmentList,
            CreateAppointmentRequest,
            UpdateAppointmentRequest,
            CancelAppointmentRequest,
            CompleteAppointmentRequest,
            WalkInRequest,
            EmergencyCancelRequest,
            EmergencyCancelResult,
            params::Pagination,
            params::AppointmentListQuery,
            Meta,
            ApiResponse<Appointment>,
            ApiResponse<AppointmentList>,
            ApiResponse<DayAvailability>,
            ApiResponse<EmergencyCancelResult>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Availability", description = "Barber day grids"),
        (name = "Appointments", description = "Booking and lifecycle endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
