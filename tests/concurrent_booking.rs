use chrono::{Days, Utc};
use salon_booking_api::{
    db::{create_orm_conn, create_pool, run_migrations},
    dto::appointments::{
        CancelAppointmentRequest, CompleteAppointmentRequest, CreateAppointmentRequest,
        UpdateAppointmentRequest,
    },
    middleware::auth::AuthUser,
    models::{Role, Status},
    services::{appointment_service, availability_service},
    state::AppState,
};
use salon_booking_api::entity::{
    operating_hours::ActiveModel as HoursActive, salons::ActiveModel as SalonActive,
    services::ActiveModel as ServiceActive, users::ActiveModel as UserActive,
    work_schedules::ActiveModel as ScheduleActive,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

// Concurrency behavior of the booking core: the no-overlap invariant must
// hold when writes race, and a racing pair of status transitions must leave
// exactly one terminal state. Each test seeds its own fixtures with fresh
// ids, so the tests are independent of each other and of other test
// binaries sharing the database.

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn simultaneous_bookings_for_one_slot_admit_exactly_one() -> anyhow::Result<()> {
    let Some(state) = connect().await? else {
        return Ok(());
    };
    let f = seed(&state).await?;
    let date = future_date(10);
    let customer = auth(f.customer_id, Role::Customer);
    let rival = auth(f.second_customer_id, Role::Customer);

    let first = {
        let state = state.clone();
        let customer = customer.clone();
        let payload = booking_request(&f, date, "10:00");
        tokio::spawn(async move {
            appointment_service::create_appointment(&state, &customer, payload).await
        })
    };
    let second = {
        let state = state.clone();
        let rival = rival.clone();
        let payload = booking_request(&f, date, "10:00");
        tokio::spawn(async move {
            appointment_service::create_appointment(&state, &rival, payload).await
        })
    };
    let (first, second) = tokio::join!(first, second);
    let results = [first?, second?];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results
        .into_iter()
        .find_map(|r| r.err())
        .expect("one booking must lose the slot");
    assert_eq!(loser.kind(), "slot_conflict");

    // The grid agrees: exactly one cell is booked.
    let availability =
        availability_service::get_availability(&state, f.barber_id, f.salon_id, date)
            .await?
            .data
            .unwrap();
    let booked: Vec<_> = availability.slots.iter().filter(|s| s.is_booked).collect();
    assert_eq!(booked.len(), 1);
    assert_eq!(booked[0].start_time, "10:00");

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn reschedule_racing_a_booking_admits_exactly_one() -> anyhow::Result<()> {
    let Some(state) = connect().await? else {
        return Ok(());
    };
    let f = seed(&state).await?;
    let date = future_date(11);
    let customer = auth(f.customer_id, Role::Customer);
    let rival = auth(f.second_customer_id, Role::Customer);

    let existing = appointment_service::create_appointment(
        &state,
        &customer,
        booking_request(&f, date, "10:00"),
    )
    .await?
    .data
    .unwrap();

    let reschedule = {
        let state = state.clone();
        let customer = customer.clone();
        let id = existing.id;
        tokio::spawn(async move {
            appointment_service::update_appointment(
                &state,
                &customer,
                id,
                UpdateAppointmentRequest {
                    start_time: Some("12:00".into()),
                    end_time: Some("12:30".into()),
                    ..Default::default()
                },
            )
            .await
        })
    };
    let create = {
        let state = state.clone();
        let rival = rival.clone();
        let payload = booking_request(&f, date, "12:00");
        tokio::spawn(async move {
            appointment_service::create_appointment(&state, &rival, payload).await
        })
    };
    let (reschedule, create) = tokio::join!(reschedule, create);
    let reschedule = reschedule?;
    let create = create?;

    assert!(reschedule.is_ok() != create.is_ok());
    if let Err(err) = &reschedule {
        assert_eq!(err.kind(), "slot_conflict");
    }
    if let Err(err) = &create {
        assert_eq!(err.kind(), "slot_conflict");
    }

    // Whoever won, 12:00 is held exactly once.
    let availability =
        availability_service::get_availability(&state, f.barber_id, f.salon_id, date)
            .await?
            .data
            .unwrap();
    let noon_holders: Vec<_> = availability
        .slots
        .iter()
        .filter(|s| s.start_time == "12:00" && s.is_booked)
        .collect();
    assert_eq!(noon_holders.len(), 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn racing_transitions_leave_one_terminal_state() -> anyhow::Result<()> {
    let Some(state) = connect().await? else {
        return Ok(());
    };
    let f = seed(&state).await?;
    let date = future_date(12);
    let customer = auth(f.customer_id, Role::Customer);
    let barber = auth(f.barber_id, Role::Barber);

    let appointment = appointment_service::create_appointment(
        &state,
        &customer,
        booking_request(&f, date, "09:00"),
    )
    .await?
    .data
    .unwrap();

    // A customer cancel races the barber completing the same appointment.
    // Both read pending; only one transition may land, and the loser's guard
    // must see the winner's terminal state.
    let cancel = {
        let state = state.clone();
        let customer = customer.clone();
        let id = appointment.id;
        tokio::spawn(async move {
            appointment_service::cancel_appointment(
                &state,
                &customer,
                id,
                CancelAppointmentRequest::default(),
            )
            .await
        })
    };
    let complete = {
        let state = state.clone();
        let barber = barber.clone();
        let id = appointment.id;
        tokio::spawn(async move {
            appointment_service::complete_appointment(
                &state,
                &barber,
                id,
                CompleteAppointmentRequest::default(),
            )
            .await
        })
    };
    let (cancel, complete) = tokio::join!(cancel, complete);
    let cancel = cancel?;
    let complete = complete?;

    assert!(cancel.is_ok() != complete.is_ok());
    if let Err(err) = &cancel {
        assert_eq!(err.kind(), "invalid_transition");
    }
    if let Err(err) = &complete {
        assert_eq!(err.kind(), "invalid_transition");
    }

    let expected = if cancel.is_ok() {
        Status::Cancelled
    } else {
        Status::Completed
    };
    let final_state = appointment_service::get_appointment(&state, &customer, appointment.id)
        .await?
        .data
        .unwrap();
    assert_eq!(final_state.status, expected);

    Ok(())
}

struct Fixtures {
    customer_id: Uuid,
    second_customer_id: Uuid,
    barber_id: Uuid,
    salon_id: Uuid,
    service_id: Uuid,
}

fn auth(user_id: Uuid, role: Role) -> AuthUser {
    AuthUser {
        user_id,
        role,
        managed_salon_ids: Vec::new(),
    }
}

fn future_date(days: u64) -> chrono::NaiveDate {
    Utc::now()
        .date_naive()
        .checked_add_days(Days::new(days))
        .expect("valid future date")
}

fn booking_request(f: &Fixtures, date: chrono::NaiveDate, start: &str) -> CreateAppointmentRequest {
    CreateAppointmentRequest {
        barber_id: f.barber_id,
        service_id: f.service_id,
        salon_id: f.salon_id,
        date,
        start_time: start.into(),
        end_time: None,
    }
}

async fn connect() -> anyhow::Result<Option<AppState>> {
    let database_url = match std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
    {
        Ok(url) => url,
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            return Ok(None);
        }
    };
    let pool = create_pool(&database_url).await?;
    let orm = create_orm_conn(&database_url).await?;
    run_migrations(&orm).await?;
    Ok(Some(AppState::new(pool, orm)))
}

async fn seed(state: &AppState) -> anyhow::Result<Fixtures> {
    let customer_id = create_user(state, "customer", "Ada").await?;
    let second_customer_id = create_user(state, "customer", "Grace").await?;
    let barber_id = create_user(state, "barber", "Sam").await?;

    let salon = SalonActive {
        id: Set(Uuid::new_v4()),
        name: Set("Riverside".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let service = ServiceActive {
        id: Set(Uuid::new_v4()),
        name: Set("Haircut".into()),
        price: Set(2500),
        duration_minutes: Set(30),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    for weekday in 0..7 {
        ScheduleActive {
            id: Set(Uuid::new_v4()),
            barber_id: Set(barber_id),
            weekday: Set(weekday),
            start_time: Set("09:00".into()),
            end_time: Set("18:00".into()),
            is_working: Set(true),
        }
        .insert(&state.orm)
        .await?;

        HoursActive {
            id: Set(Uuid::new_v4()),
            salon_id: Set(salon.id),
            weekday: Set(weekday),
            start_time: Set("09:00".into()),
            end_time: Set("18:00".into()),
            is_open: Set(true),
        }
        .insert(&state.orm)
        .await?;
    }

    Ok(Fixtures {
        customer_id,
        second_customer_id,
        barber_id,
        salon_id: salon.id,
        service_id: service.id,
    })
}

async fn create_user(state: &AppState, role: &str, name: &str) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        name: Set(name.to_string()),
        email: Set(format!("{}@example.com", Uuid::new_v4())),
        role: Set(role.to_string()),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}
