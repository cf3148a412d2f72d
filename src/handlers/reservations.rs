use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::entities::reservation::{self, ReservationStatus};
use crate::entities::trip::{self, PickupPoint, TripStatus};
use crate::entities::user::PaymentMethod;
use crate::error::{AppError, AppResult};
use crate::handlers::trips::{load_trip_response, normalize_pickup_points, TripResponse};
use crate::ledger::{self, SeatLedger, Transition};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub seats: i32,
    pub pickup_points: Vec<PickupPoint>,
    pub payment_method: Option<PaymentMethod>,
}

/// Passenger books seats on a trip.
///
/// The seat decrement and the reservation insert commit together: the trip
/// row is locked for the duration of the transaction, so two passengers
/// racing for the last seats can never both succeed.
pub async fn create_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(trip_id): Path<Uuid>,
    Json(payload): Json<CreateReservationRequest>,
) -> AppResult<Json<TripResponse>> {
    if payload.seats < 1 {
        return Err(AppError::BadRequest("Invalid seat count".to_string()));
    }
    if payload.pickup_points.len() != payload.seats as usize {
        return Err(AppError::BadRequest(
            "A pickup point is required for each seat".to_string(),
        ));
    }
    let pickup_points = normalize_pickup_points(payload.pickup_points)?;

    let txn = state.db.begin().await?;

    let trip = trip::Entity::find_by_id(trip_id)
        .lock_exclusive()
        .one(&txn)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

    if trip.driver_id == claims.sub {
        return Err(AppError::BadRequest(
            "You cannot reserve your own trip".to_string(),
        ));
    }

    let mut ledger = SeatLedger::from_trip(&trip);
    ledger.reserve(payload.seats)?;

    let existing = reservation::Entity::find()
        .filter(reservation::Column::TripId.eq(trip_id))
        .filter(reservation::Column::PassengerId.eq(claims.sub))
        .filter(
            reservation::Column::Status
                .is_in([ReservationStatus::Pending, ReservationStatus::Confirmed]),
        )
        .one(&txn)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict(
            "You already have an active reservation for this trip".to_string(),
        ));
    }

    let reservation_id = Uuid::new_v4();
    let new_reservation = reservation::ActiveModel {
        id: Set(reservation_id),
        trip_id: Set(trip.id),
        passenger_id: Set(claims.sub),
        seats: Set(payload.seats),
        pickup_points: Set(pickup_points),
        payment_method: Set(payload.payment_method.unwrap_or(PaymentMethod::Cash)),
        status: Set(ReservationStatus::Pending),
        decision_at: Set(None),
        ..Default::default()
    };
    new_reservation.insert(&txn).await?;

    let mut active: trip::ActiveModel = trip.into();
    active.seats_available = Set(ledger.seats_available);
    active.status = Set(ledger.status);
    active.update(&txn).await?;

    txn.commit().await?;

    tracing::debug!(trip_id = %trip_id, reservation_id = %reservation_id, "reservation created");

    Ok(Json(load_trip_response(&state.db, trip_id).await?))
}

/// Driver-scoped trip lookup: reservations are managed through the trip, so a
/// trip that isn't the caller's is simply not found.
async fn find_driver_trip<C: sea_orm::ConnectionTrait>(
    conn: &C,
    trip_id: Uuid,
    driver_id: Uuid,
) -> AppResult<trip::Model> {
    trip::Entity::find_by_id(trip_id)
        .filter(trip::Column::DriverId.eq(driver_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))
}

async fn find_reservation<C: sea_orm::ConnectionTrait>(
    conn: &C,
    trip_id: Uuid,
    reservation_id: Uuid,
) -> AppResult<reservation::Model> {
    reservation::Entity::find_by_id(reservation_id)
        .filter(reservation::Column::TripId.eq(trip_id))
        .one(conn)
        .await?
        .ok_or_else(|| AppError::NotFound("Reservation not found".to_string()))
}

/// Driver confirms a pending reservation. Seats were already taken when the
/// reservation was created, so only the reservation state changes here.
pub async fn confirm_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((trip_id, reservation_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<TripResponse>> {
    let trip = find_driver_trip(&state.db, trip_id, claims.sub).await?;
    let reservation = find_reservation(&state.db, trip_id, reservation_id).await?;

    match ledger::confirm_transition(&reservation.status)? {
        Transition::Noop => {}
        Transition::Apply => {
            if trip.status == TripStatus::Completed {
                return Err(AppError::BadRequest("Trip already completed".to_string()));
            }

            let mut active: reservation::ActiveModel = reservation.into();
            active.status = Set(ReservationStatus::Confirmed);
            active.decision_at = Set(Some(Utc::now().into()));
            active.update(&state.db).await?;

            // Confirmation doesn't touch seat counts, but re-derive the trip
            // status anyway in case the counter and status ever disagree.
            let next = ledger::derive_status(trip.seats_available, trip.status.clone());
            if next != trip.status {
                let mut active: trip::ActiveModel = trip.into();
                active.status = Set(next);
                active.update(&state.db).await?;
            }
        }
    }

    Ok(Json(load_trip_response(&state.db, trip_id).await?))
}

/// Driver rejects a pending reservation and its seats return to the pool.
pub async fn reject_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((trip_id, reservation_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<TripResponse>> {
    let trip = find_driver_trip(&state.db, trip_id, claims.sub).await?;
    let reservation = find_reservation(&state.db, trip_id, reservation_id).await?;

    match ledger::reject_transition(&reservation.status)? {
        Transition::Noop => {}
        Transition::Apply => {
            if trip.status == TripStatus::Completed {
                return Err(AppError::BadRequest("Trip already completed".to_string()));
            }

            release_seats(
                &state,
                trip,
                reservation,
                ReservationStatus::Rejected,
            )
            .await?;
        }
    }

    Ok(Json(load_trip_response(&state.db, trip_id).await?))
}

/// The driver or the reservation's own passenger cancels a reservation.
pub async fn cancel_reservation(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((trip_id, reservation_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<TripResponse>> {
    let trip = trip::Entity::find_by_id(trip_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;
    let reservation = find_reservation(&state.db, trip_id, reservation_id).await?;

    let is_driver = trip.driver_id == claims.sub;
    let is_passenger = reservation.passenger_id == claims.sub;
    if !is_driver && !is_passenger {
        return Err(AppError::Forbidden("Not authorized".to_string()));
    }

    match ledger::cancel_transition(&reservation.status) {
        Transition::Noop => {}
        Transition::Apply => {
            if trip.status == TripStatus::Completed {
                return Err(AppError::BadRequest("Trip already completed".to_string()));
            }

            release_seats(
                &state,
                trip,
                reservation,
                ReservationStatus::Cancelled,
            )
            .await?;
        }
    }

    Ok(Json(load_trip_response(&state.db, trip_id).await?))
}

/// Move a live reservation into a terminal state and return its seats to the
/// trip. Both rows change in one transaction so the capacity invariant holds
/// for every reader.
async fn release_seats(
    state: &AppState,
    trip: trip::Model,
    reservation: reservation::Model,
    terminal: ReservationStatus,
) -> AppResult<()> {
    let mut ledger = SeatLedger::from_trip(&trip);
    ledger.release(reservation.seats);

    let txn = state.db.begin().await?;

    let mut active: reservation::ActiveModel = reservation.into();
    active.status = Set(terminal);
    active.decision_at = Set(Some(Utc::now().into()));
    active.update(&txn).await?;

    let mut active: trip::ActiveModel = trip.into();
    active.seats_available = Set(ledger.seats_available);
    active.status = Set(ledger.status);
    active.update(&txn).await?;

    txn.commit().await?;

    Ok(())
}
