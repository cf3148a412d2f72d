use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::reservation::{self, ReservationStatus};
use crate::entities::trip::{self, PickupPoint, PickupPoints, TripStatus};
use crate::entities::user::{self, PaymentMethod};
use crate::entities::vehicle;
use crate::error::{AppError, AppResult};
use crate::ledger::SeatLedger;
use crate::utils::jwt::Claims;
use crate::utils::tariff::{suggest_tariff, TariffSuggestion};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct ReservationInfo {
    pub id: Uuid,
    pub passenger_id: Uuid,
    pub seats: i32,
    pub pickup_points: PickupPoints,
    pub payment_method: PaymentMethod,
    pub status: ReservationStatus,
    pub decision_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct TripResponse {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub vehicle_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub route_description: Option<String>,
    pub departure_at: DateTime<Utc>,
    pub seats_total: i32,
    pub seats_available: i32,
    pub price_per_seat: i64,
    pub pickup_points: PickupPoints,
    pub distance_km: Option<f64>,
    pub duration_minutes: Option<i32>,
    pub status: TripStatus,
    pub reservations: Vec<ReservationInfo>,
}

impl TripResponse {
    pub fn build(trip: trip::Model, reservations: Vec<reservation::Model>) -> Self {
        Self {
            id: trip.id,
            driver_id: trip.driver_id,
            vehicle_id: trip.vehicle_id,
            origin: trip.origin,
            destination: trip.destination,
            route_description: trip.route_description,
            departure_at: trip.departure_at.with_timezone(&Utc),
            seats_total: trip.seats_total,
            seats_available: trip.seats_available,
            price_per_seat: trip.price_per_seat,
            pickup_points: trip.pickup_points,
            distance_km: trip.distance_km,
            duration_minutes: trip.duration_minutes,
            status: trip.status,
            reservations: reservations
                .into_iter()
                .map(|r| ReservationInfo {
                    id: r.id,
                    passenger_id: r.passenger_id,
                    seats: r.seats,
                    pickup_points: r.pickup_points,
                    payment_method: r.payment_method,
                    status: r.status,
                    decision_at: r.decision_at.map(|d| d.with_timezone(&Utc)),
                    created_at: r.created_at.with_timezone(&Utc),
                })
                .collect(),
        }
    }
}

/// Load a trip together with its reservations for response building
pub async fn load_trip_response(
    db: &DatabaseConnection,
    trip_id: Uuid,
) -> AppResult<TripResponse> {
    let trip = trip::Entity::find_by_id(trip_id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

    let reservations = reservation::Entity::find()
        .filter(reservation::Column::TripId.eq(trip_id))
        .order_by_asc(reservation::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(TripResponse::build(trip, reservations))
}

/// Validate and normalize a list of pickup points from a request body
pub fn normalize_pickup_points(points: Vec<PickupPoint>) -> AppResult<PickupPoints> {
    let mut normalized = Vec::with_capacity(points.len());
    for point in points {
        let name = point.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::BadRequest(
                "Each pickup point requires a name".to_string(),
            ));
        }
        if !point.lat.is_finite()
            || !point.lng.is_finite()
            || !(-90.0..=90.0).contains(&point.lat)
            || !(-180.0..=180.0).contains(&point.lng)
        {
            return Err(AppError::BadRequest(
                "Pickup point coordinates out of range".to_string(),
            ));
        }
        let description = point
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        normalized.push(PickupPoint {
            name,
            description,
            lat: point.lat,
            lng: point.lng,
        });
    }
    Ok(PickupPoints(normalized))
}

// ============ Trip Creation & Discovery ============

#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    pub vehicle_id: Option<Uuid>,
    pub origin: String,
    pub destination: String,
    pub route_description: Option<String>,
    pub departure_at: DateTime<Utc>,
    pub seats_total: i32,
    pub price_per_seat: i64,
    pub pickup_points: Option<Vec<PickupPoint>>,
    pub distance_km: Option<f64>,
    pub duration_minutes: Option<i32>,
}

/// Create a new trip authored by the authenticated driver
pub async fn create_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTripRequest>,
) -> AppResult<Json<TripResponse>> {
    if payload.origin.trim().is_empty() || payload.destination.trim().is_empty() {
        return Err(AppError::BadRequest("Incomplete trip data".to_string()));
    }

    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !user.driver_mode {
        return Err(AppError::Forbidden(
            "Enable driver mode to publish trips".to_string(),
        ));
    }

    let vehicle_id = payload
        .vehicle_id
        .or(user.active_vehicle_id)
        .ok_or_else(|| {
            AppError::BadRequest("Select a vehicle with valid documents".to_string())
        })?;

    let vehicle = vehicle::Entity::find_by_id(vehicle_id)
        .filter(vehicle::Column::OwnerId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let now = Utc::now();
    if vehicle.soat_expiration.with_timezone(&Utc) < now
        || vehicle.license_expiration.with_timezone(&Utc) < now
    {
        return Err(AppError::BadRequest(
            "Update the vehicle documents before creating trips".to_string(),
        ));
    }

    if payload.departure_at < now {
        return Err(AppError::BadRequest(
            "Departure time must be in the future".to_string(),
        ));
    }

    if payload.seats_total < 1 {
        return Err(AppError::BadRequest("Invalid seat count".to_string()));
    }
    if payload.seats_total > vehicle.capacity {
        return Err(AppError::BadRequest(
            "Seat count exceeds the vehicle capacity".to_string(),
        ));
    }

    if payload.price_per_seat < 0 {
        return Err(AppError::BadRequest("Invalid price per seat".to_string()));
    }

    if let Some(km) = payload.distance_km {
        if !km.is_finite() || km < 0.0 {
            return Err(AppError::BadRequest("Invalid distance".to_string()));
        }
    }
    if let Some(minutes) = payload.duration_minutes {
        if minutes < 0 {
            return Err(AppError::BadRequest("Invalid duration".to_string()));
        }
    }

    let pickup_points = normalize_pickup_points(payload.pickup_points.unwrap_or_default())?;

    let trip_id = Uuid::new_v4();
    let new_trip = trip::ActiveModel {
        id: Set(trip_id),
        driver_id: Set(claims.sub),
        vehicle_id: Set(vehicle.id),
        origin: Set(payload.origin.trim().to_string()),
        destination: Set(payload.destination.trim().to_string()),
        route_description: Set(payload
            .route_description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty())),
        departure_at: Set(payload.departure_at.into()),
        seats_total: Set(payload.seats_total),
        seats_available: Set(payload.seats_total),
        price_per_seat: Set(payload.price_per_seat),
        pickup_points: Set(pickup_points),
        distance_km: Set(payload.distance_km),
        duration_minutes: Set(payload.duration_minutes),
        status: Set(TripStatus::Scheduled),
        ..Default::default()
    };

    let trip = new_trip.insert(&state.db).await?;

    Ok(Json(TripResponse::build(trip, Vec::new())))
}

#[derive(Debug, Deserialize)]
pub struct ListTripsQuery {
    pub departure_point: Option<String>,
    pub min_seats: Option<i32>,
    pub max_price: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct AvailableTripResponse {
    pub id: Uuid,
    pub driver_id: Uuid,
    pub origin: String,
    pub destination: String,
    pub route_description: Option<String>,
    pub departure_at: DateTime<Utc>,
    pub seats_total: i32,
    pub seats_available: i32,
    pub price_per_seat: i64,
    pub pickup_points: PickupPoints,
    pub distance_km: Option<f64>,
    pub duration_minutes: Option<i32>,
    pub status: TripStatus,
}

fn to_available_trip(trip: trip::Model) -> AvailableTripResponse {
    AvailableTripResponse {
        id: trip.id,
        driver_id: trip.driver_id,
        origin: trip.origin,
        destination: trip.destination,
        route_description: trip.route_description,
        departure_at: trip.departure_at.with_timezone(&Utc),
        seats_total: trip.seats_total,
        seats_available: trip.seats_available,
        price_per_seat: trip.price_per_seat,
        pickup_points: trip.pickup_points,
        distance_km: trip.distance_km,
        duration_minutes: trip.duration_minutes,
        status: trip.status,
    }
}

/// List open trips with optional filters for passengers
pub async fn list_trips(
    State(state): State<AppState>,
    Query(query): Query<ListTripsQuery>,
) -> AppResult<Json<Vec<AvailableTripResponse>>> {
    let mut select = trip::Entity::find()
        .filter(trip::Column::Status.is_in([TripStatus::Scheduled, TripStatus::Full]))
        .order_by_asc(trip::Column::DepartureAt);

    if let Some(departure_point) = query.departure_point.filter(|s| !s.trim().is_empty()) {
        select = select.filter(trip::Column::Origin.contains(departure_point.trim()));
    }
    if let Some(min_seats) = query.min_seats {
        select = select.filter(trip::Column::SeatsAvailable.gte(min_seats));
    }
    if let Some(max_price) = query.max_price {
        select = select.filter(trip::Column::PricePerSeat.lte(max_price));
    }

    let trips = select.all(&state.db).await?;

    Ok(Json(trips.into_iter().map(to_available_trip).collect()))
}

/// Get trip details
pub async fn get_trip(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<AvailableTripResponse>> {
    let trip = trip::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

    Ok(Json(to_available_trip(trip)))
}

// ============ Driver Views ============

#[derive(Debug, Serialize)]
pub struct PassengerContact {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct TripPassengerInfo {
    pub reservation_id: Uuid,
    pub passenger: Option<PassengerContact>,
    pub seats: i32,
    pub pickup_points: PickupPoints,
    pub payment_method: PaymentMethod,
    pub status: ReservationStatus,
    pub decision_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Driver views the reservations and pickup points on their trip
pub async fn trip_passengers(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Vec<TripPassengerInfo>>> {
    let trip = trip::Entity::find_by_id(id)
        .filter(trip::Column::DriverId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

    let reservations = reservation::Entity::find()
        .filter(reservation::Column::TripId.eq(trip.id))
        .order_by_asc(reservation::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let users = user::Entity::find().all(&state.db).await?;

    let passengers: Vec<TripPassengerInfo> = reservations
        .into_iter()
        .map(|r| {
            let passenger = users.iter().find(|u| u.id == r.passenger_id).map(|u| {
                PassengerContact {
                    id: u.id,
                    first_name: u.first_name.clone(),
                    last_name: u.last_name.clone(),
                    phone: u.phone.clone(),
                    email: u.email.clone(),
                }
            });
            TripPassengerInfo {
                reservation_id: r.id,
                passenger,
                seats: r.seats,
                pickup_points: r.pickup_points,
                payment_method: r.payment_method,
                status: r.status,
                decision_at: r.decision_at.map(|d| d.with_timezone(&Utc)),
                created_at: r.created_at.with_timezone(&Utc),
            }
        })
        .collect();

    Ok(Json(passengers))
}

// ============ Trip Cancellation ============

/// Driver cancels the whole trip: seats go to zero and every reservation is
/// forced to cancelled, no matter its prior state.
pub async fn cancel_trip(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<TripResponse>> {
    let trip = trip::Entity::find_by_id(id)
        .filter(trip::Column::DriverId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Trip not found".to_string()))?;

    if trip.status == TripStatus::Cancelled {
        return Ok(Json(load_trip_response(&state.db, id).await?));
    }
    if trip.status == TripStatus::Completed {
        return Err(AppError::BadRequest("Trip already completed".to_string()));
    }

    let mut ledger = SeatLedger::from_trip(&trip);
    ledger.close();

    let txn = state.db.begin().await?;

    let mut active: trip::ActiveModel = trip.into();
    active.status = Set(ledger.status);
    active.seats_available = Set(ledger.seats_available);
    active.update(&txn).await?;

    reservation::Entity::update_many()
        .set(reservation::ActiveModel {
            status: Set(ReservationStatus::Cancelled),
            ..Default::default()
        })
        .filter(reservation::Column::TripId.eq(id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(trip_id = %id, "trip cancelled by driver");

    Ok(Json(load_trip_response(&state.db, id).await?))
}

// ============ Tariff Suggestion ============

#[derive(Debug, Deserialize)]
pub struct TariffRequest {
    pub distance_km: f64,
    pub duration_minutes: f64,
    pub demand_factor: Option<f64>,
}

/// Suggest a per-seat fare for a planned trip
pub async fn tariff_suggest(
    Json(payload): Json<TariffRequest>,
) -> AppResult<Json<TariffSuggestion>> {
    if !payload.distance_km.is_finite() || payload.distance_km < 0.0 {
        return Err(AppError::BadRequest(
            "distance_km must be a number greater than or equal to 0".to_string(),
        ));
    }
    if !payload.duration_minutes.is_finite() || payload.duration_minutes < 0.0 {
        return Err(AppError::BadRequest(
            "duration_minutes must be a number greater than or equal to 0".to_string(),
        ));
    }

    Ok(Json(suggest_tariff(
        payload.distance_km,
        payload.duration_minutes,
        payload.demand_factor,
    )))
}
