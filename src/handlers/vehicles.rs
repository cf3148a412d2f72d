use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::{user, vehicle};
use crate::error::{AppError, AppResult};
use crate::utils::jwt::Claims;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    pub plate: String,
    pub brand: String,
    pub model: String,
    pub capacity: i32,
    pub vehicle_photo_url: Option<String>,
    pub soat_photo_url: Option<String>,
    pub soat_expiration: DateTime<Utc>,
    pub license_number: String,
    pub license_expiration: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateVehicleRequest {
    pub plate: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub capacity: Option<i32>,
    pub vehicle_photo_url: Option<String>,
    pub soat_photo_url: Option<String>,
    pub soat_expiration: Option<DateTime<Utc>>,
    pub license_number: Option<String>,
    pub license_expiration: Option<DateTime<Utc>>,
}

/// Register a vehicle under the authenticated user. The first vehicle turns
/// on driver mode and becomes the active vehicle for trip creation.
pub async fn create_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateVehicleRequest>,
) -> AppResult<Json<vehicle::Model>> {
    let plate = payload.plate.trim().to_uppercase();

    if plate.is_empty()
        || payload.brand.trim().is_empty()
        || payload.model.trim().is_empty()
        || payload.license_number.trim().is_empty()
    {
        return Err(AppError::BadRequest("Incomplete vehicle data".to_string()));
    }

    if payload.capacity < 1 || payload.capacity > 8 {
        return Err(AppError::BadRequest(
            "Vehicle capacity must be between 1 and 8".to_string(),
        ));
    }

    let now = Utc::now();
    if payload.soat_expiration < now {
        return Err(AppError::BadRequest("SOAT document has expired".to_string()));
    }
    if payload.license_expiration < now {
        return Err(AppError::BadRequest("Driving licence has expired".to_string()));
    }

    // Check for a duplicate plate
    let existing = vehicle::Entity::find()
        .filter(vehicle::Column::Plate.eq(&plate))
        .one(&state.db)
        .await?;

    if existing.is_some() {
        return Err(AppError::Conflict("Plate already registered".to_string()));
    }

    let vehicle_id = Uuid::new_v4();
    let new_vehicle = vehicle::ActiveModel {
        id: Set(vehicle_id),
        owner_id: Set(claims.sub),
        plate: Set(plate),
        brand: Set(payload.brand.trim().to_string()),
        model: Set(payload.model.trim().to_string()),
        capacity: Set(payload.capacity),
        vehicle_photo_url: Set(payload.vehicle_photo_url),
        soat_photo_url: Set(payload.soat_photo_url),
        soat_expiration: Set(payload.soat_expiration.into()),
        license_number: Set(payload.license_number.trim().to_string()),
        license_expiration: Set(payload.license_expiration.into()),
        ..Default::default()
    };

    let vehicle = new_vehicle.insert(&state.db).await?;

    // Registering a vehicle enables driver mode
    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user.clone().into();
    active.driver_mode = Set(true);
    if user.active_vehicle_id.is_none() {
        active.active_vehicle_id = Set(Some(vehicle.id));
    }
    active.update(&state.db).await?;

    Ok(Json(vehicle))
}

/// List vehicles belonging to the authenticated user
pub async fn my_vehicles(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> AppResult<Json<Vec<vehicle::Model>>> {
    let vehicles = vehicle::Entity::find()
        .filter(vehicle::Column::OwnerId.eq(claims.sub))
        .order_by_asc(vehicle::Column::CreatedAt)
        .all(&state.db)
        .await?;

    Ok(Json(vehicles))
}

/// Update a vehicle if it belongs to the user
pub async fn update_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVehicleRequest>,
) -> AppResult<Json<vehicle::Model>> {
    let vehicle = vehicle::Entity::find_by_id(id)
        .filter(vehicle::Column::OwnerId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let mut active: vehicle::ActiveModel = vehicle.into();

    if let Some(plate) = payload.plate {
        let plate = plate.trim().to_uppercase();
        if plate.is_empty() {
            return Err(AppError::BadRequest("Invalid plate".to_string()));
        }

        let duplicate = vehicle::Entity::find()
            .filter(vehicle::Column::Plate.eq(&plate))
            .filter(vehicle::Column::Id.ne(id))
            .one(&state.db)
            .await?;
        if duplicate.is_some() {
            return Err(AppError::Conflict("Plate already registered".to_string()));
        }

        active.plate = Set(plate);
    }

    if let Some(brand) = payload.brand {
        active.brand = Set(brand.trim().to_string());
    }

    if let Some(model) = payload.model {
        active.model = Set(model.trim().to_string());
    }

    if let Some(capacity) = payload.capacity {
        if !(1..=8).contains(&capacity) {
            return Err(AppError::BadRequest(
                "Vehicle capacity must be between 1 and 8".to_string(),
            ));
        }
        active.capacity = Set(capacity);
    }

    if let Some(url) = payload.vehicle_photo_url {
        active.vehicle_photo_url = Set(Some(url));
    }

    if let Some(url) = payload.soat_photo_url {
        active.soat_photo_url = Set(Some(url));
    }

    if let Some(soat) = payload.soat_expiration {
        if soat < Utc::now() {
            return Err(AppError::BadRequest("SOAT document has expired".to_string()));
        }
        active.soat_expiration = Set(soat.into());
    }

    if let Some(number) = payload.license_number {
        active.license_number = Set(number.trim().to_string());
    }

    if let Some(license) = payload.license_expiration {
        if license < Utc::now() {
            return Err(AppError::BadRequest("Driving licence has expired".to_string()));
        }
        active.license_expiration = Set(license.into());
    }

    let result = active.update(&state.db).await?;
    Ok(Json(result))
}

/// Delete a vehicle and recompute the owner's driver state
pub async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<serde_json::Value>> {
    let vehicle = vehicle::Entity::find_by_id(id)
        .filter(vehicle::Column::OwnerId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    vehicle::Entity::delete_by_id(vehicle.id)
        .exec(&state.db)
        .await?;

    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let remaining = vehicle::Entity::find()
        .filter(vehicle::Column::OwnerId.eq(claims.sub))
        .order_by_asc(vehicle::Column::CreatedAt)
        .all(&state.db)
        .await?;

    let mut active: user::ActiveModel = user.clone().into();
    if remaining.is_empty() {
        // No vehicles left: the user is a passenger again
        active.driver_mode = Set(false);
        active.active_vehicle_id = Set(None);
        active.update(&state.db).await?;
    } else if user.active_vehicle_id.is_none() || user.active_vehicle_id == Some(vehicle.id) {
        // Promote the oldest vehicle with valid documents, or the oldest overall
        let now = Utc::now();
        let next = remaining
            .iter()
            .find(|v| {
                v.soat_expiration.with_timezone(&Utc) >= now
                    && v.license_expiration.with_timezone(&Utc) >= now
            })
            .or_else(|| remaining.first());
        active.active_vehicle_id = Set(next.map(|v| v.id));
        active.update(&state.db).await?;
    }

    Ok(Json(serde_json::json!({ "message": "Vehicle deleted" })))
}

#[derive(Debug, Serialize)]
pub struct ActivateVehicleResponse {
    pub active_vehicle_id: Uuid,
    pub vehicle: vehicle::Model,
}

/// Mark the selected vehicle as the active vehicle for future trips
pub async fn activate_vehicle(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ActivateVehicleResponse>> {
    let vehicle = vehicle::Entity::find_by_id(id)
        .filter(vehicle::Column::OwnerId.eq(claims.sub))
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Vehicle not found".to_string()))?;

    let now = Utc::now();
    if vehicle.soat_expiration.with_timezone(&Utc) < now
        || vehicle.license_expiration.with_timezone(&Utc) < now
    {
        return Err(AppError::BadRequest(
            "Update the vehicle documents before activating it".to_string(),
        ));
    }

    let user = user::Entity::find_by_id(claims.sub)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user.into();
    active.driver_mode = Set(true);
    active.active_vehicle_id = Set(Some(vehicle.id));
    active.update(&state.db).await?;

    Ok(Json(ActivateVehicleResponse {
        active_vehicle_id: vehicle.id,
        vehicle,
    }))
}
