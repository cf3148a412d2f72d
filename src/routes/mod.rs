use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers::{auth, reservations, trips, vehicles};
use crate::middleware::auth::auth_middleware;
use crate::middleware::rate_limit::{create_public_governor, create_user_governor};
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    // Per-user governor for authenticated routes, per-IP for public ones
    let user_governor = create_user_governor();
    let public_governor = create_public_governor();

    // Public routes (with IP-based rate limiting)
    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .layer(public_governor.clone());

    let tariff_routes = Router::new()
        .route("/suggest", post(trips::tariff_suggest))
        .layer(public_governor);

    // Vehicle routes (requires auth)
    let vehicle_routes = Router::new()
        .route("/", post(vehicles::create_vehicle))
        .route("/", get(vehicles::my_vehicles))
        .route("/{id}", put(vehicles::update_vehicle))
        .route("/{id}", delete(vehicles::delete_vehicle))
        .route("/{id}/activate", put(vehicles::activate_vehicle))
        .layer(user_governor.clone())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Trip routes: creation, cancellation, and the reservation lifecycle
    // require auth; browsing stays public, so the auth layers are applied
    // with route_layer before the public routes are added.
    let trip_routes = Router::new()
        .route("/", post(trips::create_trip))
        .route("/{id}/cancel", put(trips::cancel_trip))
        .route("/{id}/passengers", get(trips::trip_passengers))
        .route("/{id}/reservations", post(reservations::create_reservation))
        .route(
            "/{id}/reservations/{reservation_id}/confirm",
            put(reservations::confirm_reservation),
        )
        .route(
            "/{id}/reservations/{reservation_id}/reject",
            put(reservations::reject_reservation),
        )
        .route(
            "/{id}/reservations/{reservation_id}/cancel",
            put(reservations::cancel_reservation),
        )
        .route_layer(user_governor)
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        // Public trip browsing (covered by the global rate limiter)
        .route("/", get(trips::list_trips))
        .route("/{id}", get(trips::get_trip));

    // Combine all routes
    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/tariff", tariff_routes)
        .nest("/api/vehicles", vehicle_routes)
        .nest("/api/trips", trip_routes)
        .with_state(state)
}
