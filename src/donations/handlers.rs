use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        extractors::AuthUser,
        repo_types::{Role, Viewer},
    },
    error::ApiError,
    state::AppState,
};

use super::dto::{CreateDonationRequest, DonationView, ListQuery, StatusUpdateRequest};
use super::repo_types::{DonationStatus, NewDonation};
use super::services::{is_visible_to, stats_for, viewer_party, visible_donations, Stats};
use super::tracker::ListFilter;

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/donations", get(list_donations))
        .route("/donations/:id", get(get_donation))
        .route("/stats", get(get_stats))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/donations", post(create_donation))
        .route("/donations/:id/status", patch(update_status))
}

fn require_role(viewer: &Viewer, role: Role, action: &str) -> Result<(), ApiError> {
    if viewer.role != role {
        warn!(user_id = %viewer.user_id, role = ?viewer.role, action, "role not allowed");
        return Err(ApiError::Forbidden(format!("{action} is not allowed for this account")));
    }
    Ok(())
}

/// Ids are opaque to callers; anything that is not one of ours is not found.
fn donation_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::NotFound(format!("donation {raw} not found")))
}

fn parse_status_filter(raw: Option<&str>) -> Result<Option<DonationStatus>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("ALL") => Ok(None),
        Some(s) => s
            .parse::<DonationStatus>()
            .map(Some)
            .map_err(|e| ApiError::InvalidInput(e.to_string())),
    }
}

// --- handlers ---

/// POST /donations
#[instrument(skip(state, payload))]
pub async fn create_donation(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    payload: Result<Json<CreateDonationRequest>, JsonRejection>,
) -> Result<(StatusCode, [(header::HeaderName, String); 1], Json<DonationView>), ApiError> {
    require_role(&viewer, Role::Restaurant, "creating donations")?;
    let Json(body) = payload?;

    let donation = state.tracker.create(NewDonation {
        restaurant: viewer_party(&viewer),
        food_type: body.food_type,
        quantity_meals: body.quantity_meals,
        freshness_window: body.freshness_window,
        notes: body.notes,
        image_url: body.image_url,
    })?;

    let location = format!("/api/v1/donations/{}", donation.id);
    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, location)],
        Json(DonationView::project(donation, &viewer)),
    ))
}

/// GET /donations?status=&q=
#[instrument(skip(state))]
pub async fn list_donations(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<DonationView>>, ApiError> {
    let Query(query) = query?;
    let filter = ListFilter {
        query: query.q,
        status: parse_status_filter(query.status.as_deref())?,
    };
    let items = visible_donations(&state.tracker, &viewer, &filter)
        .into_iter()
        .map(|d| DonationView::project(d, &viewer))
        .collect();
    Ok(Json(items))
}

#[instrument(skip(state))]
pub async fn get_donation(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    id: Result<Path<String>, PathRejection>,
) -> Result<Json<DonationView>, ApiError> {
    let Path(raw) = id?;
    let id = donation_id(&raw)?;
    let donation = state.tracker.get(id)?;
    if !is_visible_to(&donation, &viewer) {
        return Err(ApiError::NotFound(format!("donation {id} not found")));
    }
    Ok(Json(DonationView::project(donation, &viewer)))
}

/// PATCH /donations/:id/status
#[instrument(skip(state, payload))]
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
    id: Result<Path<String>, PathRejection>,
    payload: Result<Json<StatusUpdateRequest>, JsonRejection>,
) -> Result<Json<DonationView>, ApiError> {
    require_role(&viewer, Role::Ngo, "changing donation status")?;
    let Path(raw) = id?;
    let Json(body) = payload?;
    let id = donation_id(&raw)?;

    let current = state.tracker.get(id)?;
    if !is_visible_to(&current, &viewer) {
        return Err(ApiError::NotFound(format!("donation {id} not found")));
    }

    let updated = state
        .tracker
        .transition_by(id, body.target_status, &viewer_party(&viewer))?;
    Ok(Json(DonationView::project(updated, &viewer)))
}

/// GET /stats
#[instrument(skip(state))]
pub async fn get_stats(
    State(state): State<AppState>,
    AuthUser(viewer): AuthUser,
) -> Json<Stats> {
    Json(stats_for(&state.tracker, &viewer))
}
