use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::Viewer;
use crate::donations::repo_types::{Donation, DonationStatus};
use crate::donations::services::counterparty_name;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateDonationRequest {
    pub food_type: String,
    pub quantity_meals: i64,
    pub freshness_window: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub target_status: DonationStatus,
}

/// `GET /donations` query: `status` is a wire status name or `ALL`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

/// A donation as one viewer sees it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationView {
    pub id: Uuid,
    pub status: DonationStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub quantity_meals: u32,
    pub co2_saved_kg: f64,
    pub counterparty_name: String,
    pub restaurant_name: String,
    pub ngo_name: Option<String>,
    pub food_type: String,
    pub freshness_window: String,
    pub notes: String,
    pub image_url: Option<String>,
}

impl DonationView {
    pub fn project(d: Donation, viewer: &Viewer) -> Self {
        let counterparty_name = counterparty_name(&d, viewer);
        Self {
            id: d.id,
            status: d.status,
            created_at: d.created_at,
            quantity_meals: d.quantity_meals,
            co2_saved_kg: d.co2_saved_kg,
            counterparty_name,
            restaurant_name: d.restaurant.name,
            ngo_name: d.ngo.map(|ngo| ngo.name),
            food_type: d.food_type,
            freshness_window: d.freshness_window,
            notes: d.notes,
            image_url: d.image_url,
        }
    }
}
