use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;
use uuid::Uuid;

/// Kilograms of CO₂ avoided per rescued meal.
pub const EMISSION_FACTOR_KG_PER_MEAL: f64 = 0.5;

/// Freshness label used when the restaurant leaves the field empty.
pub const DEFAULT_FRESHNESS_WINDOW: &str = "Good for 24 hours";

/// Lifecycle status of a donation.
///
/// `PendingConfirmation` is the only initial state; `Rejected` and `Collected`
/// are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum DonationStatus {
    #[serde(rename = "PENDING_NGO_CONFIRMATION")]
    PendingConfirmation,
    #[serde(rename = "ACCEPTED")]
    Accepted,
    #[serde(rename = "REJECTED")]
    Rejected,
    #[serde(rename = "COLLECTED")]
    Collected,
}

impl DonationStatus {
    pub const ALL: [DonationStatus; 4] = [
        DonationStatus::PendingConfirmation,
        DonationStatus::Accepted,
        DonationStatus::Rejected,
        DonationStatus::Collected,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DonationStatus::PendingConfirmation => "PENDING_NGO_CONFIRMATION",
            DonationStatus::Accepted => "ACCEPTED",
            DonationStatus::Rejected => "REJECTED",
            DonationStatus::Collected => "COLLECTED",
        }
    }

    /// Whether the transition table has an edge `self -> to`.
    pub fn can_transition_to(self, to: DonationStatus) -> bool {
        matches!(
            (self, to),
            (DonationStatus::PendingConfirmation, DonationStatus::Accepted)
                | (DonationStatus::PendingConfirmation, DonationStatus::Rejected)
                | (DonationStatus::Accepted, DonationStatus::Collected)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DonationStatus::Rejected | DonationStatus::Collected)
    }
}

impl fmt::Display for DonationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown donation status {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for DonationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DonationStatus::ALL
            .into_iter()
            .find(|st| st.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A party on either side of a donation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Party {
    pub id: Uuid,
    pub name: String,
}

/// One surplus-food offer as held by the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Donation {
    pub id: Uuid,
    pub status: DonationStatus,
    pub created_at: OffsetDateTime,
    pub quantity_meals: u32,
    pub co2_saved_kg: f64,
    pub restaurant: Party,
    /// NGO that accepted or rejected the offer; `None` while it is open.
    pub ngo: Option<Party>,
    pub food_type: String,
    pub freshness_window: String,
    pub notes: String,
    pub image_url: Option<String>,
}

/// Creation payload, already attributed to the submitting restaurant.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub restaurant: Party,
    pub food_type: String,
    pub quantity_meals: i64,
    pub freshness_window: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table_edges() {
        use DonationStatus::*;
        let allowed: Vec<(DonationStatus, DonationStatus)> = DonationStatus::ALL
            .into_iter()
            .flat_map(|from| DonationStatus::ALL.into_iter().map(move |to| (from, to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .collect();
        assert_eq!(
            allowed,
            vec![
                (PendingConfirmation, Accepted),
                (PendingConfirmation, Rejected),
                (Accepted, Collected),
            ]
        );
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for st in DonationStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            assert!(DonationStatus::ALL.iter().all(|to| !st.can_transition_to(*to)));
        }
    }

    #[test]
    fn status_parses_wire_names_case_insensitively() {
        assert_eq!(
            "pending_ngo_confirmation".parse::<DonationStatus>().unwrap(),
            DonationStatus::PendingConfirmation
        );
        assert_eq!("COLLECTED".parse::<DonationStatus>().unwrap(), DonationStatus::Collected);
        assert_eq!(
            "DELIVERED".parse::<DonationStatus>(),
            Err(UnknownStatus("DELIVERED".into()))
        );
        assert_eq!(
            UnknownStatus("DELIVERED".into()).to_string(),
            "unknown donation status \"DELIVERED\""
        );
    }

    #[test]
    fn status_serializes_with_wire_names() {
        let json = serde_json::to_string(&DonationStatus::PendingConfirmation).unwrap();
        assert_eq!(json, "\"PENDING_NGO_CONFIRMATION\"");
    }
}
