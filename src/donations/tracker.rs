use std::sync::{Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::repo_types::{
    Donation, DonationStatus, NewDonation, Party, DEFAULT_FRESHNESS_WINDOW,
    EMISSION_FACTOR_KG_PER_MEAL,
};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrackerError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("donation {0} not found")]
    NotFound(Uuid),

    #[error("donation {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: Uuid,
        from: DonationStatus,
        to: DonationStatus,
    },

    #[error("another status change is in progress (donation {in_flight})")]
    Busy { in_flight: Uuid },
}

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Search and status filter for [`DonationTracker::list`].
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Case-insensitive substring over food type, restaurant and NGO names.
    /// Taken verbatim: whitespace is part of the needle.
    pub query: Option<String>,
    /// `None` means every status.
    pub status: Option<DonationStatus>,
}

impl ListFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn matches(&self, d: &Donation) -> bool {
        if let Some(status) = self.status {
            if d.status != status {
                return false;
            }
        }
        let needle = match self.query.as_deref() {
            None | Some("") => return true,
            Some(q) => q.to_lowercase(),
        };
        d.food_type.to_lowercase().contains(&needle)
            || d.restaurant.name.to_lowercase().contains(&needle)
            || d
                .ngo
                .as_ref()
                .is_some_and(|ngo| ngo.name.to_lowercase().contains(&needle))
    }
}

/// Owns the donation collection. All mutation goes through `create` and
/// `transition*`; readers get owned snapshots.
///
/// The collection is kept most-recent-first.
#[derive(Debug, Default)]
pub struct DonationTracker {
    donations: RwLock<Vec<Donation>>,
    processing: Mutex<Option<Uuid>>,
}

/// Held while a transition is being applied. Releases the slot on drop.
pub struct ProcessingSlot<'a> {
    tracker: &'a DonationTracker,
}

impl Drop for ProcessingSlot<'_> {
    fn drop(&mut self) {
        *self
            .tracker
            .processing
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl DonationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<Donation>> {
        self.donations.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Donation>> {
        self.donations.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn create(&self, input: NewDonation) -> Result<Donation> {
        let food_type = input.food_type.trim();
        if food_type.is_empty() {
            return Err(TrackerError::InvalidInput("foodType is required".into()));
        }
        if input.quantity_meals < 0 {
            return Err(TrackerError::InvalidInput(
                "quantityMeals must be non-negative".into(),
            ));
        }
        let quantity_meals = u32::try_from(input.quantity_meals)
            .map_err(|_| TrackerError::InvalidInput("quantityMeals is too large".into()))?;

        let donation = Donation {
            id: Uuid::new_v4(),
            status: DonationStatus::PendingConfirmation,
            created_at: OffsetDateTime::now_utc(),
            quantity_meals,
            co2_saved_kg: f64::from(quantity_meals) * EMISSION_FACTOR_KG_PER_MEAL,
            restaurant: input.restaurant,
            ngo: None,
            food_type: food_type.to_string(),
            freshness_window: input
                .freshness_window
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| DEFAULT_FRESHNESS_WINDOW.to_string()),
            notes: input.notes.unwrap_or_default(),
            image_url: input.image_url.filter(|s| !s.trim().is_empty()),
        };

        self.write().insert(0, donation.clone());
        info!(
            donation_id = %donation.id,
            restaurant = %donation.restaurant.name,
            meals = donation.quantity_meals,
            "donation created"
        );
        Ok(donation)
    }

    pub fn get(&self, id: Uuid) -> Result<Donation> {
        self.read()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or(TrackerError::NotFound(id))
    }

    pub fn list(&self, filter: &ListFilter) -> Vec<Donation> {
        self.read()
            .iter()
            .filter(|d| filter.matches(d))
            .cloned()
            .collect()
    }

    pub fn snapshot(&self) -> Vec<Donation> {
        self.read().clone()
    }

    /// Claims the global processing slot for a transition on `id`.
    pub fn claim(&self, id: Uuid) -> Result<ProcessingSlot<'_>> {
        let mut slot = self.processing.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(in_flight) = *slot {
            warn!(donation_id = %id, %in_flight, "transition rejected, slot busy");
            return Err(TrackerError::Busy { in_flight });
        }
        *slot = Some(id);
        debug!(donation_id = %id, "processing slot claimed");
        Ok(ProcessingSlot { tracker: self })
    }

    /// Moves `id` to `to` if the transition table allows it.
    pub fn transition(&self, id: Uuid, to: DonationStatus) -> Result<Donation> {
        let _slot = self.claim(id)?;
        self.apply(id, to, None)
    }

    /// Like [`transition`](Self::transition) on behalf of an NGO.
    ///
    /// A donation already handled by a different NGO is reported as not
    /// found. The first decision on an open donation records `handler` as
    /// its NGO.
    pub fn transition_by(&self, id: Uuid, to: DonationStatus, handler: &Party) -> Result<Donation> {
        let _slot = self.claim(id)?;
        self.apply(id, to, Some(handler))
    }

    /// Applies a transition while the caller holds a processing slot.
    fn apply(
        &self,
        id: Uuid,
        to: DonationStatus,
        handler: Option<&Party>,
    ) -> Result<Donation> {
        let mut donations = self.write();
        let current = donations
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or(TrackerError::NotFound(id))?;

        if let (Some(owner), Some(handler)) = (current.ngo.as_ref(), handler) {
            if owner.id != handler.id {
                return Err(TrackerError::NotFound(id));
            }
        }

        let from = current.status;
        if !from.can_transition_to(to) {
            warn!(donation_id = %id, %from, %to, "invalid transition");
            return Err(TrackerError::InvalidTransition { id, from, to });
        }

        current.status = to;
        if current.ngo.is_none() {
            current.ngo = handler.cloned();
        }
        info!(donation_id = %id, %from, %to, "donation status changed");
        Ok(current.clone())
    }
}
