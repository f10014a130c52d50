use serde::Serialize;

use crate::auth::repo_types::{Role, Viewer};
use crate::donations::repo_types::{Donation, DonationStatus, Party};
use crate::donations::tracker::{DonationTracker, ListFilter};

/// Counterparty shown to a restaurant before any NGO has picked the offer up.
pub const PENDING_ASSIGNMENT: &str = "Pending Assignment";

/// Aggregate counters over a set of donations.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_donations: usize,
    pub total_meals: u64,
    pub total_co2_saved_kg: f64,
}

/// Pure fold over any snapshot of the collection.
pub fn compute_stats<'a, I>(donations: I) -> Stats
where
    I: IntoIterator<Item = &'a Donation>,
{
    donations.into_iter().fold(Stats::default(), |acc, d| Stats {
        total_donations: acc.total_donations + 1,
        total_meals: acc.total_meals + u64::from(d.quantity_meals),
        total_co2_saved_kg: acc.total_co2_saved_kg + d.co2_saved_kg,
    })
}

/// Restaurants see what they submitted; NGOs see open offers and the
/// donations they decided on.
pub fn is_visible_to(d: &Donation, viewer: &Viewer) -> bool {
    match viewer.role {
        Role::Restaurant => d.restaurant.id == viewer.user_id,
        Role::Ngo => match &d.ngo {
            Some(ngo) => ngo.id == viewer.user_id,
            None => d.status == DonationStatus::PendingConfirmation,
        },
    }
}

pub fn counterparty_name(d: &Donation, viewer: &Viewer) -> String {
    match viewer.role {
        Role::Restaurant => d
            .ngo
            .as_ref()
            .map(|ngo| ngo.name.clone())
            .unwrap_or_else(|| PENDING_ASSIGNMENT.to_string()),
        Role::Ngo => d.restaurant.name.clone(),
    }
}

pub fn viewer_party(viewer: &Viewer) -> Party {
    Party {
        id: viewer.user_id,
        name: viewer.organization.clone(),
    }
}

/// The viewer's projection of `tracker.list(filter)`, order preserved.
pub fn visible_donations(
    tracker: &DonationTracker,
    viewer: &Viewer,
    filter: &ListFilter,
) -> Vec<Donation> {
    tracker
        .list(filter)
        .into_iter()
        .filter(|d| is_visible_to(d, viewer))
        .collect()
}

/// Dashboard counters over what the viewer can see. For an NGO that is the
/// open offers it could still pick up plus everything it already decided
/// on, so the numbers track the work in front of it, not only meals served.
pub fn stats_for(tracker: &DonationTracker, viewer: &Viewer) -> Stats {
    compute_stats(&visible_donations(tracker, viewer, &ListFilter::all()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::donations::repo_types::NewDonation;
    use uuid::Uuid;

    fn viewer(role: Role, org: &str) -> Viewer {
        Viewer {
            user_id: Uuid::new_v4(),
            role,
            organization: org.into(),
        }
    }

    fn submit(tracker: &DonationTracker, by: &Viewer, food: &str, meals: i64) -> Donation {
        tracker
            .create(NewDonation {
                restaurant: viewer_party(by),
                food_type: food.into(),
                quantity_meals: meals,
                freshness_window: None,
                notes: None,
                image_url: None,
            })
            .unwrap()
    }

    #[test]
    fn stats_fold_matches_fresh_recount() {
        let tracker = DonationTracker::new();
        let spicy = viewer(Role::Restaurant, "Spicy Bites");
        for (food, meals) in [("Curry & Rice", 20), ("Mixed Greens", 15), ("Pasta Trays", 30)] {
            submit(&tracker, &spicy, food, meals);
        }
        let all = tracker.list(&ListFilter::all());
        let stats = compute_stats(&all);
        assert_eq!(
            stats,
            Stats {
                total_donations: 3,
                total_meals: 65,
                total_co2_saved_kg: 32.5,
            }
        );

        let reversed: Vec<_> = all.iter().rev().collect();
        assert_eq!(compute_stats(reversed), stats);
        assert_eq!(compute_stats(&tracker.snapshot()), stats);
    }

    #[test]
    fn empty_collection_has_zero_stats() {
        assert_eq!(compute_stats(&Vec::<Donation>::new()), Stats::default());
    }

    #[test]
    fn restaurants_only_see_their_own() {
        let tracker = DonationTracker::new();
        let spicy = viewer(Role::Restaurant, "Spicy Bites");
        let bakery = viewer(Role::Restaurant, "Bakery Delights");
        submit(&tracker, &spicy, "Curry & Rice", 20);
        submit(&tracker, &bakery, "Assorted Breads", 50);

        let mine = visible_donations(&tracker, &spicy, &ListFilter::all());
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].food_type, "Curry & Rice");
        assert_eq!(counterparty_name(&mine[0], &spicy), PENDING_ASSIGNMENT);
        assert_eq!(stats_for(&tracker, &bakery).total_meals, 50);
    }

    #[test]
    fn ngo_sees_open_offers_and_its_own_decisions() {
        let tracker = DonationTracker::new();
        let spicy = viewer(Role::Restaurant, "Spicy Bites");
        let hope = viewer(Role::Ngo, "Hope Foundation");
        let angels = viewer(Role::Ngo, "Food Angels");

        let curry = submit(&tracker, &spicy, "Curry & Rice", 20);
        let greens = submit(&tracker, &spicy, "Mixed Greens", 15);
        tracker
            .transition_by(curry.id, DonationStatus::Accepted, &viewer_party(&hope))
            .unwrap();

        let for_hope = visible_donations(&tracker, &hope, &ListFilter::all());
        assert_eq!(for_hope.len(), 2);
        let for_angels = visible_donations(&tracker, &angels, &ListFilter::all());
        assert_eq!(for_angels.iter().map(|d| d.id).collect::<Vec<_>>(), vec![greens.id]);

        let accepted = tracker.get(curry.id).unwrap();
        assert_eq!(counterparty_name(&accepted, &hope), "Spicy Bites");
        assert_eq!(counterparty_name(&accepted, &spicy), "Hope Foundation");

        let hope_stats = stats_for(&tracker, &hope);
        assert_eq!(hope_stats.total_donations, 2);
        assert_eq!(hope_stats.total_meals, 35);
        assert_eq!(stats_for(&tracker, &angels).total_meals, 15);
    }
}
