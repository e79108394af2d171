//! Estimate collection rules shared by the backends that keep the whole
//! collection in a `Vec` (process memory, flat JSON files).

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::models::{Estimate, format_estimate_id, next_estimate_number, parse_estimate_number};

/// Newest first. Equal timestamps fall back to the id, highest estimate
/// number first; ids that are not `EST-<n>` go after numbered ones.
pub fn newest_first(
    a: &Estimate,
    b: &Estimate,
) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| id_key(&b.id).cmp(&id_key(&a.id)))
}

fn id_key(id: &str) -> (Option<u64>, &str) {
    (parse_estimate_number(id), id)
}

pub fn sort_newest_first(estimates: &mut [Estimate]) {
    estimates.sort_by(newest_first);
}

/// What [`upsert_estimate`] did with the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Created,
    Updated,
}

/// Insert or overwrite `estimate` in `estimates`.
///
/// An id already present overwrites that record, with `created_at` carried
/// over from the stored copy. Anything else is stored as a new estimate: the
/// id comes from `last_issued` and the ids in the collection, and the
/// timestamp is `now`. `last_issued` is advanced when a number is handed out.
pub fn upsert_estimate(
    estimates: &mut Vec<Estimate>,
    last_issued: &mut u64,
    mut estimate: Estimate,
    now: DateTime<Utc>,
) -> (Estimate, Upsert) {
    if let Some(stored) = estimates.iter_mut().find(|e| e.id == estimate.id) {
        estimate.created_at = stored.created_at;
        *stored = estimate.clone();
        return (estimate, Upsert::Updated);
    }

    let number = next_estimate_number(estimates.iter().map(|e| e.id.as_str()), *last_issued);
    *last_issued = number;

    estimate.id = format_estimate_id(number);
    estimate.created_at = now;
    estimates.push(estimate.clone());

    (estimate, Upsert::Created)
}

/// Remove the estimate with `id`; returns whether one was there.
pub fn remove_estimate(
    estimates: &mut Vec<Estimate>,
    id: &str,
) -> bool {
    let before = estimates.len();
    estimates.retain(|e| e.id != id);
    estimates.len() != before
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{EstimateStatus, Gender, LineItem, NEW_ESTIMATE_ID, Owner, Pet};

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn estimate(
        id: &str,
        created_at: &str,
    ) -> Estimate {
        Estimate {
            id: id.to_string(),
            owner: Owner {
                name: "Ana".to_string(),
                address: "Madrid".to_string(),
                email: "ana@example.com".to_string(),
                phone: "600".to_string(),
                cedula: None,
            },
            pet: Pet {
                name: "Luna".to_string(),
                breed: "Mestiza".to_string(),
                age: "2".to_string(),
                gender: Gender::Female,
            },
            line_items: vec![LineItem {
                id: "1".to_string(),
                service: "Consulta".to_string(),
                description: "General".to_string(),
                quantity: dec!(1),
                price: dec!(45),
            }],
            tax_rate: dec!(21),
            created_at: at(created_at),
            status: EstimateStatus::Draft,
        }
    }

    #[test]
    fn first_estimate_is_est_001_with_fresh_timestamp() {
        let mut estimates = Vec::new();
        let mut last = 0;
        let now = at("2024-07-15T10:00:00Z");

        let (saved, outcome) = upsert_estimate(
            &mut estimates,
            &mut last,
            estimate(NEW_ESTIMATE_ID, "2000-01-01T00:00:00Z"),
            now,
        );

        assert_eq!(outcome, Upsert::Created);
        assert_eq!(saved.id, "EST-001");
        assert_eq!(saved.created_at, now);
        assert_eq!(last, 1);
        assert_eq!(estimates, vec![saved]);
    }

    #[test]
    fn new_estimate_follows_highest_existing_id() {
        let mut estimates = vec![
            estimate("EST-001", "2024-07-15T10:00:00Z"),
            estimate("EST-002", "2024-07-20T09:00:00Z"),
        ];
        let mut last = 0;

        let (saved, _) = upsert_estimate(
            &mut estimates,
            &mut last,
            estimate(NEW_ESTIMATE_ID, "2024-07-21T09:00:00Z"),
            Utc::now(),
        );

        assert_eq!(saved.id, "EST-003");
        assert_eq!(estimates.len(), 3);
    }

    #[test]
    fn unknown_id_is_treated_as_new() {
        let mut estimates = vec![estimate("EST-001", "2024-07-15T10:00:00Z")];
        let mut last = 1;

        let (saved, outcome) = upsert_estimate(
            &mut estimates,
            &mut last,
            estimate("EST-050", "2024-07-15T10:00:00Z"),
            Utc::now(),
        );

        assert_eq!(outcome, Upsert::Created);
        assert_eq!(saved.id, "EST-002");
    }

    #[test]
    fn update_keeps_stored_created_at() {
        let original = estimate("EST-001", "2024-07-15T10:00:00Z");
        let mut estimates = vec![original.clone()];
        let mut last = 1;

        let mut edited = estimate("EST-001", "2030-01-01T00:00:00Z");
        edited.status = EstimateStatus::Approved;
        edited.tax_rate = dec!(10);

        let (saved, outcome) =
            upsert_estimate(&mut estimates, &mut last, edited, Utc::now());

        assert_eq!(outcome, Upsert::Updated);
        assert_eq!(saved.created_at, original.created_at);
        assert_eq!(saved.status, EstimateStatus::Approved);
        assert_eq!(estimates, vec![saved]);
        assert_eq!(last, 1);
    }

    #[test]
    fn deleted_numbers_are_not_reissued() {
        let mut estimates = Vec::new();
        let mut last = 0;
        for _ in 0..3 {
            upsert_estimate(
                &mut estimates,
                &mut last,
                estimate(NEW_ESTIMATE_ID, "2024-07-15T10:00:00Z"),
                Utc::now(),
            );
        }

        assert!(remove_estimate(&mut estimates, "EST-003"));
        assert!(!remove_estimate(&mut estimates, "EST-003"));

        let (saved, _) = upsert_estimate(
            &mut estimates,
            &mut last,
            estimate(NEW_ESTIMATE_ID, "2024-07-15T10:00:00Z"),
            Utc::now(),
        );

        assert_eq!(saved.id, "EST-004");
    }

    #[test]
    fn sort_is_newest_first_for_any_insertion_order() {
        let mut estimates = vec![
            estimate("EST-001", "2024-07-15T10:00:00Z"),
            estimate("EST-003", "2024-07-18T08:00:00Z"),
            estimate("EST-002", "2024-07-20T09:00:00Z"),
        ];

        sort_newest_first(&mut estimates);

        let ids: Vec<_> = estimates.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["EST-002", "EST-003", "EST-001"]);
    }

    #[test]
    fn equal_timestamps_order_by_id_descending() {
        let mut estimates = vec![
            estimate("EST-001", "2024-07-15T10:00:00Z"),
            estimate("EST-002", "2024-07-15T10:00:00Z"),
        ];

        sort_newest_first(&mut estimates);

        assert_eq!(estimates[0].id, "EST-002");
    }

    #[test]
    fn equal_timestamps_compare_estimate_numbers_not_strings() {
        let mut estimates = vec![
            estimate("EST-999", "2024-07-15T10:00:00Z"),
            estimate("legacy", "2024-07-15T10:00:00Z"),
            estimate("EST-1000", "2024-07-15T10:00:00Z"),
        ];

        sort_newest_first(&mut estimates);

        let ids: Vec<_> = estimates.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["EST-1000", "EST-999", "legacy"]);
    }
}
