//! Dashboard figures for a single day.

use std::collections::HashMap;

use chrono::{NaiveDate, TimeZone};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Estimate;

/// How many units of one service were quoted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceCount {
    pub service: String,
    pub quantity: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyMetrics {
    pub day: NaiveDate,
    pub estimate_count: usize,
    /// Sum of the grand totals of the day's estimates.
    pub total_income: Decimal,
    /// `total_income / estimate_count`, zero on a day without estimates.
    pub average_ticket: Decimal,
    pub line_item_count: usize,
    /// Most quoted services, highest quantity first, ties by name.
    pub top_services: Vec<ServiceCount>,
}

/// Summarise the estimates created on `day`, as seen from `tz`.
pub fn daily_metrics<Tz: TimeZone>(
    estimates: &[Estimate],
    day: NaiveDate,
    tz: &Tz,
    top_n: usize,
) -> DailyMetrics {
    let todays: Vec<&Estimate> = estimates
        .iter()
        .filter(|e| e.created_at.with_timezone(tz).date_naive() == day)
        .collect();

    let total_income = todays
        .iter()
        .map(|e| e.totals().total)
        .fold(Decimal::ZERO, Decimal::saturating_add);
    let average_ticket = if todays.is_empty() {
        Decimal::ZERO
    } else {
        total_income / Decimal::from(todays.len())
    };

    let mut quantities: HashMap<&str, Decimal> = HashMap::new();
    for item in todays.iter().flat_map(|e| &e.line_items) {
        let quantity = quantities.entry(item.service.as_str()).or_default();
        *quantity = quantity.saturating_add(item.quantity);
    }

    let mut top_services: Vec<ServiceCount> = quantities
        .into_iter()
        .map(|(service, quantity)| ServiceCount {
            service: service.to_string(),
            quantity,
        })
        .collect();
    top_services.sort_by(|a, b| {
        b.quantity
            .cmp(&a.quantity)
            .then_with(|| a.service.cmp(&b.service))
    });
    top_services.truncate(top_n);

    DailyMetrics {
        day,
        estimate_count: todays.len(),
        total_income,
        average_ticket,
        line_item_count: todays.iter().map(|e| e.line_items.len()).sum(),
        top_services,
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset, Utc};
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{EstimateStatus, Gender, LineItem, Owner, Pet};

    fn estimate(
        id: &str,
        created_at: &str,
        items: &[(&str, Decimal, Decimal)],
    ) -> Estimate {
        Estimate {
            id: id.to_string(),
            owner: Owner {
                name: "Owner".to_string(),
                address: "Street".to_string(),
                email: "owner@example.com".to_string(),
                phone: "1".to_string(),
                cedula: None,
            },
            pet: Pet {
                name: "Pet".to_string(),
                breed: "Breed".to_string(),
                age: "1".to_string(),
                gender: Gender::Unknown,
            },
            line_items: items
                .iter()
                .enumerate()
                .map(|(i, (service, quantity, price))| LineItem {
                    id: i.to_string(),
                    service: service.to_string(),
                    description: String::new(),
                    quantity: *quantity,
                    price: *price,
                })
                .collect(),
            tax_rate: dec!(10),
            created_at: created_at.parse::<DateTime<Utc>>().unwrap(),
            status: EstimateStatus::Draft,
        }
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn sample() -> Vec<Estimate> {
        vec![
            estimate(
                "EST-001",
                "2024-07-20T09:00:00Z",
                &[("Consulta", dec!(1), dec!(75)), ("Vacuna", dec!(2), dec!(10))],
            ),
            estimate(
                "EST-002",
                "2024-07-20T17:30:00Z",
                &[("Vacuna", dec!(1), dec!(10)), ("Desparasitación", dec!(3), dec!(5))],
            ),
            estimate("EST-003", "2024-07-19T12:00:00Z", &[("Cirugía", dec!(1), dec!(500))]),
        ]
    }

    #[test]
    fn summarises_only_the_requested_day() {
        let metrics = daily_metrics(&sample(), day("2024-07-20"), &Utc, 4);

        assert_eq!(metrics.estimate_count, 2);
        assert_eq!(metrics.line_item_count, 4);
        // 104.5 + 27.5
        assert_eq!(metrics.total_income, dec!(132));
        assert_eq!(metrics.average_ticket, dec!(66));
    }

    #[test]
    fn top_services_sorted_by_quantity_then_name() {
        let metrics = daily_metrics(&sample(), day("2024-07-20"), &Utc, 4);

        assert_eq!(
            metrics.top_services,
            vec![
                ServiceCount {
                    service: "Desparasitación".to_string(),
                    quantity: dec!(3),
                },
                ServiceCount {
                    service: "Vacuna".to_string(),
                    quantity: dec!(3),
                },
                ServiceCount {
                    service: "Consulta".to_string(),
                    quantity: dec!(1),
                },
            ]
        );
    }

    #[test]
    fn top_services_truncated() {
        let metrics = daily_metrics(&sample(), day("2024-07-20"), &Utc, 1);

        assert_eq!(metrics.top_services.len(), 1);
    }

    #[test]
    fn day_boundary_follows_timezone() {
        // 17:30 UTC is already the next day at UTC+8.
        let tz = FixedOffset::east_opt(8 * 3600).unwrap();

        let metrics = daily_metrics(&sample(), day("2024-07-21"), &tz, 4);

        assert_eq!(metrics.estimate_count, 1);
        assert_eq!(metrics.total_income, dec!(27.5));
    }

    #[test]
    fn empty_day_has_zero_average() {
        let metrics = daily_metrics(&sample(), day("2024-01-01"), &Utc, 4);

        assert_eq!(
            metrics,
            DailyMetrics {
                day: day("2024-01-01"),
                ..Default::default()
            }
        );
    }

    #[test]
    fn out_of_range_estimates_do_not_panic() {
        let estimates = vec![
            estimate("EST-001", "2024-07-20T09:00:00Z", &[("Cirugía", dec!(1), Decimal::MAX)]),
            estimate("EST-002", "2024-07-20T10:00:00Z", &[("Cirugía", Decimal::MAX, dec!(1))]),
        ];

        let metrics = daily_metrics(&estimates, day("2024-07-20"), &Utc, 4);

        assert_eq!(metrics.total_income, Decimal::MAX);
        assert_eq!(metrics.top_services[0].quantity, Decimal::MAX);
    }
}
