//! Field validation for estimates and company settings.
//!
//! Checks run before anything is handed to a repository. Every failing field
//! is reported, not only the first, so a form can highlight all of them.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::calculations::checked_totals;
use crate::models::{CompanyPatch, Estimate};

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

static HEX_COLOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#(?:[0-9a-fA-F]{3}|[0-9a-fA-F]{6})$").expect("valid colour regex")
});

static HTTP_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));

/// One failed check, addressed by its path in the serialized document
/// (`owner.email`, `lineItems[2].price`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl fmt::Display for FieldError {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", join_errors(.0))]
pub struct ValidationErrors(pub Vec<FieldError>);

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.field.as_str())
    }

    pub fn contains(
        &self,
        field: &str,
    ) -> bool {
        self.fields().any(|f| f == field)
    }
}

#[derive(Debug, Default)]
struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    fn fail(
        &mut self,
        field: impl Into<String>,
        message: &str,
    ) {
        self.errors.push(FieldError {
            field: field.into(),
            message: message.to_string(),
        });
    }

    fn check(
        &mut self,
        ok: bool,
        field: impl Into<String>,
        message: &str,
    ) {
        if !ok {
            self.fail(field, message);
        }
    }

    fn required(
        &mut self,
        field: impl Into<String>,
        value: &str,
    ) {
        self.check(!value.trim().is_empty(), field, "is required");
    }

    fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value.trim())
}

pub fn is_valid_hex_color(value: &str) -> bool {
    HEX_COLOR_RE.is_match(value.trim())
}

/// `http(s)` URLs and `data:` URIs (the logo is often inlined as base64).
pub fn is_valid_logo_url(value: &str) -> bool {
    let value = value.trim();
    if let Some(rest) = value.strip_prefix("data:") {
        return rest.contains(',');
    }
    HTTP_URL_RE.is_match(value)
}

impl Estimate {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = Checks::default();

        checks.required("owner.name", &self.owner.name);
        checks.required("owner.address", &self.owner.address);
        checks.required("owner.phone", &self.owner.phone);
        checks.check(
            is_valid_email(&self.owner.email),
            "owner.email",
            "must be a valid email address",
        );
        if let Some(cedula) = &self.owner.cedula {
            checks.required("owner.cedula", cedula);
        }

        checks.required("pet.name", &self.pet.name);
        checks.required("pet.breed", &self.pet.breed);
        checks.required("pet.age", &self.pet.age);

        checks.check(
            self.tax_rate >= Decimal::ZERO,
            "taxRate",
            "must not be negative",
        );

        if self.line_items.is_empty() {
            checks.fail("lineItems", "at least one line item is required");
        }

        let mut seen = HashSet::new();
        let mut amounts_fit = true;
        for (i, item) in self.line_items.iter().enumerate() {
            let path = |name: &str| format!("lineItems[{i}].{name}");

            checks.required(path("id"), &item.id);
            checks.check(seen.insert(item.id.as_str()), path("id"), "is duplicated");
            checks.required(path("service"), &item.service);
            checks.required(path("description"), &item.description);
            checks.check(
                item.quantity > Decimal::ZERO,
                path("quantity"),
                "must be greater than 0",
            );
            checks.check(
                item.price >= Decimal::ZERO,
                path("price"),
                "must not be negative",
            );

            let amount_fits = item.quantity.checked_mul(item.price).is_some();
            checks.check(
                amount_fits,
                path("price"),
                "quantity times price is too large",
            );
            amounts_fit &= amount_fits;
        }

        // Every figure in the totals must fit in a Decimal.
        if amounts_fit && checked_totals(&self.line_items, self.tax_rate).is_none() {
            if checked_totals(&self.line_items, Decimal::ZERO).is_none() {
                checks.fail("lineItems", "subtotal is too large");
            } else {
                checks.fail("taxRate", "tax on this subtotal is too large");
            }
        }

        checks.finish()
    }
}

impl CompanyPatch {
    /// Only the supplied fields are checked; `None` means "keep what is stored".
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut checks = Checks::default();

        let required = [
            ("name", &self.name),
            ("address", &self.address),
            ("contactInfo", &self.contact_info),
            ("taxId", &self.tax_id),
            ("disclaimer", &self.disclaimer),
        ];
        for (field, value) in required {
            if let Some(value) = value {
                checks.required(field, value);
            }
        }

        if let Some(logo_url) = &self.logo_url {
            checks.check(
                is_valid_logo_url(logo_url),
                "logoUrl",
                "must be an http(s) URL or a data URI",
            );
        }
        if let Some(accent_color) = &self.accent_color {
            checks.check(
                is_valid_hex_color(accent_color),
                "accentColor",
                "must be a hex colour like #4f46e5",
            );
        }

        checks.finish()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::models::{EstimateStatus, Gender, LineItem, Owner, Pet};

    fn item(
        id: &str,
        quantity: Decimal,
        price: Decimal,
    ) -> LineItem {
        LineItem {
            id: id.to_string(),
            service: "Consulta".to_string(),
            description: "Examen".to_string(),
            quantity,
            price,
        }
    }

    fn valid_estimate() -> Estimate {
        Estimate {
            id: "new".to_string(),
            owner: Owner {
                name: "Carlos".to_string(),
                address: "Madrid".to_string(),
                email: "carlos@example.com".to_string(),
                phone: "611 223 344".to_string(),
                cedula: None,
            },
            pet: Pet {
                name: "Toby".to_string(),
                breed: "Labrador".to_string(),
                age: "3".to_string(),
                gender: Gender::Male,
            },
            line_items: vec![item("1", dec!(1), dec!(45))],
            tax_rate: dec!(21),
            created_at: Utc::now(),
            status: EstimateStatus::Draft,
        }
    }

    #[test]
    fn valid_estimate_passes() {
        assert_eq!(valid_estimate().validate(), Ok(()));
    }

    #[test]
    fn reports_every_failing_field() {
        let mut estimate = valid_estimate();
        estimate.owner.name = "  ".to_string();
        estimate.owner.email = "not-an-email".to_string();
        estimate.pet.breed = String::new();
        estimate.tax_rate = dec!(-1);

        let errors = estimate.validate().unwrap_err();

        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["owner.name", "owner.email", "pet.breed", "taxRate"]
        );
    }

    #[test]
    fn empty_line_items_are_rejected() {
        let mut estimate = valid_estimate();
        estimate.line_items.clear();

        assert!(estimate.validate().unwrap_err().contains("lineItems"));
    }

    #[test]
    fn line_item_bounds() {
        let mut estimate = valid_estimate();
        estimate.line_items = vec![
            item("1", dec!(0), dec!(10)),
            item("2", dec!(0.01), dec!(0)),
            item("3", dec!(1), dec!(-0.01)),
        ];

        let errors = estimate.validate().unwrap_err();

        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["lineItems[0].quantity", "lineItems[2].price"]
        );
    }

    fn huge() -> Decimal {
        Decimal::from_i128_with_scale(10_i128.pow(20), 0)
    }

    #[test]
    fn amount_beyond_decimal_range_is_rejected() {
        let mut estimate = valid_estimate();
        estimate.line_items = vec![item("1", dec!(1), dec!(45)), item("2", huge(), huge())];

        let errors = estimate.validate().unwrap_err();

        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["lineItems[1].price"]);
    }

    #[test]
    fn subtotal_beyond_decimal_range_is_rejected() {
        let mut estimate = valid_estimate();
        estimate.line_items = vec![
            item("1", dec!(1), Decimal::MAX),
            item("2", dec!(1), Decimal::MAX),
        ];

        let errors = estimate.validate().unwrap_err();

        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["lineItems"]);
    }

    #[test]
    fn tax_beyond_decimal_range_is_rejected() {
        let mut estimate = valid_estimate();
        estimate.line_items = vec![item("1", dec!(1), Decimal::MAX)];
        estimate.tax_rate = dec!(10);

        let errors = estimate.validate().unwrap_err();

        assert_eq!(errors.fields().collect::<Vec<_>>(), vec!["taxRate"]);
    }

    #[test]
    fn large_but_representable_amounts_pass() {
        let mut estimate = valid_estimate();
        estimate.line_items = vec![item("1", dec!(1000), dec!(999999999.99))];

        assert_eq!(estimate.validate(), Ok(()));
        assert_eq!(estimate.totals().subtotal, dec!(999999999990.00));
    }

    #[test]
    fn duplicate_line_item_ids_are_rejected() {
        let mut estimate = valid_estimate();
        estimate.line_items = vec![item("a", dec!(1), dec!(1)), item("a", dec!(1), dec!(1))];

        assert!(estimate.validate().unwrap_err().contains("lineItems[1].id"));
    }

    #[test]
    fn blank_cedula_is_rejected_when_present() {
        let mut estimate = valid_estimate();
        estimate.owner.cedula = Some(" ".to_string());

        assert!(estimate.validate().unwrap_err().contains("owner.cedula"));
    }

    #[test]
    fn company_patch_checks_only_supplied_fields() {
        assert_eq!(CompanyPatch::default().validate(), Ok(()));

        let patch = CompanyPatch {
            name: Some(String::new()),
            accent_color: Some("blue".to_string()),
            logo_url: Some("ftp://example.com/logo.png".to_string()),
            ..Default::default()
        };

        let errors = patch.validate().unwrap_err();

        assert_eq!(
            errors.fields().collect::<Vec<_>>(),
            vec!["name", "logoUrl", "accentColor"]
        );
    }

    #[test]
    fn logo_url_accepts_urls_and_data_uris() {
        assert!(is_valid_logo_url("https://example.com/logo.png"));
        assert!(is_valid_logo_url("data:image/png;base64,iVBORw0KGgo="));
        assert!(!is_valid_logo_url("data:image/png"));
        assert!(!is_valid_logo_url("logo.png"));
    }

    #[test]
    fn hex_colors() {
        assert!(is_valid_hex_color("#4f46e5"));
        assert!(is_valid_hex_color("#FFF"));
        assert!(!is_valid_hex_color("4f46e5"));
        assert!(!is_valid_hex_color("#4f46e"));
    }

    #[test]
    fn error_message_lists_fields() {
        let errors = ValidationErrors(vec![FieldError {
            field: "owner.email".to_string(),
            message: "must be a valid email address".to_string(),
        }]);

        assert_eq!(
            errors.to_string(),
            "validation failed: owner.email: must be a valid email address"
        );
    }
}
