use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::estimate_id::NEW_ESTIMATE_ID;
use crate::calculations::{Totals, compute_totals};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Gender {
    #[serde(alias = "Macho")]
    Male,
    #[serde(alias = "Hembra")]
    Female,
    #[default]
    #[serde(alias = "Desconocido")]
    Unknown,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Unknown => "Unknown",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Male" | "Macho" => Some(Self::Male),
            "Female" | "Hembra" => Some(Self::Female),
            "Unknown" | "Desconocido" => Some(Self::Unknown),
            _ => None,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EstimateStatus {
    #[default]
    #[serde(alias = "Borrador")]
    Draft,
    #[serde(alias = "Enviado")]
    Sent,
    #[serde(alias = "Aprobado")]
    Approved,
}

impl EstimateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::Sent => "Sent",
            Self::Approved => "Approved",
        }
    }

    /// Accepts the canonical English names and the Spanish labels older
    /// data files were written with.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Draft" | "Borrador" => Some(Self::Draft),
            "Sent" | "Enviado" => Some(Self::Sent),
            "Approved" | "Aprobado" => Some(Self::Approved),
            _ => None,
        }
    }
}

impl fmt::Display for EstimateStatus {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub name: String,
    pub address: String,
    pub email: String,
    pub phone: String,
    /// National id / tax id of the owner, when the clinic records one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cedula: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pet {
    pub name: String,
    pub breed: String,
    /// Free text, e.g. "3 years" or "8 months".
    pub age: String,
    #[serde(default)]
    pub gender: Gender,
}

/// One priced service or product on an estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Client generated; only unique within the owning estimate.
    pub id: String,
    pub service: String,
    pub description: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

impl LineItem {
    /// `quantity × price`, saturating at the `Decimal` bounds.
    pub fn amount(&self) -> Decimal {
        self.quantity.saturating_mul(self.price)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub id: String,
    pub owner: Owner,
    pub pet: Pet,
    pub line_items: Vec<LineItem>,
    /// Percentage applied to the subtotal, e.g. `21` for 21 %.
    pub tax_rate: Decimal,
    /// Assigned by the repository on first save and never changed after.
    /// Required in stored documents.
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub status: EstimateStatus,
}

/// An estimate as a client submits it. Same document shape as [`Estimate`],
/// except that `createdAt` may be left out: the repository assigns it on
/// first save and keeps the stored one on update.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateInput {
    pub id: String,
    pub owner: Owner,
    pub pet: Pet,
    pub line_items: Vec<LineItem>,
    pub tax_rate: Decimal,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: EstimateStatus,
}

impl EstimateInput {
    /// `now` stands in for a missing `createdAt`.
    pub fn into_estimate(
        self,
        now: DateTime<Utc>,
    ) -> Estimate {
        Estimate {
            id: self.id,
            owner: self.owner,
            pet: self.pet,
            line_items: self.line_items,
            tax_rate: self.tax_rate,
            created_at: self.created_at.unwrap_or(now),
            status: self.status,
        }
    }
}

impl Estimate {
    /// An unsaved estimate. The repository replaces the sentinel id and the
    /// timestamp when it is first stored.
    pub fn draft(
        owner: Owner,
        pet: Pet,
        line_items: Vec<LineItem>,
        tax_rate: Decimal,
    ) -> Self {
        Self {
            id: NEW_ESTIMATE_ID.to_string(),
            owner,
            pet,
            line_items,
            tax_rate,
            created_at: Utc::now(),
            status: EstimateStatus::Draft,
        }
    }

    pub fn totals(&self) -> Totals {
        compute_totals(&self.line_items, self.tax_rate)
    }
}
