use serde::{Deserialize, Serialize};

/// Identifier given to the clinic profile the first time it is saved.
pub const COMPANY_ID: &str = "1";

/// The clinic profile used to brand every estimate.
///
/// There is at most one of these per deployment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub name: String,
    pub address: String,
    pub contact_info: String,
    pub tax_id: String,
    /// Either an `http(s)` URL or a `data:` URI.
    pub logo_url: String,
    pub disclaimer: String,
    /// Hex colour, e.g. `#4f46e5`.
    pub accent_color: String,
}

impl Default for Company {
    fn default() -> Self {
        Self {
            id: COMPANY_ID.to_string(),
            name: String::new(),
            address: String::new(),
            contact_info: String::new(),
            tax_id: String::new(),
            logo_url: String::new(),
            disclaimer: String::new(),
            accent_color: String::new(),
        }
    }
}

impl Company {
    /// A profile counts as configured once it has a name and an address.
    /// Everything that prints an estimate needs both.
    pub fn is_configured(&self) -> bool {
        !self.name.trim().is_empty() && !self.address.trim().is_empty()
    }
}

/// Partial settings update. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_info: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
}

impl CompanyPatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

impl From<Company> for CompanyPatch {
    fn from(company: Company) -> Self {
        Self {
            name: Some(company.name),
            address: Some(company.address),
            contact_info: Some(company.contact_info),
            tax_id: Some(company.tax_id),
            logo_url: Some(company.logo_url),
            disclaimer: Some(company.disclaimer),
            accent_color: Some(company.accent_color),
        }
    }
}

/// Merge `patch` onto the stored profile, or onto an empty one when nothing
/// has been saved yet. The id is never taken from the patch.
pub fn apply_update(
    existing: Option<Company>,
    patch: CompanyPatch,
) -> Company {
    let mut company = existing.unwrap_or_default();

    let CompanyPatch {
        name,
        address,
        contact_info,
        tax_id,
        logo_url,
        disclaimer,
        accent_color,
    } = patch;

    if let Some(v) = name {
        company.name = v;
    }
    if let Some(v) = address {
        company.address = v;
    }
    if let Some(v) = contact_info {
        company.contact_info = v;
    }
    if let Some(v) = tax_id {
        company.tax_id = v;
    }
    if let Some(v) = logo_url {
        company.logo_url = v;
    }
    if let Some(v) = disclaimer {
        company.disclaimer = v;
    }
    if let Some(v) = accent_color {
        company.accent_color = v;
    }

    company
}
