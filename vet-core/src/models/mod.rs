mod company;
mod estimate;
mod estimate_id;

pub use company::{COMPANY_ID, Company, CompanyPatch, apply_update};
pub use estimate::{Estimate, EstimateInput, EstimateStatus, Gender, LineItem, Owner, Pet};
pub use estimate_id::{
    ESTIMATE_ID_PREFIX, NEW_ESTIMATE_ID, format_estimate_id, is_new_estimate_id,
    next_estimate_number, parse_estimate_number,
};
