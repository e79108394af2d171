//! Estimate identifiers.
//!
//! Ids look like `EST-001`: a fixed prefix, a dash and a decimal sequence
//! number padded to at least three digits. The number is allocated by the
//! repository from a persisted counter, cross-checked against the ids
//! already stored so a hand-edited collection never yields a duplicate.

use tracing::warn;

pub const ESTIMATE_ID_PREFIX: &str = "EST";

/// Sentinel id the client sends for an estimate that has never been saved.
pub const NEW_ESTIMATE_ID: &str = "new";

/// `EST-7` -> `EST-007`, `EST-1234` -> `EST-1234`.
pub fn format_estimate_id(number: u64) -> String {
    format!("{ESTIMATE_ID_PREFIX}-{number:03}")
}

/// Sequence number of a well-formed id, `None` for anything else.
pub fn parse_estimate_number(id: &str) -> Option<u64> {
    let (prefix, digits) = id.split_once('-')?;
    if prefix != ESTIMATE_ID_PREFIX
        || digits.is_empty()
        || !digits.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    digits.parse().ok()
}

/// True for ids the client uses to mean "not stored yet".
pub fn is_new_estimate_id(id: &str) -> bool {
    let id = id.trim();
    id.is_empty() || id.eq_ignore_ascii_case(NEW_ESTIMATE_ID)
}

/// Next sequence number given the last one handed out and the ids currently
/// stored. Ids that do not follow the `EST-NNN` shape are skipped.
pub fn next_estimate_number<'a, I>(
    existing_ids: I,
    last_issued: u64,
) -> u64
where
    I: IntoIterator<Item = &'a str>,
{
    let highest_stored = existing_ids
        .into_iter()
        .filter_map(|id| {
            let number = parse_estimate_number(id);
            if number.is_none() {
                warn!(id, "ignoring malformed estimate id while allocating the next one");
            }
            number
        })
        .max()
        .unwrap_or(0);

    highest_stored.max(last_issued) + 1
}
