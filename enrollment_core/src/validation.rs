//! Field validation for registration drafts.
//!
//! Every check returns `RegistryError::Validation` with the message shown to
//! the operator. Checks run in form order and stop at the first failure.

use chrono::{DateTime, NaiveDate, Utc};

use crate::capture::data_uri::DataUri;
use crate::domain::{RegistrationDraft, ValidatedRegistration};
use crate::error::{RegistryError, Result};

/// Required length of a contact number after stripping non-digits.
pub const CONTACT_DIGITS: usize = 10;

/// Minimum candidate name length, in characters, after trimming.
pub const MIN_NAME_CHARS: usize = 2;

/// Wire/storage date format.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Strip every non-digit character and require exactly ten digits.
pub fn normalize_contact(raw: &str) -> Result<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() != CONTACT_DIGITS {
        return Err(RegistryError::Validation(
            "Please enter a valid 10-digit mobile number".to_string(),
        ));
    }
    Ok(digits)
}

pub fn validate_name(raw: &str) -> Result<String> {
    let name = raw.trim();
    if name.chars().count() < MIN_NAME_CHARS {
        return Err(RegistryError::Validation(format!(
            "Please enter a valid name (minimum {} characters)",
            MIN_NAME_CHARS
        )));
    }
    Ok(name.to_string())
}

pub fn parse_date(raw: &str) -> Result<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(RegistryError::Validation("Please select a date".to_string()));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
        RegistryError::Validation(format!("Invalid date {:?}: expected YYYY-MM-DD", raw))
    })
}

/// Trimmed, non-empty text or a validation error naming the field.
fn require(raw: &str, message: &str) -> Result<String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(RegistryError::Validation(message.to_string()));
    }
    Ok(value.to_string())
}

/// Empty is allowed (registration without a photo). Otherwise the payload
/// must be an image data URI.
pub fn validate_photo(raw: &str) -> Result<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(String::new());
    }
    let uri = DataUri::parse(raw).map_err(|e| RegistryError::InvalidPhoto(e.to_string()))?;
    if !uri.is_image() {
        return Err(RegistryError::InvalidPhoto(format!(
            "expected an image payload, got {}",
            uri.mime
        )));
    }
    Ok(raw.to_string())
}

/// Validate a raw draft in form order.
pub fn validate_draft(draft: &RegistrationDraft) -> Result<ValidatedRegistration> {
    let date = parse_date(&draft.date)?;
    let candidate_name = validate_name(&draft.candidate_name)?;
    let contact_no = normalize_contact(&draft.contact_no)?;
    let batch_id = require(&draft.batch_id, "Please select or enter a Batch ID")?;
    let trainer = require(&draft.trainer, "Please select or enter a Trainer")?;
    let photo = validate_photo(&draft.photo)?;

    let serial = draft.serial_no.trim();
    Ok(ValidatedRegistration {
        serial_no: (!serial.is_empty()).then(|| serial.to_string()),
        date,
        candidate_name,
        contact_no,
        batch_id,
        trainer,
        photo,
    })
}

/// Serial assigned when the operator leaves it blank.
pub fn generate_serial(now: DateTime<Utc>) -> String {
    format!("REG{}", now.timestamp_millis())
}

/// Long-form date for display, e.g. `October 16, 2026`.
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

// ---------------------------------------------------------------------------
// Form completion
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormCompletion {
    pub percent: u8,
    pub level: CompletionLevel,
}

/// Share of the five required fields plus the photo that are filled in.
/// Presence only; values are not validated here.
pub fn form_completion(draft: &RegistrationDraft) -> FormCompletion {
    let fields = [
        &draft.date,
        &draft.candidate_name,
        &draft.contact_no,
        &draft.batch_id,
        &draft.trainer,
        &draft.photo,
    ];
    let filled = fields.iter().filter(|f| !f.trim().is_empty()).count();
    let percent = ((filled * 100) as f64 / fields.len() as f64).round() as u8;

    let level = if percent < 30 {
        CompletionLevel::Low
    } else if percent < 70 {
        CompletionLevel::Medium
    } else {
        CompletionLevel::High
    };
    FormCompletion { percent, level }
}
