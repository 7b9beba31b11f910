//! Session creation request validation.
//!
//! Every rule is checked and every violation collected, so a client gets the
//! complete list of problems in one response rather than one per round trip.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::common::RuleViolation;
use crate::domains::sessions::models::SportType;

/// Maximum description length in characters.
pub const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Maximum number of tags per session.
pub const MAX_TAG_COUNT: usize = 10;

/// Maximum length of a single tag in characters.
pub const MAX_TAG_LENGTH: usize = 30;

/// Session creation request body.
///
/// `sport_type` stays a raw string here so an unrecognized value surfaces as
/// a validation code instead of a deserialization fault.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub title: String,
    pub description: String,
    pub sport_type: String,
    pub latitude: f64,
    pub longitude: f64,
    pub date: DateTime<Utc>,
    pub min_participants: u32,
    pub max_participants: u32,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// A creation request that passed every rule.
///
/// Tags are normalized: trimmed and deduplicated with order preserved.
#[derive(Debug, Clone)]
pub struct ValidatedSession {
    pub title: String,
    pub description: String,
    pub sport_type: SportType,
    pub latitude: f64,
    pub longitude: f64,
    pub date: DateTime<Utc>,
    pub min_participants: u32,
    pub max_participants: u32,
    pub tags: Vec<String>,
}

/// Validate a creation request against `now`.
///
/// Rule order: title, description, sport type, coordinates, date,
/// participant bounds, tags. All violations are collected.
pub fn validate(
    request: &CreateSessionRequest,
    now: DateTime<Utc>,
) -> Result<ValidatedSession, Vec<RuleViolation>> {
    let mut violations = Vec::new();

    if request.title.trim().is_empty() {
        violations.push(RuleViolation::new("title.empty", "title must not be empty"));
    }

    if request.description.trim().is_empty() {
        violations.push(RuleViolation::new(
            "description.empty",
            "description must not be empty",
        ));
    } else if request.description.chars().count() > MAX_DESCRIPTION_LENGTH {
        violations.push(RuleViolation::new(
            "description.too_long",
            format!("description must be at most {MAX_DESCRIPTION_LENGTH} characters"),
        ));
    }

    let sport_type = match request.sport_type.parse::<SportType>() {
        Ok(sport_type) => Some(sport_type),
        Err(_) => {
            violations.push(RuleViolation::new(
                "sport_type.unknown",
                format!("unrecognized sport type: {}", request.sport_type),
            ));
            None
        }
    };

    if !(-90.0..=90.0).contains(&request.latitude) {
        violations.push(RuleViolation::new(
            "location.latitude_out_of_range",
            "latitude must be between -90 and 90",
        ));
    }
    if !(-180.0..=180.0).contains(&request.longitude) {
        violations.push(RuleViolation::new(
            "location.longitude_out_of_range",
            "longitude must be between -180 and 180",
        ));
    }

    if request.date <= now {
        violations.push(RuleViolation::new(
            "date.not_in_future",
            "session date must be in the future",
        ));
    }

    if request.min_participants < 1 {
        violations.push(RuleViolation::new(
            "participants.min_too_small",
            "minimum participants must be at least 1",
        ));
    }
    if request.max_participants < request.min_participants {
        violations.push(RuleViolation::new(
            "participants.min_exceeds_max",
            "maximum participants must not be below the minimum",
        ));
    }

    let tags = normalize_tags(&request.tags, &mut violations);

    match (violations.is_empty(), sport_type) {
        (true, Some(sport_type)) => Ok(ValidatedSession {
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            sport_type,
            latitude: request.latitude,
            longitude: request.longitude,
            date: request.date,
            min_participants: request.min_participants,
            max_participants: request.max_participants,
            tags,
        }),
        _ => Err(violations),
    }
}

/// Trim, drop duplicates (order preserved), enforce the count/length bounds.
fn normalize_tags(tags: &[String], violations: &mut Vec<RuleViolation>) -> Vec<String> {
    let mut normalized: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim();
        if tag.is_empty() || tag.chars().count() > MAX_TAG_LENGTH {
            violations.push(RuleViolation::new(
                "tags.invalid_tag",
                format!("tags must be non-empty and at most {MAX_TAG_LENGTH} characters"),
            ));
            continue;
        }
        if !normalized.iter().any(|existing| existing == tag) {
            normalized.push(tag.to_string());
        }
    }
    if normalized.len() > MAX_TAG_COUNT {
        violations.push(RuleViolation::new(
            "tags.too_many",
            format!("at most {MAX_TAG_COUNT} tags are allowed"),
        ));
    }
    normalized
}
