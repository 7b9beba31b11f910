use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{SessionId, UserId};
use crate::domains::location::Address;

/// Session - a time-boxed, location-anchored group activity.
///
/// The creator is always a participant; `participants.len()` never exceeds
/// `max_participants`. Mutation goes through `SessionService`, which
/// serializes operations per session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionEntity {
    pub id: SessionId,
    pub creator_id: UserId,
    pub participants: Vec<UserId>,
    pub title: String,
    pub description: String,
    pub sport_type: SportType,
    pub location: SessionLocation,
    pub date: DateTime<Utc>,
    pub min_participants: u32,
    pub max_participants: u32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl SessionEntity {
    pub fn is_creator(&self, user: UserId) -> bool {
        self.creator_id == user
    }

    pub fn is_participant(&self, user: UserId) -> bool {
        self.participants.contains(&user)
    }

    pub fn is_full(&self) -> bool {
        self.participants.len() as u32 >= self.max_participants
    }

    /// A session whose date has passed is closed: no joins, no discovery.
    pub fn is_past(&self, now: DateTime<Utc>) -> bool {
        self.date <= now
    }

    /// Build the API representation for a given requester.
    ///
    /// The participant list is included only when the requester is the
    /// creator or a current participant; for everyone else the field is
    /// absent (not empty), so discovery never leaks membership.
    pub fn to_dto(&self, requester: UserId) -> SessionDto {
        let participants = if self.is_creator(requester) || self.is_participant(requester) {
            Some(self.participants.clone())
        } else {
            None
        };

        SessionDto {
            id: self.id,
            creator_id: self.creator_id,
            participants,
            title: self.title.clone(),
            description: self.description.clone(),
            sport_type: self.sport_type,
            location: self.location.clone(),
            date: self.date,
            min_participants: self.min_participants,
            max_participants: self.max_participants,
            tags: self.tags.clone(),
            created_at: self.created_at,
        }
    }
}

/// Geographic point plus the denormalized reverse-geocoded address.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionLocation {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(flatten, default)]
    pub address: Option<Address>,
}

/// API representation of a session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub id: SessionId,
    pub creator_id: UserId,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub participants: Option<Vec<UserId>>,
    pub title: String,
    pub description: String,
    pub sport_type: SportType,
    pub location: SessionLocation,
    pub date: DateTime<Utc>,
    pub min_participants: u32,
    pub max_participants: u32,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Sport type enum - the closed set of recognized activities
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SportType {
    Soccer,
    Basketball,
    Tennis,
    Volleyball,
    Badminton,
    TableTennis,
    Running,
    Cycling,
    Swimming,
    Fitness,
}

impl SportType {
    /// Every recognized sport type, in declaration order.
    pub fn all() -> &'static [SportType] {
        &[
            SportType::Soccer,
            SportType::Basketball,
            SportType::Tennis,
            SportType::Volleyball,
            SportType::Badminton,
            SportType::TableTennis,
            SportType::Running,
            SportType::Cycling,
            SportType::Swimming,
            SportType::Fitness,
        ]
    }
}

impl std::fmt::Display for SportType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SportType::Soccer => write!(f, "soccer"),
            SportType::Basketball => write!(f, "basketball"),
            SportType::Tennis => write!(f, "tennis"),
            SportType::Volleyball => write!(f, "volleyball"),
            SportType::Badminton => write!(f, "badminton"),
            SportType::TableTennis => write!(f, "table_tennis"),
            SportType::Running => write!(f, "running"),
            SportType::Cycling => write!(f, "cycling"),
            SportType::Swimming => write!(f, "swimming"),
            SportType::Fitness => write!(f, "fitness"),
        }
    }
}

impl std::str::FromStr for SportType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "soccer" => Ok(SportType::Soccer),
            "basketball" => Ok(SportType::Basketball),
            "tennis" => Ok(SportType::Tennis),
            "volleyball" => Ok(SportType::Volleyball),
            "badminton" => Ok(SportType::Badminton),
            "table_tennis" => Ok(SportType::TableTennis),
            "running" => Ok(SportType::Running),
            "cycling" => Ok(SportType::Cycling),
            "swimming" => Ok(SportType::Swimming),
            "fitness" => Ok(SportType::Fitness),
            _ => Err(anyhow::anyhow!("Invalid sport type: {}", s)),
        }
    }
}
