//! Proximity discovery over the session store.
//!
//! Candidate filtering (requester exclusion, future date, optional radius)
//! happens before pagination so page boundaries and the has-more flag are
//! consistent with the filtered set, never with the raw store.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::cmp::Ordering;

use crate::common::{paginate, PageQuery, UserId, ValidatedPage};
use crate::domains::sessions::models::SessionEntity;

/// Mean Earth radius in kilometers for the spherical approximation.
const EARTH_RADIUS_KM: f64 = 6372.8;

/// Nearby-search query parameters.
///
/// The bounding policy is distance sort with an optional radius cutoff:
/// `radius_km = None` means no cutoff, results are simply nearest-first.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub radius_km: Option<f64>,
    pub page: Option<u32>,
    pub size: Option<u32>,
}

impl NearbyQuery {
    pub fn page_query(&self) -> PageQuery {
        PageQuery {
            page: self.page,
            size: self.size,
        }
    }
}

/// Great-circle distance in kilometers between two coordinate pairs,
/// using the haversine formula on a spherical Earth. City-scale
/// approximation, not a geodesic-exact computation.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let lat1 = lat1.to_radians();
    let lat2 = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + (d_lng / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Open sessions near an origin that the requester is not part of.
///
/// Excludes sessions the requester created or joined and sessions whose
/// date has passed, applies the optional radius cutoff, orders by ascending
/// distance (ties broken by id for stable pages), then slices one page.
pub fn nearby(
    sessions: Vec<SessionEntity>,
    requester: UserId,
    origin: (f64, f64),
    radius_km: Option<f64>,
    page: &ValidatedPage,
    now: DateTime<Utc>,
) -> (Vec<SessionEntity>, bool) {
    let mut candidates: Vec<(f64, SessionEntity)> = sessions
        .into_iter()
        .filter(|session| {
            !session.is_creator(requester)
                && !session.is_participant(requester)
                && !session.is_past(now)
        })
        .map(|session| {
            let distance = haversine_km(
                origin.0,
                origin.1,
                session.location.latitude,
                session.location.longitude,
            );
            (distance, session)
        })
        .filter(|(distance, _)| radius_km.map_or(true, |radius| *distance <= radius))
        .collect();

    candidates.sort_by(|(da, sa), (db, sb)| {
        da.partial_cmp(db)
            .unwrap_or(Ordering::Equal)
            .then_with(|| sa.id.cmp(&sb.id))
    });

    let ordered = candidates.into_iter().map(|(_, session)| session).collect();
    paginate(ordered, page)
}

/// Sessions the user created or joined, soonest date first.
pub fn for_user(
    sessions: Vec<SessionEntity>,
    user: UserId,
    page: &ValidatedPage,
) -> (Vec<SessionEntity>, bool) {
    let mut mine: Vec<SessionEntity> = sessions
        .into_iter()
        .filter(|session| session.is_creator(user) || session.is_participant(user))
        .collect();

    mine.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
    paginate(mine, page)
}
