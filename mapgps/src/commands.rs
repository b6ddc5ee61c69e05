//! Edits behind the command-line subcommands.
//!
//! Each function works on an open session and resolves names given on the
//! command line (route ids, spot names) before touching the document.

use log::{error, info, warn};
use mapgps_core::{EditorSession, FeatureId, LatLng, MapStats, MapSurface, NoticeLevel};
use serde::Serialize;

use crate::error::{MapGpsError, Result};

/// Log queued notices at their level.
pub fn flush_notices<S: MapSurface>(session: &mut EditorSession<S>) {
    for notice in session.drain_notices() {
        match notice.level {
            NoticeLevel::Success => info!("{}", notice.text),
            NoticeLevel::Warning => warn!("{}", notice.text),
            NoticeLevel::Error => error!("{}", notice.text),
        }
    }
}

/// Counts plus the document extent.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    #[serde(flatten)]
    pub stats: MapStats,
    /// `[south, west, north, east]` in degrees
    pub bounds: Option<[f64; 4]>,
}

pub fn stats_report<S: MapSurface>(session: &EditorSession<S>) -> StatsReport {
    let bounds = session
        .bounds()
        .map(|rect| [rect.min().y, rect.min().x, rect.max().y, rect.max().x]);
    StatsReport {
        stats: session.stats(),
        bounds,
    }
}

fn select_known_route<S: MapSurface>(session: &mut EditorSession<S>, route_id: &str) -> Result<()> {
    if !session.routes().contains(route_id) {
        return Err(MapGpsError::UnknownRoute(route_id.to_string()));
    }
    session.select_route(Some(route_id));
    Ok(())
}

fn select_spot_named<S: MapSurface>(session: &mut EditorSession<S>, name: &str) -> Result<()> {
    let index = session
        .spots()
        .spots()
        .iter()
        .position(|s| s.name == name)
        .ok_or_else(|| MapGpsError::UnknownSpot(name.to_string()))?;
    session.select_spot(Some(index));
    Ok(())
}

/// Renumber a route's waypoints by proximity.
pub fn optimize<S: MapSurface>(session: &mut EditorSession<S>, route_id: &str) -> Result<usize> {
    select_known_route(session, route_id)?;
    Ok(session.optimize_selected_route()?)
}

/// Remove all waypoints of a route.
pub fn clear_route<S: MapSurface>(session: &mut EditorSession<S>, route_id: &str) -> Result<usize> {
    select_known_route(session, route_id)?;
    Ok(session.clear_route()?)
}

/// Add a spot, optionally naming and categorising it right away.
pub fn add_spot<S: MapSurface>(
    session: &mut EditorSession<S>,
    position: LatLng,
    name: Option<&str>,
    category: Option<&str>,
) -> Result<FeatureId> {
    let id = session.add_spot(position)?;
    if let Some(name) = name {
        session.rename_spot(name)?;
    }
    if let Some(category) = category {
        session.set_spot_category(category)?;
    }
    Ok(id)
}

pub fn rename_spot<S: MapSurface>(
    session: &mut EditorSession<S>,
    current: &str,
    new_name: &str,
) -> Result<String> {
    select_spot_named(session, current)?;
    Ok(session.rename_spot(new_name)?)
}

pub fn delete_spot<S: MapSurface>(session: &mut EditorSession<S>, name: &str) -> Result<String> {
    select_spot_named(session, name)?;
    Ok(session.delete_spot()?)
}
