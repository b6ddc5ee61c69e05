//! Reading documents and writing exports.
//!
//! Export names encode the date and the latest counts:
//! `MapGPS-<yyyymmdd>_P<points>_R<routes>_S<spots>.geojson`.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use log::info;
use mapgps_core::{EditorConfig, EditorSession, HeadlessSurface, MapStats, MapSurface};

use crate::error::{MapGpsError, Result};

/// Where an export goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportTarget {
    /// Exactly this file
    File(PathBuf),
    /// An auto-named file in this directory
    Directory(PathBuf),
}

/// Load a GeoJSON file into a headless session.
pub fn open_document(path: &Path, config: EditorConfig) -> Result<EditorSession<HeadlessSurface>> {
    let text = fs::read_to_string(path).map_err(|e| MapGpsError::io(path, e))?;
    let mut session = EditorSession::new(HeadlessSurface::new(), config);
    session.load_str(&text)?;
    info!("[fileio] Opened {}", path.display());
    Ok(session)
}

pub fn export_file_name(date: NaiveDate, stats: &MapStats) -> String {
    format!(
        "MapGPS-{}_P{}_R{}_S{}.geojson",
        date.format("%Y%m%d"),
        stats.point_count,
        stats.route_count,
        stats.spot_count
    )
}

/// Write the session's document, naming directory exports with today's date.
pub fn export_session<S: MapSurface>(
    session: &mut EditorSession<S>,
    target: &ExportTarget,
) -> Result<PathBuf> {
    export_session_on(session, target, Local::now().date_naive())
}

/// Write the session's document, naming directory exports with `date`.
pub fn export_session_on<S: MapSurface>(
    session: &mut EditorSession<S>,
    target: &ExportTarget,
    date: NaiveDate,
) -> Result<PathBuf> {
    let text = session.export_json()?;
    let path = match target {
        ExportTarget::File(path) => path.clone(),
        ExportTarget::Directory(dir) => dir.join(export_file_name(date, &session.stats())),
    };
    fs::write(&path, text).map_err(|e| MapGpsError::io(&path, e))?;
    info!("[fileio] Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_file_name() {
        let stats = MapStats {
            file_count: 1,
            point_count: 12,
            route_count: 3,
            spot_count: 0,
        };
        let date = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        assert_eq!(
            export_file_name(date, &stats),
            "MapGPS-20240307_P12_R3_S0.geojson"
        );
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.geojson");
        assert!(matches!(
            open_document(&missing, EditorConfig::default()),
            Err(MapGpsError::Io { .. })
        ));
    }
}
