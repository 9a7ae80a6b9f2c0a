//! Scoring core for a street-imagery location guessing game.
//!
//! A round fetches a target, snaps it to the nearest point with street-level
//! imagery, and scores the player's guess against the point that was shown:
//!
//! ```
//! use geoscore::{score_guess, Coordinate};
//!
//! let seoul = Coordinate::new(37.5665, 126.9780).unwrap();
//! let result = score_guess(seoul, seoul);
//! assert_eq!(result.score(), 5000);
//! ```

use std::{fs::File, io::BufReader, path::Path};

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub use cache::Cache;
pub use config::Config;
pub use coordinate::Coordinate;
pub use error::{Error, Result};
pub use provider::{FixedTargets, HttpImageryResolver, HttpTargetProvider, Target, TargetProvider};
pub use round::{Outcome, Round, RoundState};
pub use scorer::{compute_distance_km, compute_score, score_guess, RoundResult};
pub use session::Session;
pub use snap::{scoring_reference, CachedResolver, ImageryResolver, LocalImagery, SnapResult};

pub mod cache;
pub mod config;
pub mod coordinate;
pub mod error;
pub mod provider;
pub mod round;
pub mod scorer;
pub mod session;
pub mod snap;

/// Log to stderr, filtered by `RUST_LOG`.
pub fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("geoscore=debug")
    } else {
        EnvFilter::from_default_env()
    };
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read a JSON array of `{"lat": .., "lng": ..}` panorama locations.
pub fn load_panoramas(path: &Path) -> Result<Vec<Coordinate>> {
    let file = File::open(path)?;
    let raw: Vec<Coordinate> = serde_json::from_reader(BufReader::new(file))?;
    let panoramas = raw
        .into_iter()
        .map(Coordinate::validate)
        .collect::<Result<Vec<_>>>()?;
    info!("Loaded {} panoramas from {}", panoramas.len(), path.display());
    Ok(panoramas)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use tempfile::tempdir;

    #[test]
    fn load_panoramas_from_file() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("panoramas.json");
        fs::write(
            &path,
            r#"[{"lat": 37.5665, "lng": 126.978}, {"lat": 35.1796, "lng": 129.0756}]"#,
        )
        .unwrap();

        let panoramas = load_panoramas(&path).unwrap();

        assert_eq!(panoramas.len(), 2);
        assert_eq!(panoramas[1], Coordinate::new(35.1796, 129.0756).unwrap());
    }

    #[test]
    fn load_panoramas_rejects_invalid() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("panoramas.json");
        fs::write(&path, r#"[{"lat": 137.5, "lng": 0.0}]"#).unwrap();

        assert!(matches!(
            load_panoramas(&path),
            Err(Error::InvalidCoordinate(_))
        ));
        assert!(matches!(
            load_panoramas(&temp_dir.path().join("missing.json")),
            Err(Error::Io(_))
        ));
    }
}
