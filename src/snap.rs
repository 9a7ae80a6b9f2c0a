//! Resolving a target to the nearest point with street-level imagery.
//!
//! The player is shown imagery centred on the snapped point, so the snapped
//! point is also what the guess is scored against. When nothing is found
//! within [`SNAP_RADIUS_M`] the round degrades and scores against the
//! original target.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{cache::Cache, coordinate::Coordinate, error::Result};

pub const SNAP_RADIUS_M: f64 = 200.0;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub enum SnapResult {
    Snapped(Coordinate),
    NotFound,
}

impl SnapResult {
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            SnapResult::Snapped(c) => Some(*c),
            SnapResult::NotFound => None,
        }
    }
}

/// Street-level imagery lookup.
pub trait ImageryResolver {
    fn resolve(&self, target: Coordinate, radius_m: f64) -> Result<SnapResult>;
}

/// The coordinate a guess must be scored against.
pub fn scoring_reference(target: Coordinate, snap: Option<&SnapResult>) -> Coordinate {
    snap.and_then(SnapResult::coordinate).unwrap_or(target)
}

/// Known panorama locations held in memory.
pub struct LocalImagery {
    panoramas: Vec<Coordinate>,
}

impl LocalImagery {
    pub fn new(panoramas: Vec<Coordinate>) -> LocalImagery {
        LocalImagery { panoramas }
    }

    pub fn panoramas(&self) -> &[Coordinate] {
        &self.panoramas
    }
}

impl ImageryResolver for LocalImagery {
    fn resolve(&self, target: Coordinate, radius_m: f64) -> Result<SnapResult> {
        let origin: Point<f64> = target.into();
        let mut nearest: Option<(f64, Coordinate)> = None;
        for pano in self.panoramas.iter() {
            let dist = Haversine::distance(origin, Point::from(*pano));
            if dist > radius_m {
                continue;
            }
            // first one wins on ties
            if nearest.map_or(true, |(best, _)| dist < best) {
                nearest = Some((dist, *pano));
            }
        }
        Ok(match nearest {
            Some((dist, pano)) => {
                debug!("Snapped {target} to {pano} ({dist:.1} m)");
                SnapResult::Snapped(pano)
            }
            None => SnapResult::NotFound,
        })
    }
}

/// Caches both outcomes of the wrapped resolver. Errors are not cached, and a
/// failed cache write still returns the resolved snap.
pub struct CachedResolver<R> {
    inner: R,
    cache: Cache,
}

impl<R: ImageryResolver> CachedResolver<R> {
    pub fn new(inner: R, cache: Cache) -> CachedResolver<R> {
        CachedResolver { inner, cache }
    }
}

impl<R: ImageryResolver> ImageryResolver for CachedResolver<R> {
    fn resolve(&self, target: Coordinate, radius_m: f64) -> Result<SnapResult> {
        let key = format!("{target}@{radius_m}");
        if let Some(snap) = self.cache.read_into::<SnapResult>(&key) {
            return Ok(snap);
        }
        info!("Snap cache miss for {key}");
        let snap = self.inner.resolve(target, radius_m)?;
        if let Err(e) = self.cache.write_from(&key, &snap) {
            warn!("Cannot cache snap for {key}: {e}");
        }
        Ok(snap)
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, fs};

    use super::*;
    use crate::error::Error;
    use tempfile::tempdir;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn reference_prefers_snapped_point() {
        let target = c(37.5665, 126.978);
        let snapped = c(37.5667, 126.9782);

        assert_eq!(
            scoring_reference(target, Some(&SnapResult::Snapped(snapped))),
            snapped
        );
        assert_eq!(scoring_reference(target, Some(&SnapResult::NotFound)), target);
        assert_eq!(scoring_reference(target, None), target);
    }

    #[test]
    fn local_picks_nearest_within_radius() {
        let target = c(37.5665, 126.978);
        let far = c(37.5700, 126.978); // ~390 m
        let mid = c(37.5675, 126.978); // ~111 m
        let near = c(37.5668, 126.978); // ~33 m
        let imagery = LocalImagery::new(vec![far, mid, near]);

        let snap = imagery.resolve(target, SNAP_RADIUS_M).unwrap();

        assert_eq!(snap, SnapResult::Snapped(near));
    }

    #[test]
    fn local_not_found_outside_radius() {
        let imagery = LocalImagery::new(vec![c(37.5700, 126.978)]);

        let snap = imagery.resolve(c(37.5665, 126.978), SNAP_RADIUS_M).unwrap();

        assert_eq!(snap, SnapResult::NotFound);
        assert_eq!(
            LocalImagery::new(vec![]).resolve(c(0.0, 0.0), SNAP_RADIUS_M).unwrap(),
            SnapResult::NotFound
        );
    }

    #[derive(Clone, Copy)]
    enum Reply {
        Found,
        Nothing,
        Fail,
    }

    struct Counting {
        calls: Cell<usize>,
        reply: Reply,
    }

    impl Counting {
        fn new(reply: Reply) -> Counting {
            Counting {
                calls: Cell::new(0),
                reply,
            }
        }
    }

    impl ImageryResolver for Counting {
        fn resolve(&self, target: Coordinate, _radius_m: f64) -> Result<SnapResult> {
            self.calls.set(self.calls.get() + 1);
            match self.reply {
                Reply::Found => Ok(SnapResult::Snapped(target)),
                Reply::Nothing => Ok(SnapResult::NotFound),
                Reply::Fail => Err(Error::Imagery("down".to_string())),
            }
        }
    }

    #[test]
    fn cached_resolver_hits_inner_once() {
        let temp_dir = tempdir().unwrap();
        let cache = Cache::new(temp_dir.path()).unwrap();
        let resolver = CachedResolver::new(Counting::new(Reply::Found), cache);
        let target = c(10.0, 20.0);

        let first = resolver.resolve(target, SNAP_RADIUS_M).unwrap();
        let second = resolver.resolve(target, SNAP_RADIUS_M).unwrap();

        assert_eq!(first, second);
        assert_eq!(resolver.inner.calls.get(), 1);
    }

    #[test]
    fn cached_resolver_does_not_cache_errors() {
        let temp_dir = tempdir().unwrap();
        let cache = Cache::new(temp_dir.path()).unwrap();
        let resolver = CachedResolver::new(Counting::new(Reply::Fail), cache);

        assert!(resolver.resolve(c(1.0, 2.0), SNAP_RADIUS_M).is_err());
        assert!(resolver.resolve(c(1.0, 2.0), SNAP_RADIUS_M).is_err());
        assert_eq!(resolver.inner.calls.get(), 2);
    }

    #[test]
    fn cached_resolver_caches_not_found() {
        let temp_dir = tempdir().unwrap();
        let cache = Cache::new(temp_dir.path()).unwrap();
        let resolver = CachedResolver::new(Counting::new(Reply::Nothing), cache);
        let target = c(-33.8688, 151.2093);

        let first = resolver.resolve(target, SNAP_RADIUS_M).unwrap();
        let second = resolver.resolve(target, SNAP_RADIUS_M).unwrap();

        assert_eq!(first, SnapResult::NotFound);
        assert_eq!(second, SnapResult::NotFound);
        assert_eq!(resolver.inner.calls.get(), 1);
    }

    #[test]
    fn cached_resolver_survives_cache_write_failure() {
        let temp_dir = tempdir().unwrap();
        let cache_dir = temp_dir.path().join("snap");
        let cache = Cache::new(&cache_dir).unwrap();
        // a plain file where the directory was makes every write fail
        fs::remove_dir(&cache_dir).unwrap();
        fs::write(&cache_dir, "").unwrap();
        let resolver = CachedResolver::new(Counting::new(Reply::Found), cache);
        let target = c(37.5665, 126.978);

        let snap = resolver.resolve(target, SNAP_RADIUS_M).unwrap();

        assert_eq!(snap, SnapResult::Snapped(target));
    }
}
