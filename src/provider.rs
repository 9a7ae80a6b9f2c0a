use std::{cell::Cell, time::Duration};

use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, USER_AGENT},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::{
    coordinate::Coordinate,
    error::{Error, Result},
    snap::{ImageryResolver, SnapResult},
};

/// A round's answer location and the picture shown alongside it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Target {
    pub coordinate: Coordinate,
    pub image_url: Option<String>,
}

pub trait TargetProvider {
    fn fetch(&self) -> Result<Target>;
}

fn build_client(timeout: Duration) -> Result<Client> {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("geoscore/", env!("CARGO_PKG_VERSION"))),
    );
    Ok(Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()?)
}

/// Backend endpoint returning one random target per request.
pub struct HttpTargetProvider {
    client: Client,
    url: String,
}

impl HttpTargetProvider {
    pub fn new(url: &str, timeout: Duration) -> Result<HttpTargetProvider> {
        Ok(HttpTargetProvider {
            client: build_client(timeout)?,
            url: url.to_string(),
        })
    }
}

impl TargetProvider for HttpTargetProvider {
    fn fetch(&self) -> Result<Target> {
        let res_json: Value = self
            .client
            .get(&self.url)
            .send()?
            .error_for_status()?
            .json()?;
        debug!("target response: {res_json}");
        json_to_target(&res_json)
    }
}

fn json_to_target(json_response: &Value) -> Result<Target> {
    let lat = json_response["latitude"].as_f64();
    let lon = json_response["longitude"].as_f64();
    let (lat, lon) = match (lat, lon) {
        (Some(lat), Some(lon)) => (lat, lon),
        _ => {
            return Err(Error::MalformedTarget(format!(
                "missing latitude/longitude in {json_response}"
            )))
        }
    };
    let coordinate =
        Coordinate::new(lat, lon).map_err(|e| Error::MalformedTarget(e.to_string()))?;
    Ok(Target {
        coordinate,
        image_url: json_response["imageUrl"].as_str().map(str::to_string),
    })
}

/// Street View metadata style lookup: `?location=lat,lng&radius=r&key=k`.
pub struct HttpImageryResolver {
    client: Client,
    url: String,
    key: String,
}

impl HttpImageryResolver {
    pub fn new(url: &str, key: &str, timeout: Duration) -> Result<HttpImageryResolver> {
        Ok(HttpImageryResolver {
            client: build_client(timeout)?,
            url: url.to_string(),
            key: key.to_string(),
        })
    }
}

impl ImageryResolver for HttpImageryResolver {
    fn resolve(&self, target: Coordinate, radius_m: f64) -> Result<SnapResult> {
        let location = format!("{},{}", target.lat(), target.lon());
        let radius = format!("{}", radius_m.round() as u64);
        let params = [
            ("location", location.as_str()),
            ("radius", radius.as_str()),
            ("key", self.key.as_str()),
        ];
        let res_json: Value = self
            .client
            .get(&self.url)
            .query(&params)
            .send()?
            .error_for_status()?
            .json()?;
        json_to_snap(&res_json)
    }
}

fn json_to_snap(json_response: &Value) -> Result<SnapResult> {
    match json_response["status"].as_str() {
        Some("OK") => {
            let loc = &json_response["location"];
            match (loc["lat"].as_f64(), loc["lng"].as_f64()) {
                (Some(lat), Some(lng)) => Ok(SnapResult::Snapped(Coordinate::new(lat, lng)?)),
                _ => Err(Error::Imagery("OK status without location".to_string())),
            }
        }
        Some("ZERO_RESULTS") | Some("NOT_FOUND") => Ok(SnapResult::NotFound),
        Some(other) => Err(Error::Imagery(format!("status {other}"))),
        None => Err(Error::Imagery("missing status".to_string())),
    }
}

/// Cycles through a fixed list of targets.
pub struct FixedTargets {
    targets: Vec<Target>,
    next: Cell<usize>,
}

impl FixedTargets {
    pub fn new(targets: Vec<Target>) -> FixedTargets {
        FixedTargets {
            targets,
            next: Cell::new(0),
        }
    }
}

impl TargetProvider for FixedTargets {
    fn fetch(&self) -> Result<Target> {
        if self.targets.is_empty() {
            return Err(Error::MalformedTarget("no targets configured".to_string()));
        }
        let idx = self.next.get() % self.targets.len();
        self.next.set(idx + 1);
        Ok(self.targets[idx].clone())
    }
}
