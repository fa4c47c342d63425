use std::net::Ipv4Addr;
use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde::Deserialize;

use super::{GeoLocation, GeoLocator};

const FIELDS: &str = "status,country,countryCode,lat,lon,city,isp";

/// Settings of the ip-api.com client
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct IpApiConfig {
    /// Service endpoint; the address is appended to it
    pub base_url: String,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for IpApiConfig {
    fn default() -> Self {
        IpApiConfig {
            base_url: "http://ip-api.com/json/".to_owned(),
            timeout_ms: 5000,
            user_agent: "PCAP Parser/1.0".to_owned(),
        }
    }
}

/// Geolocation through the ip-api.com JSON service
///
/// Requests are blocking. Errors (transport, HTTP status, `"status": "fail"` answers, malformed
/// bodies) are logged at debug level and reported as a missing location.
pub struct IpApiLocator {
    client: Client,
    config: IpApiConfig,
}

impl IpApiLocator {
    pub fn new(config: IpApiConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(IpApiLocator { client, config })
    }

    fn url(&self, ip: Ipv4Addr) -> String {
        format!(
            "{}/{}?fields={}",
            self.config.base_url.trim_end_matches('/'),
            ip,
            FIELDS
        )
    }

    fn query(&self, ip: Ipv4Addr) -> Result<IpApiResponse, reqwest::Error> {
        self.client
            .get(self.url(ip))
            .send()?
            .error_for_status()?
            .json()
    }
}

impl GeoLocator for IpApiLocator {
    fn locate(&self, ip: Ipv4Addr) -> Option<GeoLocation> {
        match self.query(ip) {
            Ok(response) => {
                let location = location_from_response(response);
                if location.is_none() {
                    debug!("ip-api: no location for {}", ip);
                }
                location
            }
            Err(e) => {
                debug!("ip-api: lookup of {} failed: {}", ip, e);
                None
            }
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct IpApiResponse {
    status: String,
    country: String,
    country_code: String,
    lat: f64,
    lon: f64,
    city: String,
    isp: String,
}

fn location_from_response(response: IpApiResponse) -> Option<GeoLocation> {
    if response.status != "success" {
        return None;
    }
    Some(GeoLocation {
        country: response.country,
        country_code: response.country_code,
        latitude: response.lat,
        longitude: response.lon,
        city: response.city,
        isp: response.isp,
    })
}
