//! Geolocation of external endpoints
//!
//! Lookups go through the [`GeoLocator`] trait, so the HTTP client (feature `ip-api`) can be
//! replaced by any database or by a closure in tests. [`GeoCache`] memoizes results per address.

use std::collections::HashMap;
use std::net::Ipv4Addr;

use parking_lot::Mutex;
use serde::Serialize;

#[cfg(feature = "ip-api")]
mod ip_api;

#[cfg(feature = "ip-api")]
pub use ip_api::*;

/// Location of an IP address
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GeoLocation {
    pub country: String,
    pub country_code: String,
    pub latitude: f64,
    pub longitude: f64,
    pub city: String,
    pub isp: String,
}

/// Source of geolocation data
///
/// A lookup that fails for any reason returns `None`.
pub trait GeoLocator {
    fn locate(&self, ip: Ipv4Addr) -> Option<GeoLocation>;
}

impl<F> GeoLocator for F
where
    F: Fn(Ipv4Addr) -> Option<GeoLocation>,
{
    fn locate(&self, ip: Ipv4Addr) -> Option<GeoLocation> {
        self(ip)
    }
}

/// Per-address memo of geolocation results
///
/// Failed lookups are cached too, so an address is looked up at most once. The cache can be
/// shared between parses (and threads); the lock is not held while the locator runs, so two
/// concurrent lookups of the same new address may both reach the locator.
#[derive(Debug, Default)]
pub struct GeoCache {
    entries: Mutex<HashMap<Ipv4Addr, Option<GeoLocation>>>,
}

impl GeoCache {
    pub fn new() -> GeoCache {
        GeoCache::default()
    }

    /// Return the cached result for `ip`, calling `locator` on first use
    pub fn get_or_locate(&self, ip: Ipv4Addr, locator: &dyn GeoLocator) -> Option<GeoLocation> {
        if let Some(entry) = self.entries.lock().get(&ip) {
            return entry.clone();
        }
        let result = locator.locate(ip);
        self.entries
            .lock()
            .entry(ip)
            .or_insert(result)
            .clone()
    }

    /// Number of cached addresses (hits and misses)
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear()
    }
}

/// Returns true if `ip` belongs to a private or reserved IPv4 range
///
/// Covers RFC 1918 private networks, shared address space, loopback, link-local,
/// documentation and benchmarking networks, multicast, reserved space and broadcast.
pub fn is_private_or_reserved(ip: Ipv4Addr) -> bool {
    let [a, b, c, _] = ip.octets();
    match a {
        0 | 10 | 127 => true,
        100 => (64..128).contains(&b),
        169 => b == 254,
        172 => (16..32).contains(&b),
        192 => (b == 0 && (c == 0 || c == 2)) || b == 168,
        198 => b == 18 || b == 19 || (b == 51 && c == 100),
        203 => b == 0 && c == 113,
        224..=255 => true,
        _ => false,
    }
}
