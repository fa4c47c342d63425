//! # Session extraction from PCAP and PCAPNG captures
//!
//! This crate reads packet capture files (legacy pcap or pcapng, little or big-endian) and
//! rebuilds the TCP and UDP sessions they contain: endpoints, start and end times, packet and
//! byte counts, and whether the connection was closed. Sessions can be enriched with the location
//! of their external endpoint.
//!
//! The capture is streamed through a fixed-size buffer, and frame data is parsed without copies,
//! so large files can be processed in constant memory (plus the flow table).
//!
//! # Example
//!
//! ```rust,no_run
//! use pcap_sessions::{CaptureParser, GeoCache, GeoLocation, ParserConfig};
//! use std::net::Ipv4Addr;
//!
//! // any `Fn(Ipv4Addr) -> Option<GeoLocation>` can be used as a locator
//! let locator = |_ip: Ipv4Addr| -> Option<GeoLocation> { None };
//! let cache = GeoCache::new();
//! let report = CaptureParser::new(ParserConfig::default())
//!     .with_locator(&locator)
//!     .with_cache(&cache)
//!     .parse_file("assets/trace.pcap")
//!     .expect("could not parse capture");
//! println!("{} sessions in {}s", report.total_sessions, report.capture_duration);
//! ```
//!
//! # Lower-level access
//!
//! [`create_reader`] detects the capture format and returns a [`FrameReader`], which yields the
//! frames of the capture one at a time. [`decode_frame`] extracts IPv4 and transport headers from
//! a frame, and [`SessionTracker`] groups them into flows.
//!
//! With the `ip-api` feature, `IpApiLocator` queries the ip-api.com service.

mod capture;
mod config;
mod cursor;
mod detect;
mod endianness;
mod error;
mod linktype;
mod parser;
mod progress;
mod report;

pub mod geo;
pub mod packet;
pub mod pcap;
pub mod pcapng;
pub mod session;
pub mod traits;

pub use capture::*;
pub use config::*;
pub use cursor::*;
pub use detect::*;
pub use endianness::Endianness;
pub use error::*;
pub use geo::{is_private_or_reserved, GeoCache, GeoLocation, GeoLocator};
pub use linktype::*;
pub use packet::{decode_frame, ParsedHeaders, TcpFlags, TransportProtocol};
pub use parser::*;
pub use pcap::LegacyFrameReader;
pub use pcapng::BlockFrameReader;
pub use progress::*;
pub use report::*;
pub use session::{Flow, SessionTracker};
pub use traits::FrameReader;
