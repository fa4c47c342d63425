mod common;

use std::cell::Cell;
use std::net::Ipv4Addr;

use common::*;
use pcap_sessions::*;

const T0: u64 = 1_650_000_000 * NS;

fn mixed_traffic() -> Vec<(u64, Vec<u8>)> {
    let client = [10, 1, 2, 3];
    let web = [151, 101, 1, 69];
    let dns = [9, 9, 9, 9];
    vec![
        (T0 + 100_000, udp_frame(client, 53000, dns, 53, 30)),
        (T0 + 200_000, tcp_frame(client, 50000, web, 443, TCP_SYN)),
        (T0 + 300_000, udp_frame(dns, 53, client, 53000, 90)),
        (T0 + 400_000, tcp_frame(web, 443, client, 50000, TCP_SYN | TCP_ACK)),
        (T0 + 500_000, tcp_frame(client, 50000, web, 443, TCP_ACK)),
        // same ports as the DNS exchange, different transport
        (T0 + 600_000, tcp_frame(client, 53000, dns, 53, TCP_SYN)),
        (T0 + 700_000, icmp_frame(client, web)),
        (T0 + 800_000, tcp_frame(client, 50001, web, 443, TCP_SYN)),
        (T0 + 900_000, tcp_frame(web, 443, client, 50000, TCP_FIN | TCP_ACK)),
        (T0 + 1_000_000, tcp_frame(client, 50000, web, 443, TCP_ACK)),
    ]
}

fn parse_with(parser: &CaptureParser, frames: &[(u64, Vec<u8>)]) -> CaptureReport {
    let capture = pcapng_capture(Endianness::Little, frames);
    parser
        .parse_reader(&capture[..], Some(capture.len() as u64), &mut NoProgress)
        .unwrap()
}

#[test]
fn both_directions_share_a_session() {
    let report = parse_with(&CaptureParser::default(), &mixed_traffic());
    assert_eq!(report.total_packets, 10);
    assert_eq!(report.total_sessions, 4);
    let ids: Vec<u64> = report.sessions.iter().map(|s| s.stream_id).collect();
    assert_eq!(ids, vec![1, 2, 3, 4]);

    let dns = &report.sessions[0];
    assert_eq!(dns.protocol, TransportProtocol::Udp);
    assert_eq!(dns.source_ip, Ipv4Addr::new(10, 1, 2, 3));
    assert_eq!(dns.destination_port, 53);
    assert_eq!(dns.packet_count, 2);

    let https = &report.sessions[1];
    assert_eq!(https.protocol, TransportProtocol::Tcp);
    assert_eq!(https.packet_count, 5);
    assert_eq!(https.source_port, 50000);
    assert_eq!(https.relative_start, 0.0001);
    assert_eq!(https.relative_end, 0.0009);
}

#[test]
fn protocol_is_part_of_the_session_key() {
    let report = parse_with(&CaptureParser::default(), &mixed_traffic());
    let on_53: Vec<&SessionRecord> = report
        .sessions
        .iter()
        .filter(|s| s.destination_port == 53)
        .collect();
    assert_eq!(on_53.len(), 2);
    assert_ne!(on_53[0].protocol, on_53[1].protocol);
}

#[test]
fn closed_only_after_fin_or_rst() {
    let report = parse_with(&CaptureParser::default(), &mixed_traffic());
    let closed: Vec<u64> = report
        .sessions
        .iter()
        .filter(|s| s.closed)
        .map(|s| s.stream_id)
        .collect();
    assert_eq!(closed, vec![2]);
    // UDP sessions are never closed
    assert!(!report.sessions[0].closed);
}

#[test]
fn relative_times_are_ordered() {
    let report = parse_with(&CaptureParser::default(), &mixed_traffic());
    for s in &report.sessions {
        assert!(0.0 <= s.relative_start);
        assert!(s.relative_start <= s.relative_end);
        assert!(s.relative_end <= report.capture_duration);
        assert!(s.start_time <= s.end_time);
    }
    let packets: u64 = report.sessions.iter().map(|s| s.packet_count).sum();
    // the ICMP frame has no session
    assert_eq!(packets, report.total_packets - 1);
}

#[test]
fn out_of_order_frames() {
    let frames = vec![
        (T0 + NS, udp_frame([10, 0, 0, 1], 1000, [8, 8, 8, 8], 53, 0)),
        (T0, udp_frame([8, 8, 8, 8], 53, [10, 0, 0, 1], 1000, 0)),
    ];
    let report = parse_with(&CaptureParser::default(), &frames);
    assert_eq!(report.capture_start_time, Some(1_650_000_000.0));
    assert_eq!(report.capture_duration, 1.0);
    let s = &report.sessions[0];
    assert_eq!(s.source_ip, Ipv4Addr::new(10, 0, 0, 1));
    assert_eq!(s.relative_start, 0.0);
    assert_eq!(s.relative_end, 1.0);
}

#[test]
fn locations_are_cached_across_parses() {
    let lookups = Cell::new(0);
    let locator = |ip: Ipv4Addr| {
        lookups.set(lookups.get() + 1);
        if ip == Ipv4Addr::new(9, 9, 9, 9) {
            return None;
        }
        Some(GeoLocation {
            country: "United States".to_owned(),
            country_code: "US".to_owned(),
            latitude: 37.7749,
            longitude: -122.4194,
            city: "San Francisco".to_owned(),
            isp: "Fastly".to_owned(),
        })
    };
    let cache = GeoCache::new();
    let parser = CaptureParser::default()
        .with_locator(&locator)
        .with_cache(&cache);

    let report = parse_with(&parser, &mixed_traffic());
    // 151.101.1.69 found, 9.9.9.9 not found
    assert_eq!(lookups.get(), 2);
    assert_eq!(cache.len(), 2);
    assert!(report.sessions[0].geolocation.is_none());
    let https = &report.sessions[1];
    assert_eq!(https.external_ip, Some(Ipv4Addr::new(151, 101, 1, 69)));
    assert_eq!(
        https.geolocation.as_ref().map(|g| g.country_code.as_str()),
        Some("US")
    );

    parse_with(&parser, &mixed_traffic());
    assert_eq!(lookups.get(), 2);

    cache.clear();
    parse_with(&parser, &mixed_traffic());
    assert_eq!(lookups.get(), 4);
}

#[test]
fn private_endpoints_are_not_located() {
    let lookups = Cell::new(0);
    let locator = |_: Ipv4Addr| -> Option<GeoLocation> {
        lookups.set(lookups.get() + 1);
        None
    };
    let frames = vec![
        (T0, tcp_frame([192, 168, 1, 10], 2000, [172, 16, 4, 1], 22, TCP_SYN)),
        (T0 + 1, udp_frame([100, 64, 0, 1], 123, [127, 0, 0, 1], 123, 48)),
    ];
    let report = parse_with(&CaptureParser::default().with_locator(&locator), &frames);
    assert_eq!(report.total_sessions, 2);
    assert!(report.sessions.iter().all(|s| s.external_ip.is_none()));
    assert_eq!(lookups.get(), 0);
}

#[test]
fn progress_is_monotonic_and_completes() {
    let capture = legacy_capture(Endianness::Big, false, &mixed_traffic());
    let mut updates: Vec<(u8, String)> = Vec::new();
    let mut progress = |p: u8, phase: &str| updates.push((p, phase.to_owned()));
    let config = ParserConfig {
        buffer_capacity: 128,
        ..ParserConfig::default()
    };
    CaptureParser::new(config)
        .parse_reader(&capture[..], Some(capture.len() as u64), &mut progress)
        .unwrap();
    assert!(updates.windows(2).all(|w| w[0].0 <= w[1].0));
    assert_eq!(updates.first().map(|u| u.1.as_str()), Some(PHASE_DETECT));
    assert_eq!(updates.last(), Some(&(100, PHASE_COMPLETE.to_owned())));
    assert!(updates
        .iter()
        .any(|(p, phase)| phase == PHASE_DECODE && *p > 5 && *p <= 85));
    assert!(updates
        .iter()
        .any(|(p, phase)| phase == PHASE_RESOLVE && *p >= 85 && *p < 100));
}

#[test]
fn report_serializes_to_json() {
    let locator = |_: Ipv4Addr| {
        Some(GeoLocation {
            country: "Switzerland".to_owned(),
            country_code: "CH".to_owned(),
            latitude: 47.37,
            longitude: 8.54,
            city: "Zurich".to_owned(),
            isp: "Quad9".to_owned(),
        })
    };
    let frames = vec![(T0, udp_frame([10, 1, 2, 3], 53000, [9, 9, 9, 9], 53, 30))];
    let report = parse_with(&CaptureParser::default().with_locator(&locator), &frames);
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["format"], "pcapng");
    assert_eq!(json["total_packets"], 1);
    assert_eq!(json["total_sessions"], 1);
    assert!(json["processed_at"].as_u64().unwrap() > 0);
    let s = &json["sessions"][0];
    assert_eq!(s["protocol"], "UDP");
    assert_eq!(s["destination_ip"], "9.9.9.9");
    assert_eq!(s["destination_port"], 53);
    assert_eq!(s["closed"], false);
    assert_eq!(s["geolocation"]["city"], "Zurich");
    assert_eq!(s["geolocation"]["country_code"], "CH");
}

#[test]
fn tracker_and_decoder_can_be_used_directly() {
    let mut tracker = SessionTracker::new();
    let frames = mixed_traffic();
    for (ts, data) in &frames {
        if let Some(headers) = decode_frame(data, Linktype::ETHERNET) {
            tracker.observe(&headers, Timestamp(*ts), data.len() as u32);
        }
    }
    assert_eq!(tracker.len(), 4);
    let https: &Flow = tracker.get(2).unwrap();
    assert_eq!(https.packet_count, 5);
    assert!(https.closed);
    assert!(tracker.get(5).is_none());
}
