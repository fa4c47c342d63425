//! Flow tracking
//!
//! A flow is a TCP or UDP conversation between two endpoints. Frames in both directions belong
//! to the same flow: both orientations of the key point to the same entry. The orientation of
//! the first frame seen is kept as the flow's source and destination.

use std::collections::HashMap;
use std::convert::TryFrom;
use std::net::Ipv4Addr;

use log::trace;

use crate::capture::Timestamp;
use crate::packet::{ParsedHeaders, TransportProtocol};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Endpoint {
    pub ip: Ipv4Addr,
    pub port: u16,
}

/// Directed flow key. A flow is registered under its key and the reversed key.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct FlowKey {
    pub protocol: TransportProtocol,
    pub src: Endpoint,
    pub dst: Endpoint,
}

impl FlowKey {
    pub fn from_headers(h: &ParsedHeaders) -> FlowKey {
        FlowKey {
            protocol: h.protocol,
            src: Endpoint {
                ip: h.src_ip,
                port: h.src_port,
            },
            dst: Endpoint {
                ip: h.dst_ip,
                port: h.dst_port,
            },
        }
    }

    pub fn reversed(&self) -> FlowKey {
        FlowKey {
            protocol: self.protocol,
            src: self.dst,
            dst: self.src,
        }
    }
}

/// A tracked conversation
#[derive(Clone, Debug, PartialEq)]
pub struct Flow {
    /// Sequential id, starting at 1, in order of first appearance
    pub id: u64,
    pub src: Endpoint,
    pub dst: Endpoint,
    pub protocol: TransportProtocol,
    pub start: Timestamp,
    pub end: Timestamp,
    pub packet_count: u64,
    pub byte_count: u64,
    /// Set once a TCP segment with FIN or RST was seen; never cleared
    pub closed: bool,
}

impl Flow {
    fn update(&mut self, ts: Timestamp, len: u32, closing: bool) {
        self.packet_count += 1;
        self.byte_count += u64::from(len);
        self.start = self.start.min(ts);
        self.end = self.end.max(ts);
        self.closed |= closing;
    }
}

/// Flow table
///
/// Flows are stored in order of creation, so that a flow id is its index plus one.
#[derive(Debug, Default)]
pub struct SessionTracker {
    flows: Vec<Flow>,
    index: HashMap<FlowKey, usize>,
}

impl SessionTracker {
    pub fn new() -> SessionTracker {
        SessionTracker::default()
    }

    /// Account one decoded frame
    ///
    /// Only TCP and UDP frames are tracked. Returns the id of the flow the frame belongs to.
    pub fn observe(&mut self, headers: &ParsedHeaders, ts: Timestamp, len: u32) -> Option<u64> {
        if !headers.protocol.has_ports() {
            return None;
        }
        let closing =
            headers.protocol == TransportProtocol::Tcp && headers.tcp_flags.closes();
        let key = FlowKey::from_headers(headers);
        let idx = match self.index.get(&key) {
            Some(&idx) => idx,
            None => {
                let idx = self.flows.len();
                let flow = Flow {
                    id: idx as u64 + 1,
                    src: key.src,
                    dst: key.dst,
                    protocol: key.protocol,
                    start: ts,
                    end: ts,
                    packet_count: 0,
                    byte_count: 0,
                    closed: false,
                };
                trace!(
                    "new {} flow {}: {}:{} -> {}:{}",
                    flow.protocol,
                    flow.id,
                    flow.src.ip,
                    flow.src.port,
                    flow.dst.ip,
                    flow.dst.port
                );
                self.flows.push(flow);
                self.index.insert(key, idx);
                self.index.insert(key.reversed(), idx);
                idx
            }
        };
        let flow = &mut self.flows[idx];
        flow.update(ts, len, closing);
        Some(flow.id)
    }

    /// Get a flow by id
    pub fn get(&self, id: u64) -> Option<&Flow> {
        let idx = usize::try_from(id.checked_sub(1)?).ok()?;
        self.flows.get(idx)
    }

    /// Flows, ordered by id
    pub fn flows(&self) -> &[Flow] {
        &self.flows
    }

    pub fn len(&self) -> usize {
        self.flows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flows.is_empty()
    }

    pub fn into_flows(self) -> Vec<Flow> {
        self.flows
    }
}
