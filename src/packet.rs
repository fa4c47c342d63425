//! Link-layer frame decoding
//!
//! Frames are decoded down to the transport header: link layer (by link type), IPv4, then TCP,
//! UDP or ICMP. Only the fields needed to track sessions are extracted. Any frame that is not
//! IPv4, or whose headers are truncated or malformed, decodes to `None`.

use std::fmt;
use std::net::Ipv4Addr;

use nom::bytes::complete::take;
use nom::number::complete::{be_u16, be_u8};
use nom::IResult;
use serde::{Serialize, Serializer};

use crate::linktype::Linktype;

const ETHERNET_HEADER_LEN: usize = 14;
const VLAN_TAG_LEN: usize = 4;
const NULL_HEADER_LEN: usize = 4;
const SLL_HEADER_LEN: usize = 16;

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_VLAN: u16 = 0x8100;
const ETHERTYPE_QINQ: u16 = 0x88a8;

/// BSD address family for IPv4 in loopback headers
const AF_INET: u32 = 2;

const IPV4_MIN_HEADER_LEN: usize = 20;
const TCP_MIN_HEADER_LEN: usize = 20;
const UDP_HEADER_LEN: usize = 8;

const PROTO_ICMP: u8 = 1;
const PROTO_TCP: u8 = 6;
const PROTO_UDP: u8 = 17;

/// Transport protocol carried by an IPv4 packet
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum TransportProtocol {
    Tcp,
    Udp,
    Icmp,
    Other(u8),
}

impl TransportProtocol {
    pub fn from_ip_proto(proto: u8) -> TransportProtocol {
        match proto {
            PROTO_TCP => TransportProtocol::Tcp,
            PROTO_UDP => TransportProtocol::Udp,
            PROTO_ICMP => TransportProtocol::Icmp,
            n => TransportProtocol::Other(n),
        }
    }

    /// Returns true for the protocols that carry ports and form sessions
    pub fn has_ports(self) -> bool {
        matches!(self, TransportProtocol::Tcp | TransportProtocol::Udp)
    }
}

impl fmt::Display for TransportProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransportProtocol::Tcp => f.write_str("TCP"),
            TransportProtocol::Udp => f.write_str("UDP"),
            TransportProtocol::Icmp => f.write_str("ICMP"),
            TransportProtocol::Other(_) => f.write_str("OTHER"),
        }
    }
}

impl Serialize for TransportProtocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// TCP control flags relevant to session tracking
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct TcpFlags(pub u8);

impl TcpFlags {
    pub const FIN: TcpFlags = TcpFlags(0x01);
    pub const SYN: TcpFlags = TcpFlags(0x02);
    pub const RST: TcpFlags = TcpFlags(0x04);
    pub const ACK: TcpFlags = TcpFlags(0x10);

    const MASK: u8 = 0x01 | 0x02 | 0x04 | 0x10;

    #[inline]
    pub fn contains(self, other: TcpFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns true if the segment ends the connection (FIN or RST)
    #[inline]
    pub fn closes(self) -> bool {
        self.contains(TcpFlags::FIN) || self.contains(TcpFlags::RST)
    }
}

/// Network and transport fields of one frame
#[derive(Clone, Debug, PartialEq)]
pub struct ParsedHeaders {
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    /// 0 for protocols without ports
    pub src_port: u16,
    pub dst_port: u16,
    pub protocol: TransportProtocol,
    /// Always empty for protocols other than TCP
    pub tcp_flags: TcpFlags,
}

/// Decode the IPv4 and transport headers of a frame
///
/// Unknown link types are decoded as Ethernet.
pub fn decode_frame(data: &[u8], linktype: Linktype) -> Option<ParsedHeaders> {
    let ip = match linktype {
        Linktype::RAW | Linktype::IPV4 => data,
        Linktype::NULL | Linktype::LOOP => null_payload(data)?,
        Linktype::LINUX_SLL => sll_payload(data)?,
        _ => ethernet_payload(data)?,
    };
    decode_ipv4(ip)
}

/// Return the IPv4 payload of an Ethernet frame, skipping VLAN tags
fn ethernet_payload(data: &[u8]) -> Option<&[u8]> {
    if data.len() < ETHERNET_HEADER_LEN {
        return None;
    }
    let mut ethertype = u16::from_be_bytes([data[12], data[13]]);
    let mut payload = &data[ETHERNET_HEADER_LEN..];
    while ethertype == ETHERTYPE_VLAN || ethertype == ETHERTYPE_QINQ {
        if payload.len() < VLAN_TAG_LEN {
            return None;
        }
        ethertype = u16::from_be_bytes([payload[2], payload[3]]);
        payload = &payload[VLAN_TAG_LEN..];
    }
    if ethertype == ETHERTYPE_IPV4 {
        Some(payload)
    } else {
        None
    }
}

/// BSD loopback: 4-byte address family, in the byte order of the capturing host
fn null_payload(data: &[u8]) -> Option<&[u8]> {
    if data.len() < NULL_HEADER_LEN {
        return None;
    }
    let family = [data[0], data[1], data[2], data[3]];
    if u32::from_le_bytes(family) == AF_INET || u32::from_be_bytes(family) == AF_INET {
        Some(&data[NULL_HEADER_LEN..])
    } else {
        None
    }
}

/// Linux cooked capture: 16-byte header, protocol type at offset 14
fn sll_payload(data: &[u8]) -> Option<&[u8]> {
    if data.len() < SLL_HEADER_LEN {
        return None;
    }
    if u16::from_be_bytes([data[14], data[15]]) == ETHERTYPE_IPV4 {
        Some(&data[SLL_HEADER_LEN..])
    } else {
        None
    }
}

struct Ipv4Header {
    header_len: usize,
    frag_offset: u16,
    protocol: u8,
    src: Ipv4Addr,
    dst: Ipv4Addr,
}

fn parse_ipv4_address(i: &[u8]) -> IResult<&[u8], Ipv4Addr> {
    let (i, b) = take(4usize)(i)?;
    Ok((i, Ipv4Addr::new(b[0], b[1], b[2], b[3])))
}

fn parse_ipv4_header(i: &[u8]) -> IResult<&[u8], Ipv4Header> {
    let (i, version_ihl) = be_u8(i)?;
    let (i, _tos) = be_u8(i)?;
    let (i, _total_len) = be_u16(i)?;
    let (i, _id) = be_u16(i)?;
    let (i, flags_frag) = be_u16(i)?;
    let (i, _ttl) = be_u8(i)?;
    let (i, protocol) = be_u8(i)?;
    let (i, _checksum) = be_u16(i)?;
    let (i, src) = parse_ipv4_address(i)?;
    let (i, dst) = parse_ipv4_address(i)?;
    let header = Ipv4Header {
        header_len: usize::from(version_ihl & 0x0f) * 4,
        frag_offset: flags_frag & 0x1fff,
        protocol,
        src,
        dst,
    };
    if version_ihl >> 4 != 4 {
        return Err(nom::Err::Error(nom::error::Error::new(
            i,
            nom::error::ErrorKind::Verify,
        )));
    }
    Ok((i, header))
}

fn decode_ipv4(data: &[u8]) -> Option<ParsedHeaders> {
    let (_, ip) = parse_ipv4_header(data).ok()?;
    if ip.header_len < IPV4_MIN_HEADER_LEN || ip.header_len > data.len() {
        return None;
    }
    // only the first fragment carries the transport header
    if ip.frag_offset != 0 {
        return None;
    }
    let transport = &data[ip.header_len..];
    let protocol = TransportProtocol::from_ip_proto(ip.protocol);
    let mut headers = ParsedHeaders {
        src_ip: ip.src,
        dst_ip: ip.dst,
        src_port: 0,
        dst_port: 0,
        protocol,
        tcp_flags: TcpFlags::default(),
    };
    match protocol {
        TransportProtocol::Tcp => {
            if transport.len() < TCP_MIN_HEADER_LEN {
                return None;
            }
            let (_, (src_port, dst_port)) = parse_ports(transport).ok()?;
            headers.src_port = src_port;
            headers.dst_port = dst_port;
            headers.tcp_flags = TcpFlags(transport[13] & TcpFlags::MASK);
        }
        TransportProtocol::Udp => {
            if transport.len() < UDP_HEADER_LEN {
                return None;
            }
            let (_, (src_port, dst_port)) = parse_ports(transport).ok()?;
            headers.src_port = src_port;
            headers.dst_port = dst_port;
        }
        TransportProtocol::Icmp | TransportProtocol::Other(_) => (),
    }
    Some(headers)
}

fn parse_ports(i: &[u8]) -> IResult<&[u8], (u16, u16)> {
    let (i, src) = be_u16(i)?;
    let (i, dst) = be_u16(i)?;
    Ok((i, (src, dst)))
}
