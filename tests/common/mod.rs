//! In-memory capture builders shared by the integration tests
#![allow(dead_code)]

use pcap_sessions::Endianness;

pub const TCP_FIN: u8 = 0x01;
pub const TCP_SYN: u8 = 0x02;
pub const TCP_RST: u8 = 0x04;
pub const TCP_ACK: u8 = 0x10;

pub const NS: u64 = 1_000_000_000;

fn u16_bytes(en: Endianness, v: u16) -> [u8; 2] {
    match en {
        Endianness::Little => v.to_le_bytes(),
        Endianness::Big => v.to_be_bytes(),
    }
}

fn u32_bytes(en: Endianness, v: u32) -> [u8; 4] {
    match en {
        Endianness::Little => v.to_le_bytes(),
        Endianness::Big => v.to_be_bytes(),
    }
}

fn ipv4_header(src: [u8; 4], dst: [u8; 4], proto: u8, payload_len: usize) -> Vec<u8> {
    let total_len = (20 + payload_len) as u16;
    let mut h = vec![0x45, 0x00];
    h.extend_from_slice(&total_len.to_be_bytes());
    h.extend_from_slice(&[0x00, 0x01, 0x40, 0x00, 0x40, proto, 0x00, 0x00]);
    h.extend_from_slice(&src);
    h.extend_from_slice(&dst);
    h
}

fn ethernet(ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let mut f = vec![0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb];
    f.extend_from_slice(&ethertype.to_be_bytes());
    f.extend_from_slice(payload);
    f
}

/// Ethernet + IPv4 + TCP frame
pub fn tcp_frame(src: [u8; 4], sport: u16, dst: [u8; 4], dport: u16, flags: u8) -> Vec<u8> {
    let mut tcp = Vec::new();
    tcp.extend_from_slice(&sport.to_be_bytes());
    tcp.extend_from_slice(&dport.to_be_bytes());
    tcp.extend_from_slice(&[0, 0, 0, 1, 0, 0, 0, 0, 0x50, flags, 0x04, 0x00, 0, 0, 0, 0]);
    let mut ip = ipv4_header(src, dst, 6, tcp.len());
    ip.extend(tcp);
    ethernet(0x0800, &ip)
}

/// Ethernet + IPv4 + UDP frame, with `payload_len` bytes of payload
pub fn udp_frame(
    src: [u8; 4],
    sport: u16,
    dst: [u8; 4],
    dport: u16,
    payload_len: usize,
) -> Vec<u8> {
    let mut udp = Vec::new();
    udp.extend_from_slice(&sport.to_be_bytes());
    udp.extend_from_slice(&dport.to_be_bytes());
    udp.extend_from_slice(&((8 + payload_len) as u16).to_be_bytes());
    udp.extend_from_slice(&[0, 0]);
    udp.resize(8 + payload_len, 0xab);
    let mut ip = ipv4_header(src, dst, 17, udp.len());
    ip.extend(udp);
    ethernet(0x0800, &ip)
}

/// Ethernet + IPv4 + ICMP echo request
pub fn icmp_frame(src: [u8; 4], dst: [u8; 4]) -> Vec<u8> {
    let icmp = [8u8, 0, 0, 0, 0, 1, 0, 1];
    let mut ip = ipv4_header(src, dst, 1, icmp.len());
    ip.extend_from_slice(&icmp);
    ethernet(0x0800, &ip)
}

/// Ethernet ARP request
pub fn arp_frame() -> Vec<u8> {
    ethernet(0x0806, &[0u8; 28])
}

/// Legacy pcap file, Ethernet link type. Timestamps are given in nanoseconds.
pub fn legacy_capture(en: Endianness, nanosecond: bool, frames: &[(u64, Vec<u8>)]) -> Vec<u8> {
    let magic: u32 = if nanosecond { 0xa1b2_3c4d } else { 0xa1b2_c3d4 };
    let mut out = Vec::new();
    out.extend_from_slice(&u32_bytes(en, magic));
    out.extend_from_slice(&u16_bytes(en, 2));
    out.extend_from_slice(&u16_bytes(en, 4));
    out.extend_from_slice(&u32_bytes(en, 0));
    out.extend_from_slice(&u32_bytes(en, 0));
    out.extend_from_slice(&u32_bytes(en, 65535));
    out.extend_from_slice(&u32_bytes(en, 1));
    for (ts, data) in frames {
        let frac = if nanosecond { ts % NS } else { (ts % NS) / 1000 };
        out.extend_from_slice(&u32_bytes(en, (ts / NS) as u32));
        out.extend_from_slice(&u32_bytes(en, frac as u32));
        out.extend_from_slice(&u32_bytes(en, data.len() as u32));
        out.extend_from_slice(&u32_bytes(en, data.len() as u32));
        out.extend_from_slice(data);
    }
    out
}

/// pcapng file builder
pub struct PcapNgBuilder {
    en: Endianness,
    out: Vec<u8>,
}

impl PcapNgBuilder {
    /// Start a capture with a section header
    pub fn new(en: Endianness) -> PcapNgBuilder {
        let mut b = PcapNgBuilder {
            en,
            out: Vec::new(),
        };
        b.section(en);
        b
    }

    /// Start a new section, possibly switching byte order
    pub fn section(&mut self, en: Endianness) -> &mut Self {
        self.en = en;
        let mut body = Vec::new();
        body.extend_from_slice(&u32_bytes(en, 0x1a2b_3c4d));
        body.extend_from_slice(&u16_bytes(en, 1));
        body.extend_from_slice(&u16_bytes(en, 0));
        body.extend_from_slice(&[0xff; 8]);
        self.block(0x0a0d_0d0a, &body)
    }

    /// Add an interface; `tsresol` is the raw `if_tsresol` option
    pub fn interface(&mut self, linktype: u16, tsresol: Option<u8>) -> &mut Self {
        let en = self.en;
        let mut body = Vec::new();
        body.extend_from_slice(&u16_bytes(en, linktype));
        body.extend_from_slice(&[0, 0]);
        body.extend_from_slice(&u32_bytes(en, 65535));
        if let Some(r) = tsresol {
            body.extend_from_slice(&u16_bytes(en, 9));
            body.extend_from_slice(&u16_bytes(en, 1));
            body.extend_from_slice(&[r, 0, 0, 0]);
            body.extend_from_slice(&[0, 0, 0, 0]);
        }
        self.block(1, &body)
    }

    /// Add an enhanced packet; `ticks` are in the interface resolution
    pub fn packet(&mut self, if_id: u32, ticks: u64, data: &[u8]) -> &mut Self {
        let en = self.en;
        let mut body = Vec::new();
        body.extend_from_slice(&u32_bytes(en, if_id));
        body.extend_from_slice(&u32_bytes(en, (ticks >> 32) as u32));
        body.extend_from_slice(&u32_bytes(en, ticks as u32));
        body.extend_from_slice(&u32_bytes(en, data.len() as u32));
        body.extend_from_slice(&u32_bytes(en, data.len() as u32));
        body.extend_from_slice(data);
        self.block(6, &body)
    }

    /// Add a block of any type; the body is padded to 32 bits
    pub fn block(&mut self, block_type: u32, body: &[u8]) -> &mut Self {
        let en = self.en;
        let padded = (body.len() + 3) & !3;
        let len = (12 + padded) as u32;
        self.out.extend_from_slice(&u32_bytes(en, block_type));
        self.out.extend_from_slice(&u32_bytes(en, len));
        self.out.extend_from_slice(body);
        self.out.resize(self.out.len() + padded - body.len(), 0);
        self.out.extend_from_slice(&u32_bytes(en, len));
        self
    }

    /// Append raw bytes
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.out.extend_from_slice(bytes);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        self.out.clone()
    }
}

/// pcapng file with one Ethernet interface in microseconds. Timestamps are given in nanoseconds.
pub fn pcapng_capture(en: Endianness, frames: &[(u64, Vec<u8>)]) -> Vec<u8> {
    let mut b = PcapNgBuilder::new(en);
    b.interface(1, Some(6));
    for (ts, data) in frames {
        b.packet(0, ts / 1000, data);
    }
    b.build()
}
