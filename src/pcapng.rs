//! PCAPNG file format
//!
//! See <https://github.com/pcapng/pcapng> for details.
//!
//! ## File format and parsing
//!
//! A capture file is organized in blocks. Blocks are organized in sections, each section
//! starting with a Section Header Block (SHB), and followed by blocks (interface description,
//! statistics, packets, etc.).
//! A file is usually composed of one section, but can contain multiple sections. When a SHB is
//! encountered, this means a new section starts (and all information about previous section has to
//! be flushed, like interfaces).
//!
//! Only the blocks needed to rebuild sessions are decoded: section headers (byte order),
//! interface descriptions (link type and timestamp resolution) and enhanced packets. All other
//! block types are skipped using their declared length.
//!
//! ## Endianness
//!
//! The endianness of a block is indicated by the Section Header Block that started the section
//! containing this block. Since a file can contain several sections, a single file can contain
//! both endianness variants.

mod block;
mod enhanced_packet;
mod interface_description;
mod option;
mod reader;
mod section_header;
mod time;

pub use block::*;
pub use enhanced_packet::*;
pub use interface_description::*;
pub use option::*;
pub use reader::*;
pub use section_header::*;
pub use time::*;

/// Section Header Block magic
pub const SHB_MAGIC: u32 = 0x0A0D_0D0A;
/// Interface Description Block magic
pub const IDB_MAGIC: u32 = 0x0000_0001;
/// Enhanced Packet Block magic
pub const EPB_MAGIC: u32 = 0x0000_0006;
/// Block type 0 is reserved by the format; it is treated as an explicit end of capture
pub const END_MAGIC: u32 = 0x0000_0000;

/// Byte Order magic
pub const BOM_MAGIC: u32 = 0x1A2B_3C4D;
