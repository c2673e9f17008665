//! RFC 1952 §2.3 magic bytes, method/flag bit layout.

pub const ID1: u8 = 0x1F;
pub const ID2: u8 = 0x8B;
pub const CM_DEFLATE: u8 = 0x08;

pub const FTEXT: u8 = 0x01;
pub const FHCRC: u8 = 0x02;
pub const FEXTRA: u8 = 0x04;
pub const FNAME: u8 = 0x08;
pub const FCOMMENT: u8 = 0x10;
pub const FRESERVED: u8 = 0xE0;

pub const OS_UNKNOWN: u8 = 0xFF;

/// `XFL`: 2 for maximum compression, 4 for fastest.
pub const XFL_BEST_SIZE: u8 = 2;
pub const XFL_BEST_SPEED: u8 = 4;
pub const XFL_DEFAULT: u8 = 0;
