//! Dig the embedded XMP packet out of TIFF and JPEG containers. TIFF goes
//! through the `tiff` decoder; JPEG only needs its marker segments walked.

mod jpeg;
mod tiff;

use std::borrow::Cow;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::consts;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Container {
    Tiff,
    Jpeg,
}
impl Container {
    /// Sniffs the container from its leading magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(&consts::TIFF_MAGIC_LE) || bytes.starts_with(&consts::TIFF_MAGIC_BE) {
            Some(Self::Tiff)
        } else if bytes.starts_with(&consts::JPEG_MAGIC) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }

    /// Raw XMP packet bytes, exactly as stored in the container. JPEG packets
    /// are borrowed from `bytes`; TIFF packets are read out by the decoder.
    pub fn xmp_packet<'b>(&self, bytes: &'b [u8]) -> Result<Cow<'b, [u8]>> {
        match self {
            Self::Tiff => tiff::xmp_packet(bytes).map(Cow::Owned),
            Self::Jpeg => jpeg::xmp_packet(bytes).map(Cow::Borrowed),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tiff => "TIFF",
            Self::Jpeg => "JPEG",
        }
    }
}
impl Display for Container {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(any(test, feature = "mock"))]
pub mod fixtures {
    //! Minimal synthetic containers wrapping an arbitrary XMP packet.

    use crate::consts;

    #[derive(Debug, Clone, Copy)]
    pub enum ByteOrder {
        Little,
        Big,
    }

    /// A decodable 1x1 greyscale TIFF; `xmp` becomes tag 700 as `(field type, bytes)`.
    pub fn tiff(order: ByteOrder, xmp: Option<(u16, &[u8])>) -> Vec<u8> {
        let u16_bytes = |value: u16| match order {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        let u32_bytes = |value: u32| match order {
            ByteOrder::Little => value.to_le_bytes(),
            ByteOrder::Big => value.to_be_bytes(),
        };
        // (tag, type, count, value or offset); SHORTs are left-justified.
        let short = |value: u16| {
            let [a, b] = u16_bytes(value);
            [a, b, 0, 0]
        };
        let count = if xmp.is_some() { 10 } else { 9 };
        let pixel = 8 + 2 + count * 12 + 4;
        let mut entries: Vec<(u16, u16, u32, [u8; 4])> = vec![
            (256, 3, 1, short(1)),
            (257, 3, 1, short(1)),
            (258, 3, 1, short(8)),
            (259, 3, 1, short(1)),
            (262, 3, 1, short(1)),
            (273, 4, 1, u32_bytes(pixel)),
            (277, 3, 1, short(1)),
            (278, 3, 1, short(1)),
            (279, 4, 1, u32_bytes(1)),
        ];
        if let Some((field_type, xmp)) = xmp {
            let mut value = [0; 4];
            if xmp.len() <= 4 {
                value[..xmp.len()].copy_from_slice(xmp);
            } else {
                value = u32_bytes(pixel + 1);
            }
            entries.push((consts::TIFF_TAG_XMP, field_type, xmp.len() as u32, value));
        }

        let mut out = match order {
            ByteOrder::Little => consts::TIFF_MAGIC_LE.to_vec(),
            ByteOrder::Big => consts::TIFF_MAGIC_BE.to_vec(),
        };
        out.extend_from_slice(&u32_bytes(8));
        out.extend_from_slice(&u16_bytes(entries.len() as u16));
        for (tag, field_type, count, value) in &entries {
            out.extend_from_slice(&u16_bytes(*tag));
            out.extend_from_slice(&u16_bytes(*field_type));
            out.extend_from_slice(&u32_bytes(*count));
            out.extend_from_slice(value);
        }
        out.extend_from_slice(&u32_bytes(0));
        out.push(0x80);
        if let Some((_, xmp)) = xmp.filter(|(_, xmp)| xmp.len() > 4) {
            out.extend_from_slice(xmp);
        }
        out
    }

    /// Little-endian TIFF with the packet typed BYTE.
    pub fn tiff_le(xmp: &[u8]) -> Vec<u8> {
        tiff(ByteOrder::Little, Some((1, xmp)))
    }

    /// Big-endian TIFF with the packet typed UNDEFINED.
    pub fn tiff_be(xmp: &[u8]) -> Vec<u8> {
        tiff(ByteOrder::Big, Some((7, xmp)))
    }

    /// Baseline JPEG: SOI, an APP0 (JFIF), an EXIF-style APP1, the XMP APP1, SOS.
    pub fn jpeg(xmp: &[u8]) -> Vec<u8> {
        let mut out = vec![0xFF, 0xD8];
        segment(&mut out, 0xE0, b"JFIF\0\x01\x01\0\0\x01\0\x01\0\0");
        segment(&mut out, 0xE1, b"Exif\0\0MM\0*");
        let mut payload = consts::XMP_APP1_SIGNATURE.to_vec();
        payload.extend_from_slice(xmp);
        segment(&mut out, 0xE1, &payload);
        segment(&mut out, 0xDA, &[0x01, 0x01, 0x00, 0x00, 0x3F, 0x00]);
        out.extend_from_slice(&[0x12, 0x34, 0xFF, 0x00, 0x56, 0xFF, 0xD9]);
        out
    }

    pub fn segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
        out.extend_from_slice(&[0xFF, marker]);
        out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
        out.extend_from_slice(payload);
    }
}
