use std::io::Cursor;

use exn::{OptionExt, ResultExt};
use tiff::decoder::{Decoder, Limits};
use tiff::tags::Tag;

use crate::consts;
use crate::error::{ErrorKind, Result};

const MALFORMED: ErrorKind = ErrorKind::MalformedContainer("TIFF");

/// Reads tag 700 from the first image directory.
pub(super) fn xmp_packet(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = Decoder::new(Cursor::new(bytes)).or_raise(|| MALFORMED)?.with_limits(Limits::unlimited());
    let value = decoder.find_tag(Tag::from_u16_exhaustive(consts::TIFF_TAG_XMP)).or_raise(|| MALFORMED)?;
    value.ok_or_raise(|| ErrorKind::MissingPayload)?.into_u8_vec().or_raise(|| MALFORMED)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures;
    use super::*;

    #[test]
    fn test_little_endian_packet() {
        let bytes = fixtures::tiff_le(b"<x:xmpmeta/>");
        assert_eq!(xmp_packet(&bytes).unwrap(), b"<x:xmpmeta/>");
    }

    #[test]
    fn test_big_endian_packet() {
        let bytes = fixtures::tiff_be(b"<x:xmpmeta xmlns:x='adobe:ns:meta/'/>");
        assert_eq!(xmp_packet(&bytes).unwrap(), b"<x:xmpmeta xmlns:x='adobe:ns:meta/'/>");
    }

    #[test]
    fn test_inline_value() {
        let bytes = fixtures::tiff_le(b"<a/>");
        assert_eq!(xmp_packet(&bytes).unwrap(), b"<a/>");
    }

    #[test]
    fn test_missing_tag() {
        let bytes = fixtures::tiff(fixtures::ByteOrder::Little, None);
        let err = xmp_packet(&bytes).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingPayload);
    }

    #[test]
    fn test_truncated_value() {
        let mut bytes = fixtures::tiff_le(b"<x:xmpmeta>......</x:xmpmeta>");
        bytes.truncate(bytes.len() - 5);
        let err = xmp_packet(&bytes).unwrap_err();
        assert_eq!(*err, MALFORMED);
    }

    #[test]
    fn test_ifd_offset_out_of_bounds() {
        let mut bytes = consts::TIFF_MAGIC_BE.to_vec();
        bytes.extend_from_slice(&0xFFFF_u32.to_be_bytes());
        let err = xmp_packet(&bytes).unwrap_err();
        assert_eq!(*err, MALFORMED);
    }
}
