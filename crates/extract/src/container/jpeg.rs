use exn::OptionExt;

use crate::consts;
use crate::error::{ErrorKind, Result};

const MALFORMED: ErrorKind = ErrorKind::MalformedContainer("JPEG");

const APP1: u8 = 0xE1;
const SOS: u8 = 0xDA;
const EOI: u8 = 0xD9;

/// Markers that stand alone, without a length field.
fn is_standalone(marker: u8) -> bool {
    matches!(marker, 0x01 | 0xD0..=0xD8)
}

/// Scans the header segments (everything before the scan data) for the XMP
/// APP1 segment and returns its payload without the signature.
pub(super) fn xmp_packet(bytes: &[u8]) -> Result<&[u8]> {
    let mut pos = consts::JPEG_MAGIC.len();
    loop {
        if *bytes.get(pos).ok_or_raise(|| MALFORMED)? != 0xFF {
            exn::bail!(MALFORMED);
        }
        // Any number of 0xFF fill bytes may precede a marker.
        while bytes.get(pos + 1) == Some(&0xFF) {
            pos += 1;
        }
        let marker = *bytes.get(pos + 1).ok_or_raise(|| MALFORMED)?;
        if marker == SOS || marker == EOI {
            break;
        }
        if is_standalone(marker) {
            pos += 2;
            continue;
        }
        let length = bytes.get(pos + 2..pos + 4).ok_or_raise(|| MALFORMED)?;
        let length = u16::from_be_bytes([length[0], length[1]]) as usize;
        if length < 2 {
            exn::bail!(MALFORMED);
        }
        let payload = bytes.get(pos + 4..pos + 2 + length).ok_or_raise(|| MALFORMED)?;
        if marker == APP1
            && let Some(packet) = payload.strip_prefix(consts::XMP_APP1_SIGNATURE)
        {
            return Ok(packet);
        }
        pos += 2 + length;
    }
    exn::bail!(ErrorKind::MissingPayload);
}
