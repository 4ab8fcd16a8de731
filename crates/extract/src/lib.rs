mod consts;
pub mod container;
pub mod error;
pub mod models;
mod xmp;

use exn::OptionExt;
use tracing::{instrument, warn};

pub use crate::consts::NAMESPACES;
use crate::container::Container;
use crate::error::{ErrorKind, Result};
use crate::models::{Record, Rendition};

/// Easy, top-level entrypoint for turning a downloaded rendition into a
/// [`Record`].
///
/// - Sniffs the container from its magic bytes (the detected container wins
///   over the one the rendition implies, with a warning), and
/// - Maps the embedded XMP packet onto the record.
///
/// Nothing partial is returned: a missing or unparsable packet fails the
/// whole asset.
#[instrument(skip(bytes), fields(size = bytes.len(), hash = %blake3::hash(bytes)))]
pub fn extract(source_url: &str, download_url: &str, rendition: Rendition, bytes: &[u8]) -> Result<Record> {
    let container = Container::detect(bytes).ok_or_raise(|| ErrorKind::UnsupportedContainer)?;
    if container != rendition.container() {
        warn!(expected = %rendition.container(), detected = %container, "container does not match requested rendition");
    }
    let raw = container.xmp_packet(bytes)?;
    let packet = xmp::packet_text(&raw)?;
    let mut record = Record::new(source_url, download_url);
    xmp::apply(packet, container, &mut record)?;
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::fixtures;
    use crate::xmp::samples;

    #[test]
    fn test_extract_tiff() {
        let bytes = fixtures::tiff_le(samples::TIFF_PACKET.as_bytes());
        let record = extract("https://foto/src", "https://foto/dl/ignored.tif", Rendition::Tif, &bytes).unwrap();
        assert_eq!(record.title, "Havna i Tromsø");
        assert_eq!(record.unique_name, "RA_PA-0611_U_0001");
        assert_eq!(record.source_url, "https://foto/src");
        assert_eq!(record.download_url, "https://foto/dl/ignored.tif");
    }

    #[test]
    fn test_extract_jpeg_uses_download_name() {
        let bytes = fixtures::jpeg(samples::JPEG_PACKET.as_bytes());
        let record = extract("https://foto/src", "https://foto/dl/RA%20X_1.jpg", Rendition::BigJpg, &bytes).unwrap();
        assert_eq!(record.unique_name, "RA X_1");
        assert_eq!(record.restriction, "Ja");
    }

    #[test]
    fn test_detected_container_wins() {
        // A JPEG answering a TIFF request still gets the JPEG element pass.
        let bytes = fixtures::jpeg(samples::JPEG_PACKET.as_bytes());
        let record = extract("s", "d", Rendition::Tif, &bytes).unwrap();
        assert_eq!(record.country, "Ukjent");
    }

    #[test]
    fn test_unsupported_container() {
        let err = extract("s", "d", Rendition::Tif, b"GIF89a...").unwrap_err();
        assert_eq!(*err, ErrorKind::UnsupportedContainer);
    }

    #[test]
    fn test_missing_payload() {
        let mut bytes = vec![0xFF, 0xD8];
        fixtures::segment(&mut bytes, 0xDA, &[0x00]);
        let err = extract("s", "d", Rendition::SmallJpg, &bytes).unwrap_err();
        assert_eq!(*err, ErrorKind::MissingPayload);
    }

    #[test]
    fn test_malformed_packet() {
        let bytes = fixtures::tiff_be(b"<x:xmpmeta><rdf:RDF></x:xmpmeta>");
        let err = extract("s", "d", Rendition::Tif, &bytes).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedXml(_)));
    }
}
