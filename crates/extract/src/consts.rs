//! XMP namespaces and container markers.

pub(crate) const NS_X: &str = "adobe:ns:meta/";
pub(crate) const NS_RDF: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub(crate) const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
pub(crate) const NS_FWC: &str = "http://ns.fotoware.com/iptcxmp-custom/1.0/";
pub(crate) const NS_FWU: &str = "http://ns.fotoware.com/iptcxmp-user/1.0/";
pub(crate) const NS_PHOTOSHOP: &str = "http://ns.adobe.com/photoshop/1.0/";
pub(crate) const NS_XMP_RIGHTS: &str = "http://ns.adobe.com/xap/1.0/rights/";

/// Prefix → URI table, exposed for diagnostics and for callers building
/// their own XMP fixtures.
pub const NAMESPACES: [(&str, &str); 7] = [
    ("x", NS_X),
    ("rdf", NS_RDF),
    ("dc", NS_DC),
    ("fwc", NS_FWC),
    ("fwu", NS_FWU),
    ("photoshop", NS_PHOTOSHOP),
    ("xmpRights", NS_XMP_RIGHTS),
];

/// Signature at the start of a JPEG APP1 payload carrying XMP.
pub(crate) const XMP_APP1_SIGNATURE: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

/// TIFF tag number holding the XMP packet.
pub(crate) const TIFF_TAG_XMP: u16 = 700;

pub(crate) const TIFF_MAGIC_LE: [u8; 4] = [0x49, 0x49, 0x2A, 0x00];
pub(crate) const TIFF_MAGIC_BE: [u8; 4] = [0x4D, 0x4D, 0x00, 0x2A];
pub(crate) const JPEG_MAGIC: [u8; 2] = [0xFF, 0xD8];
