//! Mapping of an XMP (RDF/XML) packet onto a flat [`Record`].

use memchr::memmem;
use roxmltree::{Document, Node};
use tracing::{debug, trace};

use crate::consts::{NS_DC, NS_RDF, NS_XMP_RIGHTS};
use crate::container::Container;
use crate::error::{ErrorKind, Result};
use crate::models::{Field, Record};

/// Child elements that have dedicated lookups and must never be clobbered by
/// the generic element pass.
const RESERVED_ELEMENTS: [&str; 4] = ["title", "subject", "creator", "description"];

/// Locates the start of the packet and strips container padding, leaving
/// something an XML parser will accept.
pub(crate) fn packet_text(raw: &[u8]) -> Result<&str> {
    let start = [b"<?xpacket".as_slice(), b"<x:xmpmeta".as_slice(), b"<rdf:RDF".as_slice()]
        .into_iter()
        .filter_map(|needle| memmem::find(raw, needle))
        .min()
        .or_else(|| memchr::memchr(b'<', raw))
        .unwrap_or(raw.len());
    let end = raw.iter().rposition(|b| !matches!(b, 0 | b' ' | b'\t' | b'\r' | b'\n')).map_or(start, |i| i + 1);
    let packet = raw.get(start..end.max(start)).unwrap_or_default();
    if packet.is_empty() {
        exn::bail!(ErrorKind::MissingPayload);
    }
    std::str::from_utf8(packet).map_err(|err| ErrorKind::MalformedXml(err.to_string()).into())
}

/// Parses `packet` and fills `record` from every `rdf:Description` it holds.
///
/// Only fields present in the packet are touched. The element pass (scalar
/// properties written as child elements rather than attributes) only runs for
/// JPEG renditions, which is where the archive writes them that way.
pub(crate) fn apply(packet: &str, container: Container, record: &mut Record) -> Result<()> {
    let document = Document::parse(packet).map_err(|err| ErrorKind::MalformedXml(err.to_string()))?;
    let descriptions: Vec<Node> = document
        .descendants()
        .filter(|node| node.has_tag_name((NS_RDF, "Description")))
        .filter(|node| node.parent_element().is_some_and(|parent| parent.has_tag_name((NS_RDF, "RDF"))))
        .collect();
    debug!(descriptions = descriptions.len(), "parsed XMP packet");

    let mut rights = Vec::new();
    let mut usage_terms = Vec::new();
    for description in &descriptions {
        record.keywords.extend(list_items(description, NS_DC, "subject", "Bag"));
        record.creators.extend(list_items(description, NS_DC, "creator", "Seq"));
        rights.extend(list_items(description, NS_DC, "rights", "Alt"));
        usage_terms.extend(list_items(description, NS_XMP_RIGHTS, "UsageTerms", "Alt"));
        if record.title.is_empty()
            && let Some(title) = list_items(description, NS_DC, "title", "Alt").into_iter().next()
        {
            record.title = title;
        }
        if record.description.is_empty()
            && let Some(text) = list_items(description, NS_DC, "description", "Alt").into_iter().next()
        {
            record.description = text;
        }
    }
    record.rights.extend(rights);
    record.rights.extend(usage_terms);

    for description in &descriptions {
        for attribute in description.attributes() {
            if let Some(field) = Field::from_local_name(attribute.name())
                && field.assign(record, attribute.value())
            {
                trace!(field = attribute.name(), "assigned from attribute");
            }
        }
    }

    if container == Container::Jpeg {
        for description in &descriptions {
            for child in description.children().filter(Node::is_element) {
                let name = child.tag_name().name();
                if RESERVED_ELEMENTS.contains(&name) {
                    continue;
                }
                if let Some(field) = Field::from_local_name(name)
                    && let Some(value) = element_value(&child)
                    && field.assign(record, &value)
                {
                    trace!(field = name, "assigned from element");
                }
            }
        }
    }
    Ok(())
}

/// Non-empty `rdf:li` texts of `<ns:name><rdf:{kind}>...` under `description`,
/// in document order.
fn list_items(description: &Node, namespace: &str, name: &str, kind: &str) -> Vec<String> {
    description
        .children()
        .filter(|node| node.has_tag_name((namespace, name)))
        .flat_map(|property| property.children().filter(|node| node.has_tag_name((NS_RDF, kind))))
        .flat_map(|list| list.children().filter(|node| node.has_tag_name((NS_RDF, "li"))))
        .filter_map(|item| text_of(&item))
        .collect()
}

/// The element's own text, falling back to its first `rdf:li`.
fn element_value(element: &Node) -> Option<String> {
    text_of(element).or_else(|| {
        element
            .descendants()
            .find(|node| node.has_tag_name((NS_RDF, "li")))
            .and_then(|item| text_of(&item))
    })
}

fn text_of(node: &Node) -> Option<String> {
    let text: String = node.children().filter(Node::is_text).filter_map(|child| child.text()).collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
pub(crate) mod samples {
    /// Attribute-style packet, the way the archive writes its TIFF masters.
    pub const TIFF_PACKET: &str = r#"<?xpacket begin="" id="W5M0MpCehiHzreSzNTczkc9d"?>
<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about=""
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:photoshop="http://ns.adobe.com/photoshop/1.0/"
    xmlns:fwc="http://ns.fotoware.com/iptcxmp-custom/1.0/"
    xmlns:fwu="http://ns.fotoware.com/iptcxmp-user/1.0/"
    xmlns:fwr="http://ns.fotoware.com/iptcxmp-reserved/1.0/"
    xmlns:xmpRights="http://ns.adobe.com/xap/1.0/rights/"
    photoshop:DateCreated="1910-06-01"
    photoshop:Country="Norge"
    photoshop:State="Troms"
    photoshop:City="Tromsø"
    fwc:CustomField1="Glassplatenegativ"
    fwc:CustomField17="Arkivverket"
    fwc:CustomField18="Fotosamlingen etter Hansen"
    fwr:IF22a_aksesjonsnummer="RA/PA-0611/U/L0001"
    fwr:IF4b_kommentar=" "
    fwu:UserDefined223="RA_PA-0611_U_0001"
    fwu:UserDefined233="Nei"
    fwu:UserDefined999="ignored">
   <dc:title><rdf:Alt><rdf:li xml:lang="x-default">Havna i Tromsø</rdf:li></rdf:Alt></dc:title>
   <dc:description><rdf:Alt><rdf:li xml:lang="x-default">Dampskip ved kaia.</rdf:li></rdf:Alt></dc:description>
   <dc:creator><rdf:Seq><rdf:li>Hansen, Ole</rdf:li><rdf:li>Ukjent</rdf:li></rdf:Seq></dc:creator>
   <dc:subject><rdf:Bag><rdf:li>Havner</rdf:li><rdf:li>Dampskip</rdf:li></rdf:Bag></dc:subject>
   <dc:rights><rdf:Alt><rdf:li xml:lang="x-default">CC-BY</rdf:li></rdf:Alt></dc:rights>
   <xmpRights:UsageTerms><rdf:Alt><rdf:li xml:lang="x-default">Falt i det fri</rdf:li></rdf:Alt></xmpRights:UsageTerms>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>
<?xpacket end="w"?>"#;

    /// Element-style packet, the way the archive writes its JPEG renditions.
    pub const JPEG_PACKET: &str = r#"<x:xmpmeta xmlns:x="adobe:ns:meta/">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about=""
    xmlns:dc="http://purl.org/dc/elements/1.1/"
    xmlns:photoshop="http://ns.adobe.com/photoshop/1.0/"
    xmlns:fwc="http://ns.fotoware.com/iptcxmp-custom/1.0/"
    xmlns:fwu="http://ns.fotoware.com/iptcxmp-user/1.0/">
   <dc:title><rdf:Alt><rdf:li xml:lang="x-default">Gårdstun</rdf:li></rdf:Alt></dc:title>
   <photoshop:Country>Ukjent</photoshop:Country>
   <photoshop:DateCreated>1935</photoshop:DateCreated>
   <fwc:CustomField18><rdf:Alt><rdf:li>Samling etter Berg</rdf:li></rdf:Alt></fwc:CustomField18>
   <fwu:UserDefined233>Ja</fwu:UserDefined233>
   <fwu:description>should not land anywhere</fwu:description>
  </rdf:Description>
 </rdf:RDF>
</x:xmpmeta>"#;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record_from(packet: &str, container: Container) -> Record {
        let mut record = Record::default();
        apply(packet, container, &mut record).unwrap();
        record
    }

    #[test]
    fn test_dedicated_lookups() {
        let record = record_from(samples::TIFF_PACKET, Container::Tiff);
        assert_eq!(record.title, "Havna i Tromsø");
        assert_eq!(record.description, "Dampskip ved kaia.");
        assert_eq!(record.creators, vec!["Hansen, Ole", "Ukjent"]);
        assert_eq!(record.keywords, vec!["Havner", "Dampskip"]);
        assert_eq!(record.rights, vec!["CC-BY", "Falt i det fri"]);
    }

    #[test]
    fn test_attribute_pass() {
        let record = record_from(samples::TIFF_PACKET, Container::Tiff);
        assert_eq!(record.date_created, "1910-06-01");
        assert_eq!(record.country, "Norge");
        assert_eq!(record.region, "Troms");
        assert_eq!(record.city, "Tromsø");
        assert_eq!(record.original_format, "Glassplatenegativ");
        assert_eq!(record.institution, "Arkivverket");
        assert_eq!(record.collection, "Fotosamlingen etter Hansen");
        assert_eq!(record.accession, "RA/PA-0611/U/L0001");
        assert_eq!(record.unique_name, "RA_PA-0611_U_0001");
        assert_eq!(record.restriction, "Nei");
        // Whitespace placeholder is not a value.
        assert_eq!(record.remarks, "");
    }

    #[test]
    fn test_element_pass_runs_for_jpeg() {
        let record = record_from(samples::JPEG_PACKET, Container::Jpeg);
        assert_eq!(record.title, "Gårdstun");
        assert_eq!(record.country, "Ukjent");
        assert_eq!(record.date_created, "1935");
        assert_eq!(record.collection, "Samling etter Berg");
        assert_eq!(record.restriction, "Ja");
        assert_eq!(record.description, "");
    }

    #[test]
    fn test_element_pass_skipped_for_tiff() {
        let record = record_from(samples::JPEG_PACKET, Container::Tiff);
        assert_eq!(record.title, "Gårdstun");
        assert_eq!(record.country, "");
        assert_eq!(record.restriction, "");
    }

    #[test]
    fn test_fields_absent_from_packet_keep_defaults() {
        let mut record = Record::new("https://src", "https://dl/NAME.jpg");
        apply(samples::JPEG_PACKET, Container::Jpeg, &mut record).unwrap();
        assert_eq!(record.unique_name, "NAME");
        assert_eq!(record.source_url, "https://src");
        assert!(record.keywords.is_empty());
        assert!(record.city.is_empty());
    }

    #[test]
    fn test_malformed_xml() {
        let mut record = Record::default();
        let err = apply("<x:xmpmeta><rdf:RDF>", Container::Tiff, &mut record).unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedXml(_)));
    }

    #[rstest]
    #[case(b"\0\0<?xpacket begin=''?><a/>\0\0\0".as_slice(), "<?xpacket begin=''?><a/>")]
    #[case(b"junk<x:xmpmeta/>   \n".as_slice(), "<x:xmpmeta/>")]
    #[case(b"<a/>".as_slice(), "<a/>")]
    fn test_packet_text(#[case] raw: &[u8], #[case] expected: &str) {
        assert_eq!(packet_text(raw).unwrap(), expected);
    }

    #[test]
    fn test_packet_text_empty() {
        let err = packet_text(b"\0\0\0").unwrap_err();
        assert_eq!(*err, ErrorKind::MissingPayload);
    }

    #[test]
    fn test_packet_text_invalid_utf8() {
        let err = packet_text(b"<a>\xFF\xFE</a>").unwrap_err();
        assert!(matches!(&*err, ErrorKind::MalformedXml(_)));
    }
}
