/// Flat metadata for one archival photograph, recovered from its XMP packet.
///
/// Every field defaults to empty. Extraction only fills what the embedded
/// metadata actually carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Record {
    /// `dc:title`, first alternative
    pub title: String,
    /// `dc:description`, first alternative
    pub description: String,
    /// `dc:creator` sequence, in order
    pub creators: Vec<String>,
    /// `dc:subject` bag
    pub keywords: Vec<String>,
    /// `dc:rights` followed by `xmpRights:UsageTerms`
    pub rights: Vec<String>,
    /// `photoshop:DateCreated`, free text
    pub date_created: String,
    /// `photoshop:Country`
    pub country: String,
    /// `photoshop:State`
    pub region: String,
    /// `photoshop:City`
    pub city: String,
    /// `CustomField1`, the physical original's format
    pub original_format: String,
    /// `CustomField17`, archive institution
    pub institution: String,
    /// `CustomField18`, archive (collection) name
    pub collection: String,
    /// `IF22a_aksesjonsnummer`, archive reference
    pub accession: String,
    /// `IF4b_kommentar`, additional information
    pub remarks: String,
    /// `UserDefined223`, or the download link's file stem
    pub unique_name: String,
    /// `UserDefined233`, "Ja" when the photograph is restricted
    pub restriction: String,
    /// Human-facing page on the archive
    pub source_url: String,
    /// Raw rendition download link
    pub download_url: String,
}
impl Record {
    pub fn new(source_url: impl Into<String>, download_url: impl Into<String>) -> Self {
        let download_url = download_url.into();
        Self {
            unique_name: unique_name(&download_url),
            source_url: source_url.into(),
            download_url,
            ..Self::default()
        }
    }
}

/// Derives the archive-assigned name from the last path segment of a download
/// link, percent-decoded and without its final extension.
///
/// ```
/// use d2c_extract::models::unique_name;
/// assert_eq!(unique_name("https://foto.example/cache/RA%20PA-0611_00042.tif"), "RA PA-0611_00042");
/// assert_eq!(unique_name("/a/b/c.d.jpg?size=2"), "c.d");
/// assert_eq!(unique_name(""), "");
/// ```
pub fn unique_name(download_url: &str) -> String {
    let path = download_url.split(['?', '#']).next().unwrap_or_default();
    let segment = path.trim_end_matches('/').rsplit('/').next().unwrap_or_default();
    let decoded = urlencoding::decode(segment).map(|s| s.into_owned()).unwrap_or_else(|_| segment.to_string());
    match decoded.rsplit_once('.') {
        Some((stem, _ext)) if !stem.is_empty() => stem.to_string(),
        _ => decoded,
    }
}
