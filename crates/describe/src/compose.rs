use d2c_extract::models::Record;
use tracing::{debug, instrument};

use crate::error::{ErrorKind, Result};
use crate::exclusion::ExclusionSet;
use crate::template::Templates;
use crate::{normalize, tables};

/// A rendered description page plus everything needed to upload it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Destination filename, without any `File:` namespace.
    pub filename: String,
    /// Wiki-markup description page.
    pub text: String,
    /// Extension the filename was rendered with, including the dot.
    pub extension: String,
    /// Edit summary for the upload.
    pub comment: String,
    /// Human-facing archive URL the description was built from.
    pub source_url: String,
}

impl Document {
    /// The `n`th alternative filename: `"<stem> <n><extension>"`.
    ///
    /// ```
    /// # use d2c_describe::Document;
    /// let document = Document {
    ///     filename: "Havna (RA_1).tif".into(),
    ///     text: String::new(),
    ///     extension: ".tif".into(),
    ///     comment: String::new(),
    ///     source_url: String::new(),
    /// };
    /// assert_eq!(document.numbered_filename(2), "Havna (RA_1) 2.tif");
    /// ```
    pub fn numbered_filename(&self, n: usize) -> String {
        match self.filename.strip_suffix(&self.extension) {
            Some(stem) if !self.extension.is_empty() => format!("{stem} {n}{}", self.extension),
            _ => format!("{} {n}", self.filename),
        }
    }
}

/// Result of composing one record. When `exclude` is set the document must
/// not be uploaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Composition {
    pub document: Document,
    pub exclude: bool,
}

/// Turns [`Record`]s into [`Document`]s.
pub struct Composer {
    templates: Templates,
}
impl Composer {
    pub fn new(templates: Templates) -> Self {
        Self { templates }
    }

    /// Composer using the built-in templates.
    pub fn with_defaults() -> Result<Self> {
        Ok(Self::new(Templates::defaults()?))
    }

    /// Builds the description and filename for `record`.
    ///
    /// A restricted record adds its source URL to `exclusions`, and any record
    /// whose source is already excluded comes back with `exclude` set.
    #[instrument(skip_all, fields(source = %record.source_url, unique_name = %record.unique_name))]
    pub fn compose(
        &self,
        record: &Record,
        extension: &str,
        comment: &str,
        exclusions: &mut ExclusionSet,
    ) -> Result<Composition> {
        let restricted = normalize::is_restricted(&record.restriction);
        if restricted && !record.source_url.is_empty() && exclusions.insert(record.source_url.as_str()) {
            debug!("restriction flag observed, source excluded for this run");
        }
        let exclude = restricted || exclusions.contains(&record.source_url);

        let parameters = Self::parameters(record, extension);
        let text = self.templates.render_description(&parameters)?;
        let rendered = self.templates.render_filename(&parameters)?;
        let filename = normalize::filename(&rendered);
        if filename.is_empty() || filename == extension {
            exn::bail!(ErrorKind::InvalidFilename(rendered));
        }
        Ok(Composition {
            document: Document {
                filename,
                text,
                extension: extension.to_string(),
                comment: comment.to_string(),
                source_url: record.source_url.clone(),
            },
            exclude,
        })
    }

    /// Builds the [`upon::Value`] map exposed to both templates.
    fn parameters(record: &Record, extension: &str) -> upon::Value {
        let city = normalize::place(&record.city);
        let region = normalize::place(&record.region);
        let country = normalize::place(&record.country);
        let place = [city, region, country].into_iter().filter(|p| !p.is_empty()).collect::<Vec<_>>().join(", ");
        let date = normalize::date(&record.date_created);
        upon::value! {
            title: record.title.trim(),
            description: record.description.as_str(),
            institution: record.institution.as_str(),
            collection: record.collection.as_str(),
            place: place,
            city: city,
            region: region,
            country: country,
            keywords: normalize::keywords(&record.keywords),
            dated: !date.is_empty(),
            categories: Self::categories(&record.collection, &date, country),
            date: date,
            source: record.source_url.as_str(),
            accession: record.accession.as_str(),
            remarks: record.remarks.as_str(),
            original_format: record.original_format.as_str(),
            author: normalize::author_line(&record.creators),
            licenses: normalize::licenses(&record.rights, country).concat(),
            unique_name: record.unique_name.as_str(),
            extension: extension,
        }
    }

    fn categories(collection: &str, date: &str, country: &str) -> String {
        let collection = collection.trim();
        let mut categories = if collection.is_empty() {
            tables::FALLBACK_CATEGORY.to_string()
        } else {
            format!("[[Category:{collection} (Arkivverket)]]")
        };
        if !date.is_empty()
            && let Some(country) = normalize::country_name(country)
        {
            let year: String = date.chars().take(4).collect();
            categories.push_str(&format!("[[Category:{year} in {country}]]"));
        }
        categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn record() -> Record {
        Record {
            title: "Havna i Tromsø".to_string(),
            description: "Dampskip ved kaia.".to_string(),
            creators: vec!["Hansen, Ole".to_string()],
            keywords: vec!["Havner".to_string(), "Dampskip".to_string()],
            rights: vec!["CC-BY".to_string(), "falt i det fri".to_string()],
            date_created: "1910:06:01".to_string(),
            country: "Norge".to_string(),
            region: "Troms".to_string(),
            city: "Tromsø".to_string(),
            institution: "Arkivverket".to_string(),
            collection: "Fotosamlingen etter Hansen".to_string(),
            accession: "RA/PA-0611".to_string(),
            unique_name: "RA_PA-0611_0001".to_string(),
            source_url: "https://foto.digitalarkivet.no/fotoweb/archives/5001/RA_PA-0611_0001.tif.info".to_string(),
            download_url: "https://foto.digitalarkivet.no/dl/RA_PA-0611_0001.tif".to_string(),
            ..Record::default()
        }
    }

    fn compose(record: &Record) -> Composition {
        Composer::with_defaults().unwrap().compose(record, ".tif", "test upload", &mut ExclusionSet::new()).unwrap()
    }

    #[test]
    fn test_default_description_layout() {
        let expected = "=={{int:filedesc}}==
{{Information
|description     = {{nb|1= Bildet er hentet fra Arkivverket.
Dampskip ved kaia.
* Arkivinstitusjon: Arkivverket
* Arkivnavn: Fotosamlingen etter Hansen
* Sted: Tromsø, Troms, Norge
* Emneord: Havner, dampskip
* Avbildet:
}}
|date            = {{ISOdate|1910-06-01}}
|source          = [https://foto.digitalarkivet.no/fotoweb/archives/5001/RA_PA-0611_0001.tif.info foto.digitalarkivet.no]<br/>Arkivreferanse: RA/PA-0611<br/>{{institution:Arkivverket}}
|author          = Ole Hansen
|permission      =
|other_versions  =
}}

=={{int:license-header}}==
{{CC BY 4.0}}{{PD-Norway70}}[[Category:Fotosamlingen etter Hansen (Arkivverket)]][[Category:1910 in Norway]]";
        assert_eq!(compose(&record()).document.text, expected);
    }

    #[test]
    fn test_filename() {
        let composition = compose(&record());
        assert_eq!(composition.document.filename, "Havna i Tromsø (RA_PA-0611_0001).tif");
        assert!(!composition.exclude);
    }

    #[test]
    fn test_filename_is_deterministic() {
        assert_eq!(compose(&record()).document.filename, compose(&record()).document.filename);
    }

    #[rstest]
    #[case("Ukjent")]
    #[case("UKJENT LAND")]
    #[case("unknown")]
    #[case("Unknown country")]
    fn test_unknown_country(#[case] country: &str) {
        let record = Record { country: country.to_string(), ..record() };
        let text = compose(&record).document.text;
        assert!(text.contains("* Sted: Tromsø, Troms\n"));
        assert!(!text.contains(" in Norway]]"));
        assert!(!text.contains("{{PD-Norway70}}"));
        assert!(text.contains("{{PD-old-70}}"));
    }

    #[test]
    fn test_empty_date() {
        let record = Record { date_created: String::new(), ..record() };
        let text = compose(&record).document.text;
        assert!(text.contains("\n|date            = \n"));
        assert!(!text.contains("[[Category:1910"));
    }

    #[test]
    fn test_bare_year_date() {
        let record = Record { date_created: "1935".to_string(), country: "Sverige".to_string(), ..record() };
        let text = compose(&record).document.text;
        assert!(text.contains("{{ISOdate|1935}}"));
        assert!(text.ends_with("[[Category:1935 in Sweden]]"));
    }

    #[test]
    fn test_fallback_category_and_unknown_author() {
        let record = Record {
            collection: String::new(),
            creators: vec!["Hansen, Ole".to_string(), "Ukjent".to_string()],
            ..record()
        };
        let text = compose(&record).document.text;
        assert!(text.contains("[[Category:Media from the National Archives of Norway]]"));
        assert!(text.contains("|author          = {{creator:unknown}}\n"));
    }

    #[test]
    fn test_restriction_excludes_source_for_the_run() {
        let composer = Composer::with_defaults().unwrap();
        let mut exclusions = ExclusionSet::new();
        let restricted = Record { restriction: "Ja".to_string(), ..record() };
        let composition = composer.compose(&restricted, ".tif", "", &mut exclusions).unwrap();
        assert!(composition.exclude);
        assert!(exclusions.contains(&restricted.source_url));

        let later = record();
        assert!(later.restriction.is_empty());
        let composition = composer.compose(&later, ".tif", "", &mut exclusions).unwrap();
        assert!(composition.exclude);
    }

    #[test]
    fn test_forbidden_filename_characters() {
        let record = Record { title: "Kart [nr. 3] #1".to_string(), ..record() };
        assert_eq!(compose(&record).document.filename, "Kart -nr. 3- -1 (RA_PA-0611_0001).tif");
    }

    #[test]
    fn test_empty_first_keyword_keeps_later_ones_lowercase() {
        let keywords = ["", "Fjord", "Båt"].map(str::to_string).to_vec();
        let record = Record { keywords, ..record() };
        assert!(compose(&record).document.text.contains("* Emneord: fjord, båt\n"));
    }

    #[test]
    fn test_path_separators_in_title() {
        let record = Record { title: "Oslo: Karl Johans gate 1/2 \\ 3".to_string(), ..record() };
        assert_eq!(compose(&record).document.filename, "Oslo- Karl Johans gate 1-2 - 3 (RA_PA-0611_0001).tif");
    }

    #[test]
    fn test_custom_filename_template() {
        let templates = Templates::new(None, Some("<[ unique_name ]><[ extension ]>")).unwrap();
        let composition =
            Composer::new(templates).compose(&record(), ".jpg", "", &mut ExclusionSet::new()).unwrap();
        assert_eq!(composition.document.filename, "RA_PA-0611_0001.jpg");
        assert_eq!(composition.document.numbered_filename(1), "RA_PA-0611_0001 1.jpg");
    }

    #[test]
    fn test_empty_filename_is_rejected() {
        let templates = Templates::new(None, Some("<[ extension ]>")).unwrap();
        let err = Composer::new(templates).compose(&record(), ".jpg", "", &mut ExclusionSet::new()).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidFilename(_)));
    }
}
