//! Description and filename templating.
//!
//! Wiki markup is full of `{{ }}`, so the [upon] engine runs with its own
//! delimiters: `<[ expr ]>` for expressions and `<% block %>` for control
//! flow. Everything else in a template is emitted untouched.
//!
//! # Template Variables
//!
//! | Variable          | Type           | Description                                           |
//! |-------------------|----------------|-------------------------------------------------------|
//! | `title`           | `String`       | Photograph title                                      |
//! | `description`     | `String`       | Free-text description                                 |
//! | `institution`     | `String`       | Archive institution                                   |
//! | `collection`      | `String`       | Archive (collection) name                             |
//! | `place`           | `String`       | City, region and country, comma-joined                |
//! | `city`, `region`, `country` | `String` | Individual place parts, "unknown" already blanked |
//! | `keywords`        | `List<String>` | First keyword as-is, the rest lowercased              |
//! | `date`            | `String`       | `YYYY-MM-DD` when recognised, else verbatim           |
//! | `dated`           | `bool`         | Whether `date` is non-empty                           |
//! | `source`          | `String`       | Human-facing archive URL                              |
//! | `accession`       | `String`       | Archive reference                                     |
//! | `remarks`         | `String`       | Additional information                                |
//! | `original_format` | `String`       | Format of the physical original                       |
//! | `author`          | `String`       | Creator line                                          |
//! | `licenses`        | `String`       | License templates, concatenated                       |
//! | `categories`      | `String`       | Category links, concatenated                          |
//! | `unique_name`     | `String`       | Archive-assigned unique name                          |
//! | `extension`       | `String`       | Destination extension, including the dot              |
//!
//! The `join` formatter comma-joins a list, skipping empty items:
//! `<[ keywords | join ]>`.

use exn::ResultExt;
use upon::{Engine, Syntax, Template};

use crate::error::{ErrorKind, Result};

/// Commons `{{Information}}` page, Norwegian description first.
pub const DEFAULT_DESCRIPTION_TEMPLATE: &str = "=={{int:filedesc}}==
{{Information
|description     = {{nb|1= Bildet er hentet fra Arkivverket.
<[ description ]>
* Arkivinstitusjon: <[ institution ]>
* Arkivnavn: <[ collection ]>
* Sted: <[ place ]>
* Emneord: <[ keywords | join ]>
* Avbildet:
}}
<% if dated %>|date            = {{ISOdate|<[ date ]>}}<% else %>|date            = <% endif %>
|source          = [<[ source ]> foto.digitalarkivet.no]<br/>Arkivreferanse: <[ accession ]><br/>{{institution:Arkivverket}}
|author          = <[ author ]>
|permission      =
|other_versions  =
}}

=={{int:license-header}}==
<[ licenses ]><[ categories ]>";

pub const DEFAULT_FILENAME_TEMPLATE: &str = "<[ title ]> (<[ unique_name ]>)<[ extension ]>";

/// Compiled description and filename templates, sharing one engine.
pub struct Templates {
    engine: Engine<'static>,
    description: Template<'static>,
    filename: Template<'static>,
}
impl Templates {
    /// Compiles both templates, falling back to the defaults where no override
    /// is given. Syntax errors surface here rather than at render time.
    pub fn new(description: Option<&str>, filename: Option<&str>) -> Result<Self> {
        let syntax = Syntax::builder().expr("<[", "]>").block("<%", "%>").build();
        let mut engine = Engine::with_syntax(syntax);
        addons::configure(&mut engine);
        let description = engine
            .compile(description.unwrap_or(DEFAULT_DESCRIPTION_TEMPLATE).to_string())
            .or_raise(|| ErrorKind::Template)?;
        let filename =
            engine.compile(filename.unwrap_or(DEFAULT_FILENAME_TEMPLATE).to_string()).or_raise(|| ErrorKind::Template)?;
        Ok(Self { engine, description, filename })
    }

    pub fn defaults() -> Result<Self> {
        Self::new(None, None)
    }

    pub(crate) fn render_description(&self, parameters: &upon::Value) -> Result<String> {
        self.description.render(&self.engine, parameters).to_string().or_raise(|| ErrorKind::Template)
    }

    pub(crate) fn render_filename(&self, parameters: &upon::Value) -> Result<String> {
        self.filename.render(&self.engine, parameters).to_string().or_raise(|| ErrorKind::Template)
    }
}

/// Custom [`upon`] extensions for wiki text.
mod addons {
    use std::fmt::Write;
    use upon::{Engine, Value, fmt as upon_fmt};

    /// Comma-joins a list, skipping empty strings. Anything else is formatted
    /// as usual.
    fn join_formatter(f: &mut upon_fmt::Formatter<'_>, value: &Value) -> upon_fmt::Result {
        match value {
            Value::List(items) => {
                let mut first = true;
                for item in items {
                    if matches!(item, Value::String(s) if s.is_empty()) {
                        continue;
                    }
                    if !first {
                        f.write_str(", ")?;
                    }
                    upon_fmt::default(f, item)?;
                    first = false;
                }
            },
            v => upon_fmt::default(f, v)?,
        };
        Ok(())
    }

    fn lowercase(s: &str) -> String {
        s.to_lowercase()
    }

    /// Registers the `join` formatter and `lower` function on the given engine.
    pub(crate) fn configure(engine: &mut Engine<'_>) {
        engine.add_formatter("join", join_formatter);
        engine.add_function("lower", lowercase);
    }
}
