use regex::Regex;
use scraper::Selector;
use std::sync::LazyLock;

macro_rules! selector {
    ($name:ident, $css:expr) => {
        pub(crate) static $name: LazyLock<Selector> = LazyLock::new(|| Selector::parse($css).unwrap());
    };
}

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        pub(crate) static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

/// Hard limit on assets per rendition job, imposed by the archive.
pub const MAX_BATCH: usize = 4;

pub(crate) const SUBMIT_PATH: &str = "/fotoweb/me/background-tasks/";
pub(crate) const ASSET_LIST_JSON: &str = "application/vnd.fotoware.assetlist+json";
pub(crate) const DOWNLOAD_REQUEST_JSON: &str = "application/vnd.fotoware.download-request+json";
pub(crate) const DOWNLOAD_STATUS_JSON: &str = "application/vnd.fotoware.download-status+json, */*; q=0.01";
pub(crate) const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";
pub(crate) const JOB_DONE: &str = "done";

// Legacy HTML search results: one thumbnail per asset, and an <h1> once past the last page.
selector!(THUMBNAIL_SELECTOR, "a.js-link.thumbnail img.js-image");
selector!(END_MARKER_SELECTOR, "h1");
regex!(CACHE_IMAGE_REGEX, r"(?i)/fotoweb/cache/[0-9]{0,5}/Indekserte%20bilder/([^.]+)");
