//! Listing page parsers and the walkers that page through them. Pages are
//! fetched through a closure, so both can be tested against captured bodies.

use std::collections::HashSet;

use async_stream::stream;
use scraper::Html;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::AssetRefStream;
use crate::consts;
use crate::error::Result;
use crate::models::AssetRef;

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct JsonPage {
    pub assets: Vec<AssetRef>,
    pub next: Option<String>,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct HtmlPage {
    pub assets: Vec<AssetRef>,
    /// The page carried the end-of-results marker.
    pub last: bool,
}

#[derive(Deserialize)]
struct AssetList {
    #[serde(default)]
    data: Vec<AssetEntry>,
    #[serde(default)]
    paging: Option<Paging>,
}

#[derive(Deserialize)]
struct AssetEntry {
    #[serde(default)]
    href: Option<String>,
}

#[derive(Deserialize)]
struct Paging {
    #[serde(default)]
    next: Option<String>,
}

/// A body that doesn't parse is an empty page without a cursor.
pub(crate) fn parse_json_page(body: &str) -> JsonPage {
    let list: AssetList = match serde_json::from_str(body) {
        Ok(list) => list,
        Err(err) => {
            warn!(error = %err, "listing page is not an asset list");
            return JsonPage::default();
        },
    };
    JsonPage {
        assets: list
            .data
            .into_iter()
            .filter_map(|entry| entry.href)
            .filter(|href| !href.trim().is_empty())
            .map(AssetRef::from)
            .collect(),
        next: list.paging.and_then(|paging| paging.next).filter(|next| !next.trim().is_empty()),
    }
}

/// Harvests thumbnails of a legacy search page, mapping each cached preview
/// back to its asset under `archive_path`.
pub(crate) fn parse_html_page(body: &str, archive_path: &str) -> HtmlPage {
    let document = Html::parse_document(body);
    let assets = document
        .select(&consts::THUMBNAIL_SELECTOR)
        .filter_map(|img| img.value().attrs().find_map(|(_, value)| consts::CACHE_IMAGE_REGEX.captures(value)))
        .filter_map(|captures| captures.get(1).map(|m| m.as_str().to_string()))
        .map(|name| AssetRef::new(format!("{archive_path}{name}.tif.info")))
        .collect();
    HtmlPage { assets, last: document.select(&consts::END_MARKER_SELECTOR).next().is_some() }
}

/// Follows `paging.next` cursors from `query`, reading at most `page_limit`
/// pages. `fetch` gets the query or a cursor as given by the archive and
/// returns the page body.
pub(crate) fn walk_json<'a, F, Fut>(query: &'a str, page_limit: usize, mut fetch: F) -> AssetRefStream<'a>
where
    F: FnMut(String) -> Fut + Send + 'a,
    Fut: Future<Output = Result<String>> + Send + 'a,
{
    Box::pin(stream! {
        let mut seen = HashSet::new();
        let mut next = Some(query.to_string());
        for page in 0..page_limit {
            let Some(path) = next.take() else { break };
            let body = match fetch(path).await {
                Ok(body) => body,
                Err(err) => {
                    yield Err(err);
                    break;
                },
            };
            let parsed = parse_json_page(&body);
            debug!(page, assets = parsed.assets.len(), has_next = parsed.next.is_some(), "listing page");
            for asset in parsed.assets {
                if seen.insert(asset.clone()) {
                    yield Ok(asset);
                }
            }
            next = parsed.next;
        }
    })
}

/// Reads numbered legacy search pages until one carries the end marker or
/// `page_limit` pages have been read.
pub(crate) fn walk_html<'a, F, Fut>(
    query: &'a str,
    archive_path: &'a str,
    page_limit: usize,
    mut fetch: F,
) -> AssetRefStream<'a>
where
    F: FnMut(String) -> Fut + Send + 'a,
    Fut: Future<Output = Result<String>> + Send + 'a,
{
    Box::pin(stream! {
        let mut seen = HashSet::new();
        for page in 0..page_limit {
            let body = match fetch(html_page_query(query, page)).await {
                Ok(body) => body,
                Err(err) => {
                    yield Err(err);
                    break;
                },
            };
            let parsed = parse_html_page(&body, archive_path);
            debug!(page, assets = parsed.assets.len(), last = parsed.last, "listing page");
            for asset in parsed.assets {
                if seen.insert(asset.clone()) {
                    yield Ok(asset);
                }
            }
            if parsed.last {
                break;
            }
        }
    })
}

/// `query` with the zero-based page number appended.
pub(crate) fn html_page_query(query: &str, page: usize) -> String {
    let separator = if query.contains('?') { '&' } else { '?' };
    format!("{query}{separator}p={page}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use futures::StreamExt;
    use rstest::rstest;
    use std::collections::HashMap;

    fn served(pages: &[(&str, &str)]) -> HashMap<String, String> {
        pages.iter().map(|(path, body)| (path.to_string(), body.to_string())).collect()
    }

    fn refs(paths: &[&str]) -> Vec<AssetRef> {
        paths.iter().map(|path| AssetRef::from(*path)).collect()
    }

    const FIRST: &str = "/fotoweb/archives/5001/?q=havn";
    const SECOND: &str = "/fotoweb/archives/5001/?q=havn&p=1";

    fn json_pages() -> HashMap<String, String> {
        served(&[
            (FIRST, r#"{"data": [{"href": "/a"}, {"href": "/b"}], "paging": {"next": "/fotoweb/archives/5001/?q=havn&p=1"}}"#),
            (SECOND, r#"{"data": [{"href": "/b"}, {"href": "/c"}], "paging": {"next": ""}}"#),
        ])
    }

    const ARCHIVE_PATH: &str = "/fotoweb/archives/5001-Historiske-foto/Indekserte%20bilder/";

    #[test]
    fn test_json_page_with_cursor() {
        let body = r#"{
            "data": [{"href": "/fotoweb/archives/5001/A.tif.info"}, {"href": "/fotoweb/archives/5001/B.tif.info"}],
            "paging": {"prev": "", "next": "/fotoweb/archives/5001/?q=x&p=1", "first": "", "last": ""}
        }"#;
        let page = parse_json_page(body);
        assert_eq!(page.assets, vec![AssetRef::from("/fotoweb/archives/5001/A.tif.info"), AssetRef::from("/fotoweb/archives/5001/B.tif.info")]);
        assert_eq!(page.next.as_deref(), Some("/fotoweb/archives/5001/?q=x&p=1"));
    }

    #[rstest]
    #[case(r#"{"data": [{"href": "/a"}], "paging": {"next": ""}}"#)]
    #[case(r#"{"data": [{"href": "/a"}], "paging": null}"#)]
    #[case(r#"{"data": [{"href": "/a"}]}"#)]
    fn test_json_page_without_cursor(#[case] body: &str) {
        let page = parse_json_page(body);
        assert_eq!(page.assets, vec![AssetRef::from("/a")]);
        assert_eq!(page.next, None);
    }

    #[rstest]
    #[case("<html>Service Unavailable</html>")]
    #[case("")]
    #[case(r#"{"data": "nope"}"#)]
    fn test_malformed_json_page_is_empty(#[case] body: &str) {
        assert_eq!(parse_json_page(body), JsonPage::default());
    }

    #[rstest]
    #[case(10, &["/a", "/b", "/c"], &[FIRST, SECOND])]
    #[case(1, &["/a", "/b"], &[FIRST])]
    #[tokio::test]
    async fn test_json_walk(#[case] page_limit: usize, #[case] expected: &[&str], #[case] fetched: &[&str]) {
        let pages = json_pages();
        let mut requested = Vec::new();
        let results: Vec<Result<AssetRef>> = walk_json(FIRST, page_limit, |path| {
            requested.push(path.clone());
            let body = pages.get(&path).cloned();
            async move { body.ok_or_else(|| exn::Exn::from(ErrorKind::Status(404))) }
        })
        .collect()
        .await;
        let assets: Vec<AssetRef> = results.into_iter().map(Result::unwrap).collect();
        assert_eq!(assets, refs(expected));
        assert_eq!(requested, fetched);
    }

    #[tokio::test]
    async fn test_json_walk_stops_at_failed_page() {
        let mut pages = json_pages();
        pages.remove(SECOND);
        let results: Vec<Result<AssetRef>> = walk_json(FIRST, 10, |path| {
            let body = pages.get(&path).cloned();
            async move { body.ok_or_else(|| exn::Exn::from(ErrorKind::Status(503))) }
        })
        .collect()
        .await;
        assert_eq!(results.len(), 3);
        assert!(matches!(&results[1], Ok(asset) if asset.as_str() == "/b"));
        assert!(matches!(&results[2], Err(err) if **err == ErrorKind::Status(503)));
    }

    #[tokio::test]
    async fn test_html_walk_stops_at_end_marker() {
        let thumbnail = |name: &str| {
            format!(r#"<a class="js-link thumbnail"><img class="js-image" src="/fotoweb/cache/5001/Indekserte%20bilder/{name}.tif.jpg"></a>"#)
        };
        let pages: HashMap<String, String> = HashMap::from([
            (html_page_query(FIRST, 0), format!("<html><body>{}{}</body></html>", thumbnail("A"), thumbnail("B"))),
            (html_page_query(FIRST, 1), format!("<html><body><h1>Ingen treff</h1>{}{}</body></html>", thumbnail("B"), thumbnail("C"))),
            (html_page_query(FIRST, 2), format!("<html><body>{}</body></html>", thumbnail("D"))),
        ]);
        let mut requested = Vec::new();
        let results: Vec<Result<AssetRef>> = walk_html(FIRST, ARCHIVE_PATH, 10, |path| {
            requested.push(path.clone());
            let body = pages.get(&path).cloned();
            async move { body.ok_or_else(|| exn::Exn::from(ErrorKind::Status(404))) }
        })
        .collect()
        .await;
        let assets: Vec<AssetRef> = results.into_iter().map(Result::unwrap).collect();
        let expected = ["A", "B", "C"].map(|name| AssetRef::new(format!("{ARCHIVE_PATH}{name}.tif.info")));
        assert_eq!(assets, expected);
        assert_eq!(requested, vec![html_page_query(FIRST, 0), html_page_query(FIRST, 1)]);
    }

    #[test]
    fn test_html_page() {
        let body = r#"<html><body>
            <a class="js-link thumbnail" href="/x"><img class="js-image" src="/fotoweb/cache/5001/Indekserte%20bilder/RA_PA-0611_0001.tif.jpg"></a>
            <a class="js-link thumbnail" href="/y"><img class="js-image" data-src="/FotoWeb/Cache/12/indekserte%20bilder/RA_PA-0611_0002.tif.jpg"></a>
            <a class="js-link" href="/z"><img class="js-image" src="/fotoweb/cache/5001/Indekserte%20bilder/NOT_A_THUMB.jpg"></a>
            <a class="js-link thumbnail" href="/w"><img class="js-image" src="/elsewhere/logo.png"></a>
        </body></html>"#;
        let page = parse_html_page(body, ARCHIVE_PATH);
        assert_eq!(
            page.assets,
            vec![
                AssetRef::new(format!("{ARCHIVE_PATH}RA_PA-0611_0001.tif.info")),
                AssetRef::new(format!("{ARCHIVE_PATH}RA_PA-0611_0002.tif.info")),
            ]
        );
        assert!(!page.last);
    }

    #[test]
    fn test_html_end_marker() {
        let body = r#"<html><body><h1>Ingen treff</h1>
            <a class="js-link thumbnail"><img class="js-image" src="/fotoweb/cache/1/Indekserte%20bilder/LAST.tif.jpg"></a>
        </body></html>"#;
        let page = parse_html_page(body, ARCHIVE_PATH);
        assert!(page.last);
        assert_eq!(page.assets.len(), 1);
    }

    #[rstest]
    #[case("/fotoweb/archives/5001/?q=reinbeite*", 0, "/fotoweb/archives/5001/?q=reinbeite*&p=0")]
    #[case("/fotoweb/archives/5001/", 3, "/fotoweb/archives/5001/?p=3")]
    fn test_html_page_query(#[case] query: &str, #[case] page: usize, #[case] expected: &str) {
        assert_eq!(html_page_query(query, page), expected);
    }
}
