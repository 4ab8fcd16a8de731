use async_trait::async_trait;
use exn::ResultExt;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument};

use crate::error::{ErrorKind, Result};
use crate::repository::{MediaRepository, UploadReceipt, UploadRequest, UploadSource};

const FILE_NAMESPACE: &str = "File:";

/// [`MediaRepository`] speaking the MediaWiki action API.
///
/// Sessions are cookie based; call [`login()`](Self::login) with bot
/// password credentials before uploading.
pub struct MediaWikiRepository {
    client: Client,
    api_url: String,
    csrf_token: RwLock<Option<String>>,
}

impl MediaWikiRepository {
    /// Create a new repository for the `api.php` endpoint at `api_url`.
    pub fn new(api_url: impl Into<String>, user_agent: &str) -> Result<Self> {
        let client =
            Client::builder().user_agent(user_agent).cookie_store(true).build().or_raise(|| ErrorKind::Client)?;
        Ok(Self::with_client(client, api_url))
    }

    /// Create a repository with a shared reqwest client. The client must keep
    /// cookies for logins to stick.
    pub fn with_client(client: Client, api_url: impl Into<String>) -> Self {
        Self { client, api_url: api_url.into(), csrf_token: RwLock::new(None) }
    }

    /// Logs in with a bot password and fetches an edit token.
    #[instrument(skip(self, password), fields(api = %self.api_url))]
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let token = self.token("login").await?;
        let request = self.client.post(&self.api_url).form(&[
            ("action", "login"),
            ("lgname", username),
            ("lgpassword", password),
            ("lgtoken", token.as_str()),
            ("format", "json"),
            ("formatversion", "2"),
        ]);
        let value = self.send(request).await?;
        parse_login(&value)?;
        info!("logged in");
        let csrf = self.token("csrf").await?;
        *self.csrf_token.write().await = Some(csrf);
        Ok(())
    }

    async fn csrf_token(&self) -> Result<String> {
        if let Some(token) = self.csrf_token.read().await.as_ref() {
            return Ok(token.clone());
        }
        let token = self.token("csrf").await?;
        *self.csrf_token.write().await = Some(token.clone());
        Ok(token)
    }

    async fn token(&self, kind: &str) -> Result<String> {
        let value = self.query(&[("meta", "tokens"), ("type", kind)]).await?;
        value
            .pointer(&format!("/query/tokens/{kind}token"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| exn::Exn::from(ErrorKind::Decode(format!("missing {kind} token"))))
    }

    async fn query(&self, params: &[(&str, &str)]) -> Result<Value> {
        let request = self
            .client
            .get(&self.api_url)
            .query(&[("action", "query"), ("format", "json"), ("formatversion", "2")])
            .query(params);
        self.send(request).await
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value> {
        let response = request.send().await.or_raise(|| ErrorKind::Network(self.api_url.clone()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        let value: Value = response.json().await.map_err(|err| ErrorKind::Decode(err.to_string()))?;
        if let Some(message) = api_error(&value) {
            exn::bail!(ErrorKind::Rejected(message));
        }
        Ok(value)
    }
}

#[async_trait]
impl MediaRepository for MediaWikiRepository {
    fn name(&self) -> &str {
        &self.api_url
    }

    #[instrument(skip(self))]
    async fn exists(&self, filename: &str) -> Result<bool> {
        let title = format!("{FILE_NAMESPACE}{filename}");
        let value = self.query(&[("titles", title.as_str())]).await?;
        parse_exists(&value)
    }

    #[instrument(skip(self))]
    async fn page_text(&self, filename: &str) -> Result<Option<String>> {
        let title = format!("{FILE_NAMESPACE}{filename}");
        let value = self
            .query(&[
                ("titles", title.as_str()),
                ("prop", "revisions"),
                ("rvprop", "content"),
                ("rvslots", "main"),
            ])
            .await?;
        Ok(parse_page_text(&value))
    }

    #[instrument(skip(self, request), fields(filename = %request.filename, source = ?request.source))]
    async fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt> {
        let token = self.csrf_token().await?;
        let form = self.client.post(&self.api_url).multipart(upload_form(request, &token));
        let value = self.send(form).await?;
        let receipt = parse_upload(&value)?;
        debug!(filename = %receipt.filename, "upload accepted");
        Ok(receipt)
    }
}

/// Text fields of an `action=upload` request. A URL source is passed as the
/// `url` field; file contents go in a separate part.
fn upload_fields(request: &UploadRequest, token: &str) -> Vec<(&'static str, String)> {
    let mut fields = vec![
        ("action", "upload".to_string()),
        ("filename", request.filename.clone()),
        ("text", request.text.clone()),
        ("comment", request.comment.clone()),
        ("ignorewarnings", "1".to_string()),
        ("token", token.to_string()),
        ("format", "json".to_string()),
        ("formatversion", "2".to_string()),
    ];
    if let UploadSource::Url(url) = &request.source {
        fields.push(("url", url.clone()));
    }
    fields
}

fn upload_form(request: &UploadRequest, token: &str) -> Form {
    let form = upload_fields(request, token).into_iter().fold(Form::new(), |form, (name, value)| form.text(name, value));
    match &request.source {
        UploadSource::File(bytes) => form.part("file", Part::bytes(bytes.clone()).file_name(request.filename.clone())),
        UploadSource::Url(_) => form,
    }
}

/// `{"error": {"code": "...", "info": "..."}}`, rendered as `code: info`.
fn api_error(value: &Value) -> Option<String> {
    let error = value.get("error")?;
    let code = error.get("code").and_then(Value::as_str).unwrap_or("error");
    match error.get("info").and_then(Value::as_str) {
        Some(info) => Some(format!("{code}: {info}")),
        None => Some(code.to_string()),
    }
}

fn parse_login(value: &Value) -> Result<()> {
    match value.pointer("/login/result").and_then(Value::as_str) {
        Some("Success") => Ok(()),
        Some(result) => {
            let reason = value.pointer("/login/reason").and_then(Value::as_str).unwrap_or(result);
            exn::bail!(ErrorKind::Authentication(reason.to_string()))
        },
        None => exn::bail!(ErrorKind::Decode("missing login result".to_string())),
    }
}

fn first_page(value: &Value) -> Result<&Value> {
    let page = value
        .pointer("/query/pages/0")
        .ok_or_else(|| exn::Exn::from(ErrorKind::Decode("missing query pages".to_string())))?;
    if page.get("invalid").and_then(Value::as_bool).unwrap_or(false) {
        let reason = page.get("invalidreason").and_then(Value::as_str).unwrap_or("invalid title");
        exn::bail!(ErrorKind::Rejected(reason.to_string()));
    }
    Ok(page)
}

fn is_missing(page: &Value) -> bool {
    page.get("missing").and_then(Value::as_bool).unwrap_or(false)
}

fn parse_exists(value: &Value) -> Result<bool> {
    Ok(!is_missing(first_page(value)?))
}

fn parse_page_text(value: &Value) -> Option<String> {
    let page = first_page(value).ok()?;
    if is_missing(page) {
        return None;
    }
    page.pointer("/revisions/0/slots/main/content").and_then(Value::as_str).map(str::to_string)
}

fn parse_upload(value: &Value) -> Result<UploadReceipt> {
    let upload = value
        .get("upload")
        .ok_or_else(|| exn::Exn::from(ErrorKind::Decode("missing upload result".to_string())))?;
    match upload.get("result").and_then(Value::as_str) {
        Some("Success") => {
            let filename = upload
                .get("filename")
                .and_then(Value::as_str)
                .ok_or_else(|| exn::Exn::from(ErrorKind::Decode("missing uploaded filename".to_string())))?;
            Ok(UploadReceipt { filename: filename.to_string() })
        },
        Some(result) => {
            let detail = upload.get("warnings").map(Value::to_string).unwrap_or_default();
            exn::bail!(ErrorKind::Rejected(format!("{result} {detail}").trim().to_string()))
        },
        None => exn::bail!(ErrorKind::Decode("missing upload result".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!({"query": {"pages": [{"ns": 6, "title": "File:X.tif", "missing": true}]}}), false)]
    #[case(json!({"query": {"pages": [{"pageid": 1, "ns": 6, "title": "File:X.tif"}]}}), true)]
    fn test_exists(#[case] value: Value, #[case] expected: bool) {
        assert_eq!(parse_exists(&value).unwrap(), expected);
    }

    #[test]
    fn test_invalid_title_rejected() {
        let value = json!({"query": {"pages": [{"title": "File:<", "invalid": true, "invalidreason": "bad char"}]}});
        let err = parse_exists(&value).unwrap_err();
        assert_eq!(*err, ErrorKind::Rejected("bad char".to_string()));
    }

    #[test]
    fn test_page_text() {
        let value = json!({"query": {"pages": [{
            "pageid": 1,
            "title": "File:X.tif",
            "revisions": [{"slots": {"main": {"contentmodel": "wikitext", "content": "== {{int:filedesc}} =="}}}],
        }]}});
        assert_eq!(parse_page_text(&value).as_deref(), Some("== {{int:filedesc}} =="));
        let missing = json!({"query": {"pages": [{"title": "File:Y.tif", "missing": true}]}});
        assert_eq!(parse_page_text(&missing), None);
    }

    fn request(source: UploadSource) -> UploadRequest {
        UploadRequest {
            source,
            filename: "Havna (RA_1).tif".to_string(),
            text: "== {{int:filedesc}} ==".to_string(),
            comment: "Transferred from Digitalarkivet".to_string(),
        }
    }

    fn field<'a>(fields: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        fields.iter().find(|(key, _)| *key == name).map(|(_, value)| value.as_str())
    }

    #[test]
    fn test_file_upload_fields() {
        let fields = upload_fields(&request(UploadSource::File(b"II*\0".to_vec())), "abc+\\");
        assert_eq!(field(&fields, "action"), Some("upload"));
        assert_eq!(field(&fields, "filename"), Some("Havna (RA_1).tif"));
        assert_eq!(field(&fields, "ignorewarnings"), Some("1"));
        assert_eq!(field(&fields, "token"), Some("abc+\\"));
        assert_eq!(field(&fields, "url"), None);
    }

    #[test]
    fn test_url_upload_fields() {
        let url = "https://foto.digitalarkivet.no/fotoweb/download/A.tif";
        let fields = upload_fields(&request(UploadSource::Url(url.to_string())), "abc+\\");
        assert_eq!(field(&fields, "url"), Some(url));
        assert_eq!(field(&fields, "comment"), Some("Transferred from Digitalarkivet"));
    }

    #[test]
    fn test_upload_success() {
        let value = json!({"upload": {"result": "Success", "filename": "X_(Y).tif"}});
        assert_eq!(parse_upload(&value).unwrap(), UploadReceipt { filename: "X_(Y).tif".to_string() });
    }

    #[test]
    fn test_upload_warning_rejected() {
        let value = json!({"upload": {"result": "Warning", "warnings": {"duplicate": ["Z.tif"]}}});
        let err = parse_upload(&value).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Rejected(message) if message.starts_with("Warning") && message.contains("Z.tif")));
    }

    #[test]
    fn test_api_error() {
        let value = json!({"error": {"code": "badtoken", "info": "Invalid CSRF token."}});
        assert_eq!(api_error(&value).as_deref(), Some("badtoken: Invalid CSRF token."));
        assert_eq!(api_error(&json!({"batchcomplete": true})), None);
    }

    #[rstest]
    #[case(json!({"login": {"result": "Success", "lgusername": "Bot"}}), None)]
    #[case(json!({"login": {"result": "Failed", "reason": "Incorrect password"}}), Some("Incorrect password"))]
    fn test_login(#[case] value: Value, #[case] refused: Option<&str>) {
        match refused {
            None => parse_login(&value).unwrap(),
            Some(reason) => assert_eq!(*parse_login(&value).unwrap_err(), ErrorKind::Authentication(reason.to_string())),
        }
    }
}
