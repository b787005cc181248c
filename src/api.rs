use anyhow::Result;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::WikiError;
use crate::render::{RenderedDocument, Renderer};
use crate::source::{CategoryPage, ContentSource, Continuation, RawDocument};

/// Separator MediaWiki accepts for list values that may contain `|`.
const MULTI_VALUE_SEP: char = '\u{1F}';

/// Thin client for the MediaWiki action API.
pub struct WikiApi {
    client: reqwest::Client,
    endpoint: String,
    skin: String,
}

impl WikiApi {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(WikiApi {
            client,
            endpoint: settings.api_endpoint.clone(),
            skin: settings.skin.clone(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, params: Vec<(String, String)>) -> Result<T, WikiError> {
        let body: Value = self
            .client
            .get(&self.endpoint)
            .query(&with_format(params))
            .send()
            .await?
            .json()
            .await?;
        decode(body)
    }

    async fn post<T: DeserializeOwned>(&self, params: Vec<(String, String)>) -> Result<T, WikiError> {
        let body: Value = self
            .client
            .post(&self.endpoint)
            .form(&with_format(params))
            .send()
            .await?
            .json()
            .await?;
        decode(body)
    }
}

impl ContentSource for WikiApi {
    async fn category_page(
        &self,
        category: &str,
        continuation: &Continuation,
    ) -> Result<CategoryPage, WikiError> {
        debug!("Querying {} ({} continuation params)", category, continuation.len());
        let response: QueryResponse = self.get(category_params(category, continuation)).await?;
        Ok(response.into_page())
    }
}

impl Renderer for WikiApi {
    async fn render(&self, wikitext: &str, debug: bool) -> Result<RenderedDocument, WikiError> {
        info!("Rendering table ({} bytes of wikitext)", wikitext.len());
        let response: ParseResponse = self.post(parse_params(wikitext, &self.skin, debug)).await?;
        Ok(RenderedDocument {
            head_html: response.parse.headhtml,
            body_html: response.parse.text,
        })
    }
}

fn param(key: &str, value: &str) -> (String, String) {
    (key.to_string(), value.to_string())
}

/// Encode a list parameter with the unit separator so items may contain `|`.
fn multi(values: &[&str]) -> String {
    let mut out = String::new();
    for v in values {
        out.push(MULTI_VALUE_SEP);
        out.push_str(v);
    }
    out
}

fn with_format(mut params: Vec<(String, String)>) -> Vec<(String, String)> {
    params.push(param("format", "json"));
    params.push(param("formatversion", "2"));
    params
}

fn category_params(category: &str, continuation: &Continuation) -> Vec<(String, String)> {
    let mut params = vec![
        param("action", "query"),
        param("generator", "categorymembers"),
        param("gcmtype", "page"),
        param("gcmtitle", category),
        param("gcmlimit", "max"),
        param("prop", "revisions"),
        param("rvprop", "content"),
        param("rvslots", "*"),
    ];
    for (key, value) in continuation {
        match params.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value.clone(),
            None => params.push((key.clone(), value.clone())),
        }
    }
    params
}

fn parse_params(wikitext: &str, skin: &str, debug: bool) -> Vec<(String, String)> {
    let mut params = vec![
        param("action", "parse"),
        param("text", wikitext),
        param("prop", &multi(&["text", "headhtml"])),
        param("useskin", skin),
        param("contentmodel", "wikitext"),
    ];
    if debug {
        params.push(param("debug", "1"));
    }
    params
}

#[derive(Deserialize)]
struct ApiErrorBody {
    code: String,
    #[serde(default)]
    info: String,
}

/// Surface an `error` object before decoding the expected shape.
fn decode<T: DeserializeOwned>(mut body: Value) -> Result<T, WikiError> {
    if let Some(error) = body.get_mut("error").map(Value::take) {
        let error: ApiErrorBody = serde_json::from_value(error)?;
        return Err(WikiError::Api { code: error.code, info: error.info });
    }
    Ok(serde_json::from_value(body)?)
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(rename = "continue")]
    continuation: Option<serde_json::Map<String, Value>>,
    query: Option<QueryPages>,
}

#[derive(Debug, Deserialize)]
struct QueryPages {
    #[serde(default)]
    pages: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    title: Option<String>,
    revisions: Option<Vec<Revision>>,
}

#[derive(Debug, Deserialize)]
struct Revision {
    slots: Slots,
}

#[derive(Debug, Deserialize)]
struct Slots {
    main: Slot,
}

#[derive(Debug, Deserialize)]
struct Slot {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ParseResponse {
    parse: ParseBody,
}

#[derive(Debug, Deserialize)]
struct ParseBody {
    text: String,
    headhtml: String,
}

impl QueryResponse {
    fn into_page(self) -> CategoryPage {
        let documents = self
            .query
            .map(|q| q.pages)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|page| {
                let title = page.title?;
                let markup = page.revisions?.into_iter().next()?.slots.main.content?;
                Some(RawDocument { title, markup })
            })
            .collect();

        let continuation = self.continuation.map(|map| {
            map.into_iter()
                .map(|(k, v)| {
                    let v = match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (k, v)
                })
                .collect::<Continuation>()
        });

        CategoryPage { documents, continuation }
    }
}
