use crate::{DebugInfo, FetchMethod, FetchOptions, Response};
use reqwest::{header::ACCEPT, multipart::Form};
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;
use tracing::debug;

/// Browsers and proxies start rejecting URLs somewhere past this length.
pub(crate) const MAX_GET_URL_LENGTH: usize = 2048;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("fetch error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("encoding error: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("decoding error: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("invalid url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("server returned error code: {status}\n{body}")]
    NotOk { status: u16, body: String }
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct PersistedQuery {
    pub version: u8,
    #[serde(rename = "sha256Hash")]
    pub sha256_hash: String
}

#[derive(Serialize, Clone, Debug)]
pub(crate) struct Extensions {
    #[serde(rename = "persistedQuery")]
    pub persisted_query: PersistedQuery
}

impl Extensions {
    pub fn persisted(sha256_hash: &str) -> Self {
        Self {
            persisted_query: PersistedQuery {
                version: 1,
                sha256_hash: sha256_hash.to_string()
            }
        }
    }
}

/// The body of a request as it goes over the wire. `query` is left out of hashed requests.
#[derive(Serialize, Debug)]
pub(crate) struct RequestBody<'a, V: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<&'static str>,
    #[serde(rename = "operationName")]
    pub operation_name: &'static str,
    pub variables: &'a V,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Extensions>
}

pub(crate) enum Payload {
    Get(String),
    Json(serde_json::Value),
    Multipart(Form)
}

/// Encode `body` as URL parameters on `base`.
pub(crate) fn get_url<V: Serialize>(base: &str, body: &RequestBody<V>) -> Result<String, FetchError> {
    let mut url = reqwest::Url::parse(base).map_err(|e| FetchError::InvalidUrl {
        url: base.to_string(),
        reason: e.to_string()
    })?;
    let variables = serde_json::to_string(body.variables).map_err(FetchError::Encode)?;
    let extensions = body
        .extensions
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(FetchError::Encode)?;

    {
        let mut pairs = url.query_pairs_mut();
        if let Some(query) = body.query {
            pairs.append_pair("query", query);
        }
        pairs.append_pair("operationName", body.operation_name);
        pairs.append_pair("variables", &variables);
        if let Some(extensions) = &extensions {
            pairs.append_pair("extensions", extensions);
        }
    }
    Ok(url.to_string())
}

/// Pick GET or POST for `body`. GET is only used when it was asked for and the URL stays short
/// enough.
pub(crate) fn payload_for<V: Serialize>(
    url: &str,
    body: &RequestBody<V>,
    prefer_get: bool
) -> Result<Payload, FetchError> {
    if prefer_get {
        let get_url = get_url(url, body)?;
        if get_url.len() <= MAX_GET_URL_LENGTH {
            return Ok(Payload::Get(get_url));
        }
        debug!(
            operation = body.operation_name,
            length = get_url.len(),
            "url too long for GET, falling back to POST"
        );
    }
    let json = serde_json::to_value(body).map_err(FetchError::Encode)?;
    Ok(Payload::Json(json))
}

pub(crate) fn wants_get(options: &FetchOptions, default: bool) -> bool {
    match options.method {
        Some(FetchMethod::Get) => true,
        Some(FetchMethod::Post) => false,
        None => default
    }
}

pub(crate) async fn execute<R: DeserializeOwned + Clone>(
    http: &reqwest::Client,
    url: &str,
    payload: Payload,
    options: &FetchOptions
) -> Result<Response<R>, FetchError> {
    let mut request = match payload {
        Payload::Get(url) => http.get(&url),
        Payload::Json(body) => http.post(url).json(&body),
        Payload::Multipart(form) => http.post(url).multipart(form)
    };
    request = request.header(ACCEPT, "application/json");
    for (name, value) in &options.headers {
        request = request.header(name.as_str(), value.as_str());
    }
    if let Some(timeout) = options.timeout {
        request = request.timeout(timeout);
    }

    let response = request.send().await?;
    let status = response.status();
    let bytes = response.bytes().await?;
    decode_response(status.as_u16(), status.is_success(), &bytes)
}

/// Non-2xx responses still count as results if the body is a GraphQL response.
pub(crate) fn decode_response<R: DeserializeOwned + Clone>(
    status: u16,
    success: bool,
    body: &[u8]
) -> Result<Response<R>, FetchError> {
    match serde_json::from_slice::<Response<R>>(body) {
        Ok(mut response) if success || response.data.is_some() || response.has_errors() => {
            response.debug_info = Some(DebugInfo::network());
            Ok(response)
        }
        Err(e) if success => Err(FetchError::Decode(e)),
        _ => Err(FetchError::NotOk {
            status,
            body: String::from_utf8_lossy(body).into_owned()
        })
    }
}
