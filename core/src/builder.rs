//! Pure construction of outgoing requests.
//!
//! # Design
//! Every function here is deterministic and free of I/O. A request that the
//! builder accepts is well-formed; everything it rejects (bad URL, colliding
//! or malformed headers, unencodable form) is a configuration error surfaced
//! before any client is leased.
//!
//! Query keys and values are written verbatim, without percent-encoding.
//! GET and DELETE start from a `charset: UTF-8` header; requests with a body
//! start from the body's `content-type`. Caller headers are added on top and
//! may not replace either.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use url::Url;

use crate::codec;
use crate::error::{HelperError, Result};
use crate::http::{HttpMethod, HttpRequest};
use crate::types::{FormData, Headers, QueryParams};

pub const DEFAULT_CONTENT_TYPE: &str = "application/json";
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

const CHARSET_HEADER: (&str, &str) = ("charset", "UTF-8");
const CONTENT_TYPE: &str = "content-type";

/// Append `query` to `base` and check the result is an absolute URL.
///
/// Parameters follow `&` when `base` already has a `?`, otherwise `?`.
/// Entries with a `None` value are skipped, key included. An empty or
/// all-`None` mapping leaves `base` unchanged.
pub fn compose_target(base: &str, query: Option<&QueryParams>) -> Result<String> {
    let mut target = base.to_string();
    if let Some(query) = query {
        target.push(if base.contains('?') { '&' } else { '?' });
        for (key, value) in query.iter() {
            if let Some(value) = value {
                target.push_str(key);
                target.push('=');
                target.push_str(value);
                target.push('&');
            }
        }
        target.pop();
    }

    if let Err(source) = Url::parse(&target) {
        return Err(HelperError::InvalidUrl {
            url: target,
            source,
        });
    }
    Ok(target)
}

/// Merge `defaults` and caller `extra` headers into one map.
///
/// Names are compared the way HTTP compares them, ignoring case; a caller
/// header that collides with anything already present is rejected.
pub fn compose_headers<'a>(
    defaults: impl IntoIterator<Item = (&'a str, &'a str)>,
    extra: Option<&Headers>,
) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (name, value) in defaults {
        insert_header(&mut headers, name, value)?;
    }
    if let Some(extra) = extra {
        for (name, value) in extra.iter() {
            insert_header(&mut headers, name, value)?;
        }
    }
    Ok(headers)
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let header_name =
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| HelperError::InvalidHeader {
            name: name.to_string(),
            reason: e.to_string(),
        })?;
    if headers.contains_key(&header_name) {
        return Err(HelperError::DuplicateHeader(name.to_string()));
    }
    let header_value = HeaderValue::from_str(value).map_err(|e| HelperError::InvalidHeader {
        name: name.to_string(),
        reason: e.to_string(),
    })?;
    headers.insert(header_name, header_value);
    Ok(())
}

/// `content-type` value for a text body; UTF-8 is declared unless the caller
/// already named a charset.
pub fn content_type_value(content_type: &str) -> String {
    if content_type.to_ascii_lowercase().contains("charset=") {
        content_type.to_string()
    } else {
        format!("{content_type}; charset=utf-8")
    }
}

pub fn build_get(url: &str, query: Option<&QueryParams>, headers: Option<&Headers>) -> Result<HttpRequest> {
    Ok(HttpRequest {
        method: HttpMethod::Get,
        target: compose_target(url, query)?,
        headers: compose_headers([CHARSET_HEADER], headers)?,
        body: None,
    })
}

pub fn build_post(
    url: &str,
    body: &str,
    headers: Option<&Headers>,
    content_type: &str,
) -> Result<HttpRequest> {
    build_with_body(HttpMethod::Post, url, body, headers, content_type)
}

pub fn build_put(
    url: &str,
    body: &str,
    headers: Option<&Headers>,
    content_type: &str,
) -> Result<HttpRequest> {
    build_with_body(HttpMethod::Put, url, body, headers, content_type)
}

/// DELETE with the form mapping URL-encoded as the body, or no body at all
/// when `form` is `None`.
pub fn build_delete(url: &str, form: Option<&FormData>, headers: Option<&Headers>) -> Result<HttpRequest> {
    let target = compose_target(url, None)?;
    let (headers, body) = match form {
        Some(form) => {
            let defaults = [CHARSET_HEADER, (CONTENT_TYPE, FORM_CONTENT_TYPE)];
            (compose_headers(defaults, headers)?, Some(codec::encode_form(form)?))
        }
        None => (compose_headers([CHARSET_HEADER], headers)?, None),
    };
    Ok(HttpRequest {
        method: HttpMethod::Delete,
        target,
        headers,
        body,
    })
}

fn build_with_body(
    method: HttpMethod,
    url: &str,
    body: &str,
    headers: Option<&Headers>,
    content_type: &str,
) -> Result<HttpRequest> {
    let content_type = content_type_value(content_type);
    Ok(HttpRequest {
        method,
        target: compose_target(url, None)?,
        headers: compose_headers([(CONTENT_TYPE, content_type.as_str())], headers)?,
        body: Some(body.to_string()),
    })
}
