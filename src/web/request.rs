use std::collections::HashMap;
use std::io::Read;

use crate::error::WebError;
use crate::form::FormData;

pub const MAX_BODY_BYTES: u64 = 256 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Other,
}

/// A decoded request: path, query, urlencoded body and cookies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Incoming {
    pub method: Method,
    pub path: String,
    pub query: FormData,
    pub form: FormData,
    pub cookies: HashMap<String, String>,
}

impl Incoming {
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(String::as_str)
    }

    pub fn from_tiny(request: &mut tiny_http::Request) -> Result<Self, WebError> {
        let method = match request.method() {
            tiny_http::Method::Get | tiny_http::Method::Head => Method::Get,
            tiny_http::Method::Post => Method::Post,
            _ => Method::Other,
        };
        let (path, query) = split_url(request.url());
        let cookies = request
            .headers()
            .iter()
            .filter(|h| h.field.equiv("Cookie"))
            .flat_map(|h| parse_cookies(h.value.as_str()))
            .collect();

        let body = if method == Method::Post {
            read_body(request)?
        } else {
            String::new()
        };
        Ok(Self {
            method,
            path,
            query,
            form: parse_urlencoded(&body),
            cookies,
        })
    }
}

/// Oversized bodies are rejected whole, never cut short.
fn read_body(request: &mut tiny_http::Request) -> Result<String, WebError> {
    let too_large = WebError::BodyTooLarge {
        limit: MAX_BODY_BYTES,
    };
    if request
        .body_length()
        .is_some_and(|len| len as u64 > MAX_BODY_BYTES)
    {
        return Err(too_large);
    }
    let mut raw = Vec::new();
    request
        .as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut raw)?;
    if raw.len() as u64 > MAX_BODY_BYTES {
        return Err(too_large);
    }
    String::from_utf8(raw)
        .map_err(|err| WebError::Body(std::io::Error::new(std::io::ErrorKind::InvalidData, err)))
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

/// Decodes `a=1&b=2` pairs, keeping repeats in order.
pub fn parse_urlencoded(raw: &str) -> FormData {
    FormData::new(
        raw.split('&')
            .filter(|pair| !pair.is_empty())
            .map(|pair| match pair.split_once('=') {
                Some((key, value)) => (decode_component(key), decode_component(value)),
                None => (decode_component(pair), String::new()),
            })
            .collect(),
    )
}

pub fn split_url(url: &str) -> (String, FormData) {
    match url.split_once('?') {
        Some((path, query)) => (path.to_string(), parse_urlencoded(query)),
        None => (url.to_string(), FormData::default()),
    }
}

pub fn parse_cookies(header: &str) -> Vec<(String, String)> {
    header
        .split(';')
        .filter_map(|part| part.trim().split_once('='))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .collect()
}
