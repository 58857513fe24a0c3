//! Requests, responses, and a network client to exchange them

use std::error::Error;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use url::{Origin, Url};

use crate::traits::Fetcher;


/// An outgoing request
#[derive(Clone, Debug, PartialEq)]
pub struct Request {
    method: Method,
    url: Url,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self { method, url }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn method(&self) -> &Method { &self.method }
    pub fn url(&self) -> &Url { &self.url }
}


/// How a response relates to the origin of the worker that fetched it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// A same-origin response
    Basic,
    /// A cross-origin response, whose content is readable
    Cors,
    /// A cross-origin response, whose content is hidden
    Opaque,
}


/// A fully received response
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Response {
    url: Url,
    status: u16,
    response_type: ResponseType,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Response {
    /// A response without headers nor body
    pub fn new(url: Url, status: u16, response_type: ResponseType) -> Self {
        Self { url, status, response_type, headers: Vec::new(), body: Vec::new() }
    }

    pub fn with_header<S: ToString, T: ToString>(mut self, name: S, value: T) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_body<B: Into<Vec<u8>>>(mut self, body: B) -> Self {
        self.body = body.into();
        self
    }

    /// The URL this response comes from (after any redirection)
    pub fn url(&self) -> &Url                  { &self.url }
    pub fn status(&self) -> u16                { self.status }
    pub fn response_type(&self) -> ResponseType { self.response_type }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8]                { &self.body }

    /// Returns the first header with this (case-insensitive) name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Whether the status is in the 2xx range
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Whether this response can be written through to a response cache: a same-origin `200 OK`
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.response_type == ResponseType::Basic
    }
}


/// A [`Fetcher`] that performs actual HTTP requests
pub struct HttpFetcher {
    client: reqwest::Client,
    origin: Origin,
}

impl HttpFetcher {
    /// Create a fetcher. Responses coming from the origin of `scope` will be "basic" responses.
    /// This does not start a connection
    pub fn new(scope: &Url) -> Result<Self, Box<dyn Error>> {
        let client = reqwest::Client::builder()
            .user_agent(crate::config::user_agent())
            .build()?;

        Ok(Self {
            client,
            origin: scope.origin(),
        })
    }

    fn response_type(&self, url: &Url) -> ResponseType {
        if url.origin() == self.origin {
            ResponseType::Basic
        } else {
            ResponseType::Cors
        }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, Box<dyn Error>> {
        log::trace!("{} {}", request.method(), request.url());
        let res = self.client
            .request(request.method().clone(), request.url().clone())
            .send()
            .await?;

        let url = res.url().clone();
        let response_type = self.response_type(&url);
        let status = res.status().as_u16();
        let headers = res.headers().iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();
        let body = res.bytes().await?.to_vec();

        log::debug!("{} {} -> {} ({:?})", request.method(), request.url(), status, response_type);
        Ok(Response { url, status, response_type, headers, body })
    }
}
