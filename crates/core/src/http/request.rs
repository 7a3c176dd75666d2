//! Immutable descriptions of outgoing requests.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP verbs the client issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

/// One JSON request, described before execution.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    endpoint: String,
    method: HttpMethod,
    query: Option<Vec<(String, String)>>,
    body: Option<Value>,
    headers: Option<BTreeMap<String, String>>,
    requires_auth: bool,
    timeout: Option<Duration>,
}

impl RequestDescriptor {
    pub fn builder(method: HttpMethod, endpoint: impl Into<String>) -> RequestDescriptorBuilder {
        RequestDescriptorBuilder {
            endpoint: endpoint.into(),
            method,
            query: None,
            body: None,
            headers: None,
            requires_auth: false,
            timeout: None,
        }
    }

    pub fn get(endpoint: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(HttpMethod::Get, endpoint)
    }

    pub fn post(endpoint: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(HttpMethod::Post, endpoint)
    }

    pub fn put(endpoint: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(HttpMethod::Put, endpoint)
    }

    pub fn patch(endpoint: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(HttpMethod::Patch, endpoint)
    }

    pub fn delete(endpoint: impl Into<String>) -> RequestDescriptorBuilder {
        Self::builder(HttpMethod::Delete, endpoint)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn query(&self) -> Option<&[(String, String)]> {
        self.query.as_deref()
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    pub fn headers(&self) -> Option<&BTreeMap<String, String>> {
        self.headers.as_ref()
    }

    pub fn requires_auth(&self) -> bool {
        self.requires_auth
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

/// Consuming builder for [`RequestDescriptor`].
#[derive(Debug, Clone)]
pub struct RequestDescriptorBuilder {
    endpoint: String,
    method: HttpMethod,
    query: Option<Vec<(String, String)>>,
    body: Option<Value>,
    headers: Option<BTreeMap<String, String>>,
    requires_auth: bool,
    timeout: Option<Duration>,
}

impl RequestDescriptorBuilder {
    /// Append a query parameter.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query
            .get_or_insert_with(Vec::new)
            .push((key.into(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `body` into the JSON payload.
    pub fn json_from<B: Serialize>(self, body: &B) -> Result<Self, serde_json::Error> {
        Ok(self.json(serde_json::to_value(body)?))
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn requires_auth(mut self, requires_auth: bool) -> Self {
        self.requires_auth = requires_auth;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> RequestDescriptor {
        RequestDescriptor {
            endpoint: self.endpoint,
            method: self.method,
            query: self.query,
            body: self.body,
            headers: self.headers,
            requires_auth: self.requires_auth,
            timeout: self.timeout,
        }
    }
}

/// How a form is put on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormEncoding {
    UrlEncoded,
    Multipart,
}

/// A flat form submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDescriptor {
    pub endpoint: String,
    pub fields: BTreeMap<String, String>,
    pub encoding: FormEncoding,
    pub requires_auth: bool,
}

impl FormDescriptor {
    pub fn new(endpoint: impl Into<String>, encoding: FormEncoding) -> Self {
        Self {
            endpoint: endpoint.into(),
            fields: BTreeMap::new(),
            encoding,
            requires_auth: false,
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn authenticated(mut self) -> Self {
        self.requires_auth = true;
        self
    }
}
