use hickory_resolver::config::{NameServerConfigGroup, ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use reqwest::dns::{Addrs, Name, Resolve, Resolving};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, StatusCode};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use crate::config::TransportConfig;
use crate::error::{DriverError, Result};

/// A single HTTP call: target, verb, extra headers and an optional JSON body
#[derive(Debug, Clone)]
pub struct Requester {
    pub url: String,
    pub method: Method,
    pub headers: HashMap<String, String>,
    pub data: Option<Value>,
}

impl Requester {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HashMap::new(),
            data: None,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn json(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }
}

/// HTTP client bound to one transport configuration.
///
/// Hostnames are resolved against the configured nameserver only; literal IPs
/// bypass resolution entirely.
#[derive(Clone)]
pub struct RequestEngine {
    client: Client,
}

impl RequestEngine {
    pub fn new(config: &TransportConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .tcp_keepalive(config.keep_alive)
            .dns_resolver(Arc::new(FixedDnsResolver::new(config.dns_server)))
            .build()?;

        Ok(Self { client })
    }

    /// Send the request and decode a JSON object reply.
    ///
    /// Anything but `200 OK` is an error carrying the status text.
    pub async fn request(&self, request: Requester) -> Result<Map<String, Value>> {
        let mut builder = self.client.request(request.method.clone(), &request.url);

        let has_content_type = request
            .headers
            .keys()
            .any(|k| k.eq_ignore_ascii_case(CONTENT_TYPE.as_str()));
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !has_content_type {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }
        if let Some(data) = &request.data {
            builder = builder.body(serde_json::to_vec(data)?);
        }

        tracing::debug!(method = %request.method, url = %request.url, "Sending request");
        let response = builder.send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(url = %request.url, %status, "Request rejected");
            return Err(DriverError::Status(status.to_string()));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// reqwest resolver that queries a single fixed nameserver
struct FixedDnsResolver {
    resolver: Arc<TokioAsyncResolver>,
}

impl FixedDnsResolver {
    fn new(server: SocketAddr) -> Self {
        let nameservers = NameServerConfigGroup::from_ips_clear(&[server.ip()], server.port(), true);
        let config = ResolverConfig::from_parts(None, vec![], nameservers);
        Self {
            resolver: Arc::new(TokioAsyncResolver::tokio(config, ResolverOpts::default())),
        }
    }
}

impl Resolve for FixedDnsResolver {
    fn resolve(&self, name: Name) -> Resolving {
        let resolver = Arc::clone(&self.resolver);
        Box::pin(async move {
            let lookup = resolver.lookup_ip(name.as_str()).await?;
            let addrs: Vec<SocketAddr> = lookup.iter().map(|ip| SocketAddr::new(ip, 0)).collect();
            let addrs: Addrs = Box::new(addrs.into_iter());
            Ok::<_, BoxError>(addrs)
        })
    }
}
