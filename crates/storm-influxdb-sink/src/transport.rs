// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Connection to the InfluxDB server.
//!
//! [`Connector`] opens a [`Transport`]; the dispatcher owns at most one
//! transport at a time. [`HttpConnector`] talks to the InfluxDB 1.x HTTP API:
//!
//! ```text
//! POST /query?q=CREATE DATABASE "<db>"
//! POST /write?db=<db>&rp=autogen&consistency=all&precision=ns   (body: line protocol)
//! ```
//!
//! Credentials travel in an `Authorization: Basic` header, never in the URL.

use crate::batch::BatchPoints;
use crate::config::SinkSettings;
use crate::error::{Result, SinkError};
use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};
use reqwest::Url;
use std::io::Write;

/// An open connection to InfluxDB.
pub trait Transport {
    /// Create `database`. The server treats this as a no-op if it exists.
    fn create_database(&mut self, database: &str) -> Result<()>;

    /// Write every point of `batch` in one request.
    fn write(&mut self, batch: &BatchPoints) -> Result<()>;

    /// Release the connection.
    fn close(&mut self) {}
}

/// Factory for [`Transport`]s.
pub trait Connector {
    type Transport: Transport;

    /// Open a connection using the URL, credentials, compression and timeout
    /// from `settings`.
    fn connect(&self, settings: &SinkSettings) -> Result<Self::Transport>;
}

/// Connector for the InfluxDB 1.x HTTP API.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    type Transport = HttpTransport;

    fn connect(&self, settings: &SinkSettings) -> Result<HttpTransport> {
        HttpTransport::connect(settings)
    }
}

/// Blocking HTTP transport.
#[derive(Debug)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    credentials: Option<(String, String)>,
    gzip: bool,
}

impl HttpTransport {
    /// Build a client for `settings.url`.
    ///
    /// Credentials are sent only when username or password is set; with
    /// both empty the connection is anonymous. No request is made here.
    pub fn connect(settings: &SinkSettings) -> Result<Self> {
        let base_url = Url::parse(&settings.url).map_err(|e| SinkError::InvalidUrl {
            url: settings.url.clone(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(SinkError::InvalidUrl {
                url: settings.url.clone(),
                reason: "URL cannot be used as a base".to_string(),
            });
        }

        let client = Client::builder().timeout(settings.timeout).build()?;

        let credentials = if settings.username.is_empty() && settings.password.is_empty() {
            None
        } else {
            Some((settings.username.clone(), settings.password.clone()))
        };

        Ok(Self {
            client,
            base_url,
            credentials,
            gzip: settings.enable_gzip,
        })
    }

    /// Whether request bodies are gzip-compressed.
    pub fn gzip_enabled(&self) -> bool {
        self.gzip
    }

    /// Whether requests carry credentials.
    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(path);
        }
        {
            let mut query = url.query_pairs_mut();
            for (k, v) in params {
                query.append_pair(k, v);
            }
        }
        url
    }

    fn post(&self, url: Url) -> RequestBuilder {
        let request = self.client.post(url);
        match &self.credentials {
            Some((user, pass)) => request.basic_auth(user, Some(pass)),
            None => request,
        }
    }

    fn execute(request: RequestBuilder) -> Result<()> {
        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let body = response.text().unwrap_or_default();
            Err(SinkError::Status {
                status: status.as_u16(),
                body: body.trim().to_string(),
            })
        }
    }
}

impl Transport for HttpTransport {
    fn create_database(&mut self, database: &str) -> Result<()> {
        let statement = format!("CREATE DATABASE \"{}\"", database.replace('"', "\\\""));
        let url = self.endpoint("query", &[("q", statement.as_str())]);
        debug!("Creating database '{}'", database);
        Self::execute(self.post(url))
    }

    fn write(&mut self, batch: &BatchPoints) -> Result<()> {
                let url = self.endpoint(
            "write",
            &[
                ("db", batch.database()),
                ("rp", batch.retention_policy()),
                ("consistency", batch.consistency()),
                ("precision", "ns"),
            ],
        );

        let body = batch.to_body();
        let mut request = self
            .post(url)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8");

        if self.gzip {
            request = request
                .header(CONTENT_ENCODING, "gzip")
                .body(gzip(body.as_bytes())?);
        } else {
            request = request.body(body);
        }

        debug!(
            "Writing {} point(s) to database '{}'",
            batch.len(),
            batch.database()
        );
        Self::execute(request)
    }

    fn close(&mut self) {
        debug!("Closing connection to {}", self.base_url);
    }
}

fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    Ok(encoder.finish()?)
}
