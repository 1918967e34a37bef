//! Request payloads and the transport seam.

use std::fmt;
use std::time::Duration;

use indexmap::IndexMap;
use psg_cfg::{RootConfig, Settings, TextFormat};
use tracing::{debug, info};

use crate::error::ReplyError;
use crate::reply::{Reply, BINARY};

/// Product the service is asked to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputType {
    Cfg,
    Rad,
    Noi,
    Trn,
    Lyr,
    All,
    /// Store the configuration as the session default.
    Set,
    /// Update the stored configuration.
    Upd,
}

impl OutputType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cfg => "cfg",
            Self::Rad => "rad",
            Self::Noi => "noi",
            Self::Trn => "trn",
            Self::Lyr => "lyr",
            Self::All => "all",
            Self::Set => "set",
            Self::Upd => "upd",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Request {
    pub config: RootConfig,
    pub output_type: Option<OutputType>,
    /// Service application, e.g. `globes`.
    pub app: Option<String>,
}

impl Request {
    pub fn new(config: RootConfig) -> Self {
        Self {
            config,
            output_type: None,
            app: None,
        }
    }

    pub fn with_output_type(mut self, output_type: OutputType) -> Self {
        self.output_type = Some(output_type);
        self
    }

    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Configuration text followed by one `<BINARY>...</BINARY>` section per
    /// blob reference. `blobs` maps blob ids to their bytes.
    pub fn payload(
        &self,
        format: &TextFormat,
        blobs: &IndexMap<String, Vec<u8>>,
    ) -> Result<Vec<u8>, ReplyError> {
        let mut out = self.config.to_text_with(format)?;
        for (key, blob) in self.config.blob_refs() {
            let bytes = blobs.get(&blob.id).ok_or_else(|| ReplyError::MissingBlob {
                key: key.clone(),
                id: blob.id.clone(),
            })?;
            if !out.is_empty() {
                out.extend_from_slice(format.terminator.as_bytes());
            }
            out.extend_from_slice(format!("<{BINARY}>").as_bytes());
            out.extend_from_slice(bytes);
            out.extend_from_slice(format!("</{BINARY}>").as_bytes());
            debug!(key = %key, bytes = bytes.len(), "attached binary payload");
        }
        Ok(out)
    }

    pub fn prepare(
        &self,
        settings: &Settings,
        blobs: &IndexMap<String, Vec<u8>>,
    ) -> Result<PreparedRequest, ReplyError> {
        Ok(PreparedRequest {
            url: settings.url.clone(),
            file: self.payload(&settings.text_format(), blobs)?,
            output_type: self.output_type,
            app: self.app.clone(),
            api_key: settings.api_key.clone(),
            timeout: settings.timeout(),
        })
    }
}

/// Everything a transport needs to post one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedRequest {
    pub url: String,
    /// The `file` form field.
    pub file: Vec<u8>,
    pub output_type: Option<OutputType>,
    pub app: Option<String>,
    pub api_key: Option<String>,
    pub timeout: Duration,
}

impl PreparedRequest {
    /// Form fields other than `file`, in the order the service expects.
    pub fn form(&self) -> Vec<(&'static str, &str)> {
        let mut form = Vec::new();
        if let Some(t) = self.output_type {
            form.push(("type", t.as_str()));
        }
        if let Some(app) = &self.app {
            form.push(("app", app.as_str()));
        }
        if let Some(key) = &self.api_key {
            form.push(("key", key.as_str()));
        }
        form
    }
}

/// Blocking HTTP seam. Timeouts and cancellation are up to the implementor.
pub trait Transport {
    type Error: std::error::Error + Send + Sync + 'static;

    fn send(&self, request: &PreparedRequest) -> Result<Vec<u8>, Self::Error>;
}

/// Sends `request` and decodes the reply against the request's own schema.
pub fn call<T: Transport>(
    transport: &T,
    request: &Request,
    settings: &Settings,
    blobs: &IndexMap<String, Vec<u8>>,
) -> Result<Reply, ReplyError> {
    let prepared = request.prepare(settings, blobs)?;
    info!(
        url = %prepared.url,
        output_type = ?prepared.output_type,
        bytes = prepared.file.len(),
        "sending request"
    );
    let bytes = transport
        .send(&prepared)
        .map_err(|e| ReplyError::Transport(Box::new(e)))?;
    debug!(bytes = bytes.len(), "received reply");
    let mut schema = request.config.clone();
    schema.clear();
    Reply::decode_with(&bytes, schema, &crate::reply::echo_options())
}
