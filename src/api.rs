// API client module: a small blocking HTTP client for the DevTrans
// service. One client is built per invocation from the resolved base URL
// and reused for every request (upload, download, version check, binary
// fetch).

use anyhow::{anyhow, bail, Context, Result};
use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Header carrying the original filename, on upload and on download.
pub const FILENAME_HEADER: &str = "X-Filename";

/// Blocking client bound to one service base URL.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

/// Body of a successful upload. Missing fields decode as empty strings.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct UploadResult {
    pub code: String,
    pub url: String,
    pub expiry: String,
}

impl UploadResult {
    /// Decode a response body, returning `None` when it is not the
    /// expected JSON object. Callers fall back to an empty result.
    pub fn decode(body: &str) -> Option<Self> {
        match serde_json::from_str(body) {
            Ok(result) => Some(result),
            Err(e) => {
                debug!("upload response is not valid JSON: {}", e);
                None
            }
        }
    }
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("devtrans/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ApiClient {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_headers(&self, token: &str) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let val = HeaderValue::from_str(&format!("Bearer {}", token))
            .context("API token contains characters not allowed in a header")?;
        headers.insert(AUTHORIZATION, val);
        Ok(headers)
    }

    /// Upload `file_path` as multipart/form-data with a PUT to `/upload`.
    ///
    /// Non-200 responses fail with the status and body. A 200 body that
    /// does not decode yields an empty `UploadResult` rather than an error.
    pub fn upload(&self, file_path: &Path, token: &str) -> Result<UploadResult> {
        let url = format!("{}/upload", &self.base_url);

        let file = File::open(file_path)
            .with_context(|| format!("Failed to open {}", file_path.display()))?;
        let meta = file
            .metadata()
            .with_context(|| format!("Failed to stat {}", file_path.display()))?;
        if !meta.is_file() {
            bail!("{} is not a regular file", file_path.display());
        }
        let file_name = match file_path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => bail!("{} has no file name", file_path.display()),
        };
        let name_header = HeaderValue::from_bytes(file_name.as_bytes())
            .context("File name cannot be sent as a header")?;

        let part = multipart::Part::reader_with_length(file, meta.len())
            .file_name(file_name.clone())
            .mime_str("application/octet-stream")?;
        let form = multipart::Form::new().part("file", part);

        info!("uploading {} ({} bytes) to {}", file_name, meta.len(), url);
        let res = self
            .client
            .put(&url)
            .headers(self.auth_headers(token)?)
            .header(FILENAME_HEADER, name_header)
            .multipart(form)
            .send()
            .context("Failed to send upload request")?;

        if res.status() != StatusCode::OK {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            bail!("Upload failed: {} - {}", status, txt);
        }
        let body = res.text().context("Failed to read upload response")?;
        Ok(UploadResult::decode(&body).unwrap_or_else(|| {
            warn!("could not decode upload response, printing empty fields");
            UploadResult::default()
        }))
    }

    /// Download the file behind `code` into `dest_dir`, returning the path
    /// written. No token is sent: holding the code grants access.
    pub fn download(&self, code: &str, dest_dir: &Path) -> Result<PathBuf> {
        let url = self.download_url(code)?;
        info!("downloading {}", url);
        let mut res = self
            .client
            .get(url)
            .send()
            .context("Failed to send download request")?;

        if res.status() != StatusCode::OK {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            bail!("Download failed: {} - {}", status, txt);
        }

        let header = res
            .headers()
            .get(FILENAME_HEADER)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned());
        let name = destination_name(header.as_deref(), code)
            .ok_or_else(|| anyhow!("No usable file name for download {:?}", code))?;
        let dest = dest_dir.join(name);

        let written = save_body(&mut res, &dest)?;
        debug!("wrote {} bytes to {}", written, dest.display());
        Ok(dest)
    }

    /// `{base_url}/download/{code}`, with the code encoded as one segment.
    pub fn download_url(&self, code: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("Invalid base URL {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Base URL {} cannot carry a path", self.base_url))?
            .pop_if_empty()
            .push("download")
            .push(code);
        Ok(url)
    }

    /// Fetch the version string the service advertises for the CLI.
    pub fn remote_version(&self) -> Result<String> {
        let url = format!("{}/cli/version", &self.base_url);
        let res = self
            .client
            .get(&url)
            .send()
            .context("Failed to send version request")?;
        if res.status() != StatusCode::OK {
            bail!("Version check failed: {}", res.status());
        }
        let txt = res.text().context("Failed to read version response")?;
        Ok(txt.trim().to_string())
    }

    /// Start fetching the latest CLI binary. The returned response has a
    /// 200 status; its body is the executable image.
    pub fn fetch_binary(&self) -> Result<Response> {
        let url = format!("{}/cli/devtrans", &self.base_url);
        info!("fetching new binary from {}", url);
        let res = self
            .client
            .get(&url)
            .send()
            .context("Failed to send update request")?;
        if res.status() != StatusCode::OK {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            bail!("Update download failed: {} - {}", status, txt);
        }
        Ok(res)
    }
}

/// Stream `body` into a fresh `dest`. A body that breaks off midway removes
/// the partial file instead of leaving it behind.
pub fn save_body<R: Read>(body: &mut R, dest: &Path) -> Result<u64> {
    let mut out =
        File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
    match io::copy(body, &mut out) {
        Ok(written) => Ok(written),
        Err(e) => {
            drop(out);
            if let Err(rm) = fs::remove_file(dest) {
                debug!("could not remove partial {}: {}", dest.display(), rm);
            }
            Err(e).with_context(|| format!("Failed to write {}", dest.display()))
        }
    }
}

/// Pick the local filename for a download: the last path component of the
/// header, else of the code. `None` when neither names a file.
pub fn destination_name(header: Option<&str>, code: &str) -> Option<String> {
    header
        .and_then(file_component)
        .or_else(|| file_component(code))
}

fn file_component(name: &str) -> Option<String> {
    Path::new(name.trim())
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .filter(|n| !n.is_empty())
}
