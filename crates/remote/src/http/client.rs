use crate::http::config::ClientConfig;
use reqwest::{header::HeaderMap, Client, StatusCode};
use std::time::Duration;
use tracing::{debug, info, warn};
use zterm_core::html;
use zterm_core::wire::{
    self, CommandReply, CommandRequest, PageSnapshot, RemoteError, Swap, TerminalRemote,
    COUNT_FIELD,
};

#[derive(Clone)]
pub struct HttpRemote {
    http: Client,
    cfg: ClientConfig,
}

impl HttpRemote {
    pub fn new(cfg: ClientConfig) -> anyhow::Result<Self> {
        // The server keys the shell session on the `session_id` cookie it
        // sets on the page load.
        let mut builder = Client::builder()
            .cookie_store(true)
            .use_rustls_tls()
            .pool_idle_timeout(Duration::from_secs(30))
            .pool_max_idle_per_host(2)
            .timeout(cfg.timeout);
        if let Some(p) = &cfg.proxy {
            builder = builder.proxy(reqwest::Proxy::all(p)?);
        }
        let http = builder.build()?;
        Ok(Self { http, cfg })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.cfg
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.cfg.base_url.as_str().trim_end_matches('/'), path)
    }

    /// Fire-and-forget flush used at shutdown: bounded by the unload
    /// timeout, every failure swallowed.
    pub async fn flush_newlines_best_effort(&self, count: u32) {
        match tokio::time::timeout(self.cfg.unload_timeout, self.post_newlines(count)).await {
            Ok(Ok(())) => debug!(target: "remote::http", "flushed {} newlines on unload", count),
            Ok(Err(e)) => debug!(target: "remote::http", "unload flush dropped: {}", e),
            Err(_) => debug!(target: "remote::http", "unload flush timed out"),
        }
    }
}

impl TerminalRemote for HttpRemote {
    async fn load_page(&self) -> Result<PageSnapshot, RemoteError> {
        let url = self.endpoint(wire::INDEX_PATH);
        let resp = self.http.get(url).send().await.map_err(map_reqwest_err)?;
        let status = resp.status();
        if !status.is_success() {
            let open_url = header_str(resp.headers(), wire::OPEN_URL_HEADER).map(str::to_string);
            return Err(map_status_err(status, resp.text().await.ok(), open_url));
        }
        let body = resp.text().await.map_err(map_reqwest_err)?;
        let page = html::parse_page(&body);
        info!(
            target: "remote::http",
            "page loaded prompt={:?} transcript_lines={}",
            page.prompt,
            page.transcript.len()
        );
        Ok(page)
    }

    async fn fetch_history(&self) -> Result<Vec<String>, RemoteError> {
        let url = self.endpoint(wire::HISTORY_PATH);
        let resp = self.http.get(url).send().await.map_err(map_reqwest_err)?;
        if !resp.status().is_success() {
            let status = resp.status();
            return Err(map_status_err(status, resp.text().await.ok(), None));
        }
        let v: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;
        parse_history(v)
    }

    async fn post_newlines(&self, count: u32) -> Result<(), RemoteError> {
        let url = self.endpoint(wire::NEWLINE_PATH);
        let resp = self
            .http
            .post(url)
            .form(&[(COUNT_FIELD, count.to_string())])
            .send()
            .await
            .map_err(map_reqwest_err)?;
        if !resp.status().is_success() {
            let status = resp.status();
            return Err(map_status_err(status, resp.text().await.ok(), None));
        }
        Ok(())
    }

    async fn submit_command(&self, req: &CommandRequest) -> Result<CommandReply, RemoteError> {
        let url = self.endpoint(wire::COMMAND_PATH);
        info!(target: "remote::http", "submit command_len={} newlines={:?}", req.command.len(), req.newlines);
        let resp = self
            .http
            .post(url)
            .header(wire::HTMX_REQUEST_HEADER, "true")
            .form(&req.form_fields())
            .send()
            .await
            .map_err(map_reqwest_err)?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await.map_err(map_reqwest_err)?;
        if !status.is_success() {
            warn!(target: "remote::http", "command non-success status={}", status);
            let open_url = header_str(&headers, wire::OPEN_URL_HEADER).map(str::to_string);
            return Err(map_status_err(status, Some(body), open_url));
        }
        Ok(reply_from_parts(&headers, body))
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn reply_from_parts(headers: &HeaderMap, body: String) -> CommandReply {
    CommandReply {
        body,
        open_url: header_str(headers, wire::OPEN_URL_HEADER).map(str::to_string),
        prompt: header_str(headers, wire::TRIGGER_HEADER).and_then(wire::parse_prompt_trigger),
        swap: Swap::from_reswap(header_str(headers, wire::RESWAP_HEADER)),
    }
}

// The server encodes an empty history as `null`; non-string items are skipped.
fn parse_history(v: serde_json::Value) -> Result<Vec<String>, RemoteError> {
    match v {
        serde_json::Value::Null => Ok(Vec::new()),
        serde_json::Value::Array(items) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::String(s) => Some(s),
                _ => None,
            })
            .collect()),
        other => Err(RemoteError::Decode(format!("expected array, got {}", other))),
    }
}

fn map_reqwest_err(e: reqwest::Error) -> RemoteError {
    if e.is_timeout() {
        RemoteError::Timeout(e.to_string())
    } else if e.is_decode() {
        RemoteError::Decode(e.to_string())
    } else {
        RemoteError::Network(e.to_string())
    }
}

fn map_status_err(status: StatusCode, body: Option<String>, open_url: Option<String>) -> RemoteError {
    RemoteError::Status {
        status: status.as_u16(),
        body: body.unwrap_or_default(),
        open_url,
    }
}
