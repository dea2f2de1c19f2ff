pub mod controller;
pub mod cursor;
pub mod history;
pub mod html;
pub mod keys;
pub mod session;
pub mod surface;

pub mod wire {
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    pub const INDEX_PATH: &str = "/";
    pub const COMMAND_PATH: &str = "/command";
    pub const HISTORY_PATH: &str = "/history";
    pub const NEWLINE_PATH: &str = "/newline";

    pub const COMMAND_FIELD: &str = "command";
    pub const NEWLINES_FIELD: &str = "newlines";
    pub const COUNT_FIELD: &str = "count";

    pub const OPEN_URL_HEADER: &str = "X-Open-URL";
    pub const TRIGGER_HEADER: &str = "HX-Trigger";
    pub const RESWAP_HEADER: &str = "HX-Reswap";
    pub const HTMX_REQUEST_HEADER: &str = "HX-Request";

    pub const PROMPT_EVENT: &str = "updatePrompt";

    /// A real (non-empty) command on its way to the server.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct CommandRequest {
        pub command: String,
        pub newlines: Option<u32>,
    }

    impl CommandRequest {
        pub fn form_fields(&self) -> Vec<(&'static str, String)> {
            let mut fields = vec![(COMMAND_FIELD, self.command.clone())];
            if let Some(n) = self.newlines.filter(|n| *n > 0) {
                fields.push((NEWLINES_FIELD, n.to_string()));
            }
            fields
        }
    }

    /// How a reply fragment lands in the transcript.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub enum Swap {
        #[default]
        Append,
        Replace,
    }

    impl Swap {
        pub fn from_reswap(value: Option<&str>) -> Self {
            match value.map(str::trim) {
                Some("innerHTML") => Swap::Replace,
                _ => Swap::Append,
            }
        }
    }

    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    pub struct CommandReply {
        pub body: String,
        pub open_url: Option<String>,
        pub prompt: Option<String>,
        pub swap: Swap,
    }

    /// What the terminal page shows on load: the session's prompt and the
    /// transcript so far, already flattened to lines.
    #[derive(Clone, Debug, Default, PartialEq, Eq)]
    pub struct PageSnapshot {
        pub prompt: Option<String>,
        pub transcript: Vec<String>,
    }

    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum RemoteError {
        #[error("network: {0}")] Network(String),
        #[error("timeout: {0}")] Timeout(String),
        #[error("status {status}")] Status { status: u16, body: String, open_url: Option<String> },
        #[error("decode: {0}")] Decode(String),
        #[error("config: {0}")] Config(String),
    }

    impl RemoteError {
        pub fn status(status: u16, body: impl Into<String>) -> Self {
            RemoteError::Status { status, body: body.into(), open_url: None }
        }

        /// `X-Open-URL` sent alongside an error status.
        pub fn open_url(&self) -> Option<&str> {
            match self {
                RemoteError::Status { open_url, .. } => open_url.as_deref(),
                _ => None,
            }
        }

        /// Text to show in the transcript when a submission fails.
        pub fn transcript_text(&self) -> String {
            match self {
                RemoteError::Status { body, .. } if !body.is_empty() => body.clone(),
                other => other.to_string(),
            }
        }
    }

    #[allow(async_fn_in_trait)]
    pub trait TerminalRemote: Send + Sync {
        /// Loads the terminal page. This is the request that establishes the
        /// server session, so it goes first.
        async fn load_page(&self) -> Result<PageSnapshot, RemoteError>;
        async fn fetch_history(&self) -> Result<Vec<String>, RemoteError>;
        async fn post_newlines(&self, count: u32) -> Result<(), RemoteError>;
        async fn submit_command(&self, req: &CommandRequest) -> Result<CommandReply, RemoteError>;
    }

    /// Extracts the prompt from an `HX-Trigger` header value such as
    /// `{"updatePrompt": "guest@machine:~$ "}`.
    pub fn parse_prompt_trigger(value: &str) -> Option<String> {
        let v: serde_json::Value = serde_json::from_str(value).ok()?;
        match &v[PROMPT_EVENT] {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(o) => o.get(PROMPT_EVENT)?.as_str().map(str::to_string),
            _ => None,
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn form_fields_skip_zero_newlines() {
            let req = CommandRequest { command: "ls -a".into(), newlines: Some(0) };
            assert_eq!(req.form_fields(), vec![("command", "ls -a".to_string())]);

            let req = CommandRequest { command: "ls".into(), newlines: Some(3) };
            assert_eq!(
                req.form_fields(),
                vec![("command", "ls".to_string()), ("newlines", "3".to_string())]
            );
        }

        #[test]
        fn prompt_trigger_accepts_string_and_detail_shapes() {
            assert_eq!(
                parse_prompt_trigger(r#"{"updatePrompt":"guest@machine:~$ "}"#),
                Some("guest@machine:~$ ".to_string())
            );
            assert_eq!(
                parse_prompt_trigger(r#"{"updatePrompt":{"updatePrompt":"guest@machine:/$ "}}"#),
                Some("guest@machine:/$ ".to_string())
            );
            assert_eq!(parse_prompt_trigger("updatePrompt"), None);
            assert_eq!(parse_prompt_trigger(r#"{"other":1}"#), None);
        }

        #[test]
        fn reswap_inner_html_replaces() {
            assert_eq!(Swap::from_reswap(Some("innerHTML")), Swap::Replace);
            assert_eq!(Swap::from_reswap(Some("beforeend")), Swap::Append);
            assert_eq!(Swap::from_reswap(None), Swap::Append);
        }

        #[test]
        fn failed_status_shows_body_verbatim() {
            let err = RemoteError::status(500, "<div>boom</div>");
            assert_eq!(err.transcript_text(), "<div>boom</div>");
            let err = RemoteError::status(502, "");
            assert_eq!(err.transcript_text(), "status 502");
            assert_eq!(err.open_url(), None);
        }
    }
}
