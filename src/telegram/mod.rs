// telegram/mod.rs - Telegram Bot API client used for the weekly digest

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::TelegramConfig;
use crate::retry::{RetryPolicy, Timeout};

/// Telegram rejects messages longer than this (UTF-16 code units).
pub const MAX_MESSAGE_LEN: usize = 4096;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Telegram bot token or chat id not configured")]
    NotConfigured,

    #[error("Telegram request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Telegram API error ({status}): {description}")]
    Api { status: u16, description: String },

    #[error("Telegram request timed out after {0:?}")]
    Timeout(Duration),
}

impl From<Timeout> for TelegramError {
    fn from(timeout: Timeout) -> Self {
        TelegramError::Timeout(timeout.0)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
    result: Option<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    message_id: i64,
}

#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    api_base: String,
    bot_token: Option<String>,
    chat_id: Option<String>,
    retry: RetryPolicy,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
            retry: RetryPolicy::telegram(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    fn credentials(&self) -> Result<(&str, &str), TelegramError> {
        match (self.bot_token.as_deref(), self.chat_id.as_deref()) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => Ok((token, chat)),
            _ => Err(TelegramError::NotConfigured),
        }
    }

    fn method_url(&self, token: &str, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, token, method)
    }

    /// Send a Markdown message, split into several when it exceeds the size limit.
    pub async fn send_message(&self, text: &str) -> Result<(), TelegramError> {
        let (token, chat_id) = self.credentials()?;
        let url = self.method_url(token, "sendMessage");

        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            let body = json!({
                "chat_id": chat_id,
                "text": chunk,
                "parse_mode": "Markdown",
                "disable_web_page_preview": true,
            });

            let message_id = self
                .retry
                .run("telegram.sendMessage", || async {
                    let response = self.http.post(&url).json(&body).send().await?;
                    Self::check(response).await
                })
                .await?;
            debug!(message_id, "Message sent to Telegram");
        }

        info!(length = text.len(), "Telegram message delivered");
        Ok(())
    }

    /// Upload `content` as a file named `file_name`.
    pub async fn send_document(
        &self,
        content: &str,
        file_name: &str,
        caption: Option<&str>,
    ) -> Result<(), TelegramError> {
        let (token, chat_id) = self.credentials()?;
        let url = self.method_url(token, "sendDocument");

        let message_id = self
            .retry
            .run("telegram.sendDocument", || async {
                // multipart forms are consumed by send, rebuild per attempt
                let document = Part::bytes(content.as_bytes().to_vec())
                    .file_name(file_name.to_string())
                    .mime_str("text/markdown")?;
                let mut form = Form::new()
                    .text("chat_id", chat_id.to_string())
                    .part("document", document);
                if let Some(caption) = caption {
                    form = form
                        .text("caption", caption.to_string())
                        .text("parse_mode", "Markdown");
                }

                let response = self.http.post(&url).multipart(form).send().await?;
                Self::check(response).await
            })
            .await?;

        info!(message_id, file_name, "Document sent to Telegram");
        Ok(())
    }

    async fn check(response: reqwest::Response) -> Result<i64, TelegramError> {
        let status = response.status();
        let parsed: Option<ApiResponse> = response.json().await.ok();

        match parsed {
            Some(body) if status.is_success() && body.ok => {
                Ok(body.result.map(|m| m.message_id).unwrap_or_default())
            }
            Some(body) => Err(TelegramError::Api {
                status: status.as_u16(),
                description: body.description.unwrap_or_else(|| "unknown error".to_string()),
            }),
            None => Err(TelegramError::Api {
                status: status.as_u16(),
                description: "unreadable response body".to_string(),
            }),
        }
    }
}

fn utf16_len(s: &str) -> usize {
    s.encode_utf16().count()
}

/// Split `text` into chunks of at most `limit` UTF-16 units, preferring line
/// boundaries. Lines longer than `limit` are cut on character boundaries.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    if utf16_len(text) <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.split('\n') {
        let line_len = utf16_len(line);
        let separator = usize::from(!current.is_empty());

        if current_len + separator + line_len <= limit {
            if separator == 1 {
                current.push('\n');
            }
            current.push_str(line);
            current_len += separator + line_len;
            continue;
        }

        if !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }

        if line_len <= limit {
            current.push_str(line);
            current_len = line_len;
            continue;
        }

        for c in line.chars() {
            let c_len = c.len_utf16();
            if current_len + c_len > limit {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            current.push(c);
            current_len += c_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_messages_are_not_split() {
        assert_eq!(split_message("hello\nworld", 4096), vec!["hello\nworld".to_string()]);
    }

    #[test]
    fn splits_on_line_boundaries() {
        let text = "aaaa\nbbbb\ncccc";
        assert_eq!(split_message(text, 9), vec!["aaaa\nbbbb", "cccc"]);
    }

    #[test]
    fn long_lines_are_hard_split() {
        let chunks = split_message("abcdefghij", 4);
        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn chunks_respect_the_limit_and_keep_content() {
        let text = (0..500).map(|i| format!("line {i} 📊")).collect::<Vec<_>>().join("\n");
        let chunks = split_message(&text, MAX_MESSAGE_LEN);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| utf16_len(c) <= MAX_MESSAGE_LEN));
        assert_eq!(chunks.join("\n"), text);
    }

    #[test]
    fn unconfigured_client_reports_it() {
        let client = TelegramClient::new(&TelegramConfig {
            api_base: "https://api.telegram.org".into(),
            bot_token: None,
            chat_id: Some("-100".into()),
        });
        assert!(!client.is_configured());
    }

    #[tokio::test]
    async fn sending_without_credentials_fails_fast() {
        let client = TelegramClient::new(&TelegramConfig {
            api_base: "https://api.telegram.org".into(),
            bot_token: Some(String::new()),
            chat_id: None,
        });
        assert!(matches!(client.send_message("hi").await, Err(TelegramError::NotConfigured)));
    }
}
