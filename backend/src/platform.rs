use axum::async_trait;
use serde_json::{json, Value};
use tracing::error;

use crate::error::Error;

/// Outbound surface of the messaging platform. Everything the bot sends or
/// asks the platform goes through this trait so dispatch can be exercised
/// against a recording double in tests.
#[async_trait]
pub trait PlatformApi: Send + Sync {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Value>,
    ) -> Result<(), Error>;

    async fn send_sticker(&self, chat_id: i64, sticker: &str) -> Result<(), Error>;

    /// Cosmetic slot-machine animation; failures are harmless.
    async fn send_dice(&self, chat_id: i64) -> Result<(), Error>;

    /// Membership oracle for the channel-subscription gate.
    async fn is_channel_member(&self, channel: &str, user_id: i64) -> Result<bool, Error>;

    async fn bot_username(&self) -> Result<String, Error>;
}

/// HTTP implementation speaking the bot-token URL scheme
/// (`{base}/bot{token}/{method}` with JSON bodies).
pub struct HttpPlatform {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl HttpPlatform {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
            token,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    async fn call(&self, method: &str, body: Value) -> Result<Value, Error> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Platform(format!("{} request failed: {}", method, e)))?;

        if !response.status().is_success() {
            return Err(Error::Platform(format!(
                "{} returned status {}",
                method,
                response.status()
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| Error::Platform(format!("{} returned invalid JSON: {}", method, e)))
    }
}

#[async_trait]
impl PlatformApi for HttpPlatform {
    async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        keyboard: Option<Value>,
    ) -> Result<(), Error> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if let Some(markup) = keyboard {
            body["reply_markup"] = json!({ "inline_keyboard": markup });
        }
        self.call("sendMessage", body).await?;
        Ok(())
    }

    async fn send_sticker(&self, chat_id: i64, sticker: &str) -> Result<(), Error> {
        self.call("sendSticker", json!({ "chat_id": chat_id, "sticker": sticker }))
            .await?;
        Ok(())
    }

    async fn send_dice(&self, chat_id: i64) -> Result<(), Error> {
        self.call("sendDice", json!({ "chat_id": chat_id, "emoji": "🎰" }))
            .await?;
        Ok(())
    }

    async fn is_channel_member(&self, channel: &str, user_id: i64) -> Result<bool, Error> {
        let result = self
            .call(
                "getChatMember",
                json!({ "chat_id": channel, "user_id": user_id }),
            )
            .await;

        // Any oracle failure counts as "not subscribed".
        let response = match result {
            Ok(v) => v,
            Err(e) => {
                error!("Membership check failed for {}: {}", channel, e);
                return Ok(false);
            }
        };

        let status = response["result"]["status"].as_str().unwrap_or("");
        Ok(matches!(status, "creator" | "administrator" | "member"))
    }

    async fn bot_username(&self) -> Result<String, Error> {
        let response = self.call("getMe", json!({})).await?;
        Ok(response["result"]["username"]
            .as_str()
            .unwrap_or("")
            .to_string())
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Sent {
        Message { chat_id: i64, text: String, has_keyboard: bool },
        Sticker { chat_id: i64, sticker: String },
        Dice { chat_id: i64 },
    }

    /// Records every outbound call instead of talking to the network.
    pub struct RecordingPlatform {
        pub sent: Mutex<Vec<Sent>>,
        pub member: Mutex<Result<bool, String>>,
        pub username: String,
    }

    impl RecordingPlatform {
        pub fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                member: Mutex::new(Ok(true)),
                username: "gift_roulette_bot".to_string(),
            }
        }

        pub fn set_member(&self, value: Result<bool, String>) {
            *self.member.lock().unwrap() = value;
        }

        pub fn messages(&self) -> Vec<Sent> {
            self.sent.lock().unwrap().clone()
        }

        pub fn texts_to(&self, chat_id: i64) -> Vec<String> {
            self.messages()
                .into_iter()
                .filter_map(|s| match s {
                    Sent::Message { chat_id: c, text, .. } if c == chat_id => Some(text),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl PlatformApi for RecordingPlatform {
        async fn send_message(
            &self,
            chat_id: i64,
            text: &str,
            keyboard: Option<Value>,
        ) -> Result<(), Error> {
            self.sent.lock().unwrap().push(Sent::Message {
                chat_id,
                text: text.to_string(),
                has_keyboard: keyboard.is_some(),
            });
            Ok(())
        }

        async fn send_sticker(&self, chat_id: i64, sticker: &str) -> Result<(), Error> {
            self.sent.lock().unwrap().push(Sent::Sticker {
                chat_id,
                sticker: sticker.to_string(),
            });
            Ok(())
        }

        async fn send_dice(&self, chat_id: i64) -> Result<(), Error> {
            self.sent.lock().unwrap().push(Sent::Dice { chat_id });
            Ok(())
        }

        async fn is_channel_member(&self, _channel: &str, _user_id: i64) -> Result<bool, Error> {
            self.member
                .lock()
                .unwrap()
                .clone()
                .map_err(Error::Platform)
        }

        async fn bot_username(&self) -> Result<String, Error> {
            Ok(self.username.clone())
        }
    }
}
