use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::conversation::Message;

/// Body of `POST /api/v1/chat`. Everything but `message` falls back to configuration.
/// The candidate name always comes from configuration; a `name` field is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
    pub conversation_id: Option<String>,
    pub model: Option<String>,
    pub endpoint: Option<String>,
    pub credential: Option<String>,
    pub temperature: Option<f32>,
}

/// One relay call with every setting resolved.
#[derive(Clone)]
pub struct ChatTurn {
    pub name: String,
    pub message: String,
    pub conversation_id: Option<String>,
    pub model: String,
    pub endpoint: String,
    pub credential: Option<String>,
    pub temperature: f32,
}

impl ChatRequest {
    /// Resolves the turn against `config`. The configured API key is only
    /// ever sent to the configured endpoint; a caller pointing the relay
    /// elsewhere must bring its own credential.
    pub fn into_turn(self, config: &Config) -> ChatTurn {
        let endpoint =
            non_blank(self.endpoint).unwrap_or_else(|| config.openrouter_endpoint.clone());
        let credential = non_blank(self.credential).or_else(|| {
            if endpoint == config.openrouter_endpoint {
                non_blank(config.openrouter_api_key.clone())
            } else {
                None
            }
        });

        ChatTurn {
            name: config.candidate_name.clone(),
            message: self.message,
            conversation_id: self.conversation_id,
            model: non_blank(self.model).unwrap_or_else(|| config.model.clone()),
            endpoint,
            credential,
            temperature: self.temperature.unwrap_or(config.temperature),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub result: String,
    pub conversation_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationHistory {
    pub conversation_id: String,
    pub messages: Vec<Message>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_fields_override_config() {
        let mut config = Config::for_tests("https://upstream.test/chat");
        config.openrouter_api_key = Some("sk-config".to_string());
        let request: ChatRequest = serde_json::from_value(serde_json::json!({
            "message": "hi",
            "conversationId": "abc",
            "model": "other/model",
            "credential": "sk-request",
            "temperature": 0.7
        }))
        .unwrap();

        let turn = request.into_turn(&config);
        assert_eq!(turn.conversation_id.as_deref(), Some("abc"));
        assert_eq!(turn.model, "other/model");
        assert_eq!(turn.credential.as_deref(), Some("sk-request"));
        assert_eq!(turn.endpoint, "https://upstream.test/chat");
        assert_eq!(turn.temperature, 0.7);
    }

    #[test]
    fn test_request_name_is_ignored() {
        let config = Config::for_tests("https://upstream.test/chat");
        let request: ChatRequest = serde_json::from_value(serde_json::json!({
            "message": "hi",
            "name": "Mallory"
        }))
        .unwrap();

        assert_eq!(request.into_turn(&config).name, "Ada Lovelace");
    }

    #[test]
    fn test_configured_key_only_goes_to_configured_endpoint() {
        let mut config = Config::for_tests("https://upstream.test/chat");
        config.openrouter_api_key = Some("sk-config".to_string());

        let default_endpoint = ChatRequest {
            message: "hi".to_string(),
            ..Default::default()
        };
        assert_eq!(
            default_endpoint.into_turn(&config).credential.as_deref(),
            Some("sk-config")
        );

        let same_endpoint = ChatRequest {
            message: "hi".to_string(),
            endpoint: Some("https://upstream.test/chat".to_string()),
            ..Default::default()
        };
        assert_eq!(
            same_endpoint.into_turn(&config).credential.as_deref(),
            Some("sk-config")
        );

        let foreign = ChatRequest {
            message: "hi".to_string(),
            endpoint: Some("https://attacker.test/collect".to_string()),
            ..Default::default()
        };
        let turn = foreign.into_turn(&config);
        assert_eq!(turn.endpoint, "https://attacker.test/collect");
        assert_eq!(turn.credential, None);

        let foreign_with_key = ChatRequest {
            message: "hi".to_string(),
            endpoint: Some("https://other.test/chat".to_string()),
            credential: Some("sk-caller".to_string()),
            ..Default::default()
        };
        assert_eq!(
            foreign_with_key.into_turn(&config).credential.as_deref(),
            Some("sk-caller")
        );
    }

    #[test]
    fn test_blank_credential_falls_back_then_goes_missing() {
        let config = Config::for_tests("https://upstream.test/chat");
        let request = ChatRequest {
            message: "hi".to_string(),
            credential: Some("   ".to_string()),
            ..Default::default()
        };
        assert_eq!(request.into_turn(&config).credential, None);
    }

    #[test]
    fn test_missing_message_deserializes_as_empty() {
        let request: ChatRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.message, "");
    }
}
