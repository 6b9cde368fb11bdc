//! AI collaborator boundary. The core hands over cleaned statement text and
//! gets back a structured statement with a fixed key contract; everything
//! about transport, prompts and response shapes stays behind the trait. All
//! failures degrade to the null-filled skeleton, the pipeline never dies on
//! a flaky model endpoint.

use crate::banks::Bank;
use crate::AiStatement;

pub trait AiCollaborator {
    fn structure_statement(&self, cleaned_text: &str, bank: Bank) -> AiStatement;
}

/// Offline collaborator: always the skeleton. Used when no endpoint is
/// configured and in tests.
pub struct NullCollaborator;

impl AiCollaborator for NullCollaborator {
    fn structure_statement(&self, _cleaned_text: &str, bank: Bank) -> AiStatement {
        AiStatement::skeleton(bank)
    }
}

fn create_client() -> Result<reqwest::blocking::Client, String> {
    let http_proxy = std::env::var("http_proxy");
    let https_proxy = std::env::var("https_proxy");
    let builder = reqwest::blocking::Client::builder();
    let builder = match &http_proxy {
        Ok(proxy) => builder.proxy(
            reqwest::Proxy::http(proxy).map_err(|_| "Error: unable to set HTTP proxy")?,
        ),
        Err(_) => builder,
    };
    let builder = match &https_proxy {
        Ok(proxy) => builder.proxy(
            reqwest::Proxy::https(proxy).map_err(|_| "Error: unable to set HTTPS proxy")?,
        ),
        Err(_) => builder,
    };
    builder
        .build()
        .map_err(|_| "Error: unable to create HTTP client".to_string())
}

fn build_prompt(cleaned_text: &str, bank: Bank) -> String {
    format!(
        "You are given the cleaned text of a bank statement (bank: {}).\n\
         Return a single JSON object with exactly these keys:\n\
         account_number, account_holder, bank_name, statement_period,\n\
         opening_balance, closing_balance, total_credits, total_debits,\n\
         transactions (array of objects with date, description, amount, type),\n\
         insights (array of strings).\n\
         Use null for anything you cannot determine. Respond with JSON only.\n\n\
         Statement text:\n{}",
        bank.code(),
        cleaned_text
    )
}

/// Pull the model's text out of a provider response. Google-style
/// `candidates` is probed first, then OpenAI-style `choices`, then common
/// top-level text fields.
fn extract_model_text(response: &serde_json::Value) -> Option<String> {
    if let Some(parts) = response
        .pointer("/candidates/0/content/parts")
        .and_then(|p| p.as_array())
    {
        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(|t| t.as_str()))
            .collect();
        if !text.is_empty() {
            return Some(text);
        }
    }
    if let Some(choice) = response.pointer("/choices/0") {
        if let Some(text) = choice.get("text").and_then(|t| t.as_str()) {
            return Some(text.to_string());
        }
        if let Some(text) = choice
            .pointer("/message/content")
            .and_then(|t| t.as_str())
        {
            return Some(text.to_string());
        }
    }
    for key in ["output", "response", "result"] {
        if let Some(text) = response.get(key).and_then(|t| t.as_str()) {
            return Some(text.to_string());
        }
    }
    None
}

/// Slice the first balanced-looking JSON object out of model prose. Models
/// wrap their JSON in markdown fences or commentary more often than not.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// HTTP collaborator for Gemini-style endpoints. Generic OpenAI-style
/// endpoints work too; the request shape switches on the host.
pub struct GeminiClient {
    endpoint: String,
    api_key: String,
    client: reqwest::blocking::Client,
}

impl GeminiClient {
    pub fn new(endpoint: String, api_key: String) -> Result<GeminiClient, String> {
        Ok(GeminiClient {
            endpoint,
            api_key,
            client: create_client()?,
        })
    }

    fn request(&self, prompt: &str) -> Result<AiStatement, String> {
        let request = if self.endpoint.contains("generativelanguage.googleapis.com") {
            self.client
                .post(&self.endpoint)
                .query(&[("key", self.api_key.as_str())])
                .json(&serde_json::json!({
                    "contents": [{"role": "user", "parts": [{"text": prompt}]}]
                }))
        } else {
            self.client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&serde_json::json!({"prompt": prompt, "max_tokens": 1000}))
        };

        let response = request
            .send()
            .map_err(|e| format!("AI request failed: {}", e))?;
        if !response.status().is_success() {
            return Err(format!("AI endpoint returned {}", response.status()));
        }
        let body: serde_json::Value = response
            .json()
            .map_err(|e| format!("AI response was not JSON: {}", e))?;

        let text =
            extract_model_text(&body).ok_or("no model text found in AI response".to_string())?;
        let object =
            extract_json_object(&text).ok_or("no JSON object in model text".to_string())?;
        serde_json::from_str::<AiStatement>(object)
            .map_err(|e| format!("model JSON did not match the contract: {}", e))
    }
}

impl AiCollaborator for GeminiClient {
    fn structure_statement(&self, cleaned_text: &str, bank: Bank) -> AiStatement {
        match self.request(&build_prompt(cleaned_text, bank)) {
            Ok(statement) => statement,
            Err(e) => {
                log::warn!("AI structuring failed ({}), using skeleton", e);
                AiStatement::skeleton(bank)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_null_collaborator_returns_skeleton() {
        let statement = NullCollaborator.structure_statement("anything", Bank::SBI);
        assert_eq!(statement.bank_name.as_deref(), Some("SBI"));
        assert_eq!(statement.opening_balance, None);
        assert!(statement.transactions.is_empty());

        let statement = NullCollaborator.structure_statement("anything", Bank::Unknown);
        assert_eq!(statement.bank_name, None);
    }

    #[test]
    fn test_extract_json_object_from_prose() {
        let text = "Sure! Here is the JSON:\n```json\n{\"bank_name\": \"HDFC\"}\n```";
        assert_eq!(extract_json_object(text), Some("{\"bank_name\": \"HDFC\"}"));
        assert_eq!(extract_json_object("no json here"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_extract_model_text_google_shape() {
        let response = serde_json::json!({
            "candidates": [{"content": {"parts": [{"text": "{\"a\":"}, {"text": " 1}"}]}}]
        });
        assert_eq!(extract_model_text(&response).as_deref(), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_model_text_openai_shapes() {
        let completion = serde_json::json!({"choices": [{"text": "plain"}]});
        assert_eq!(extract_model_text(&completion).as_deref(), Some("plain"));
        let chat = serde_json::json!({"choices": [{"message": {"content": "chat"}}]});
        assert_eq!(extract_model_text(&chat).as_deref(), Some("chat"));
        let flat = serde_json::json!({"output": "flat"});
        assert_eq!(extract_model_text(&flat).as_deref(), Some("flat"));
        assert_eq!(extract_model_text(&serde_json::json!({"foo": 1})), None);
    }

    #[test]
    fn test_model_json_parses_into_contract() {
        let text = "Here you go:\n{\"bank_name\": \"ICICI\", \"closing_balance\": \"2,500.00\"}";
        let object = extract_json_object(text).unwrap();
        let statement: AiStatement = serde_json::from_str(object).unwrap();
        assert_eq!(statement.bank_name.as_deref(), Some("ICICI"));
        assert_eq!(statement.closing_balance, Some(2500.0));
        assert_eq!(statement.account_number, None);
    }
}
