use serde_json::{Value, json};

use crate::error::OpenAiError;
use crate::types::{CompletionRequest, GenerationParams};

/// Builds the full chat-completions request body.
pub fn build_request_body(request: &CompletionRequest) -> Value {
    let mut body = json!({
        "model": request.model,
        "messages": [
            {
                "role": "system",
                "content": request.instruction
            },
            {
                "role": "user",
                "content": request.utterance
            }
        ]
    });

    apply_generation_params(&mut body, &request.params);

    body
}

/// Applies GenerationParams to the request body.
fn apply_generation_params(body: &mut Value, params: &GenerationParams) {
    if let Some(temp) = params.temperature {
        body["temperature"] = json!(temp);
    }
    if let Some(max_tokens) = params.max_tokens {
        body["max_tokens"] = json!(max_tokens);
    }
}

/// Extracts the trimmed assistant text from a chat-completions response.
///
/// Content may be a plain string or an array of text parts; parts are
/// concatenated in order.
pub fn parse_response(response: &Value) -> Result<String, OpenAiError> {
    let choice = response
        .get("choices")
        .and_then(|c| c.get(0))
        .ok_or_else(|| OpenAiError::MalformedResponse("No choices in response".to_string()))?;

    let msg = choice
        .get("message")
        .ok_or_else(|| OpenAiError::MalformedResponse("No message in choice".to_string()))?;

    let content = msg
        .get("content")
        .ok_or_else(|| OpenAiError::MalformedResponse("No content in message".to_string()))?;

    let text = if let Some(text) = content.as_str() {
        text.to_string()
    } else if let Some(parts) = content.as_array() {
        parts
            .iter()
            .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
            .collect::<String>()
    } else {
        return Err(OpenAiError::MalformedResponse(
            "Content is neither text nor parts".to_string(),
        ));
    };

    Ok(text.trim().to_string())
}

/// Pulls a human-readable message out of an error response body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                "Unknown error".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-3.5-turbo".to_string(),
            instruction: "You are a mentor.".to_string(),
            utterance: "How do I switch careers into tech?".to_string(),
            params: GenerationParams::default(),
        }
    }

    #[test]
    fn test_build_request_body() {
        let body = build_request_body(&request());

        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"].as_array().unwrap().len(), 2);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are a mentor.");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(
            body["messages"][1]["content"],
            "How do I switch careers into tech?"
        );
        assert_eq!(body["max_tokens"], 500);
        assert!((body["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_build_request_body_without_params() {
        let mut req = request();
        req.params = GenerationParams {
            temperature: None,
            max_tokens: None,
        };
        let body = build_request_body(&req);

        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_parse_response_simple() {
        let response = json!({
            "model": "gpt-3.5-turbo",
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": "  Update your resume.\n"
                },
                "finish_reason": "stop"
            }]
        });

        assert_eq!(parse_response(&response).unwrap(), "Update your resume.");
    }

    #[test]
    fn test_parse_response_parts() {
        let response = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": [
                        {"type": "text", "text": "Practice "},
                        {"type": "text", "text": "mock interviews."}
                    ]
                }
            }]
        });

        assert_eq!(parse_response(&response).unwrap(), "Practice mock interviews.");
    }

    #[test]
    fn test_parse_response_no_choices() {
        let response = json!({ "choices": [] });
        let err = parse_response(&response).unwrap_err();
        assert!(matches!(err, OpenAiError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_response_null_content() {
        let response = json!({
            "choices": [{ "message": { "role": "assistant", "content": null } }]
        });
        assert!(parse_response(&response).is_err());
    }

    #[test]
    fn test_error_message_from_api_body() {
        let body = r#"{"error": {"message": "Incorrect API key provided", "type": "invalid_request_error"}}"#;
        assert_eq!(error_message(body), "Incorrect API key provided");
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(error_message("  "), "Unknown error");
    }
}
