//! Summarization port and response-shape handling

mod openai;

pub use openai::OpenAiSummarizer;

use crate::error::{DigestError, SummarizeError};
use serde::Deserialize;

/// One text-bearing output item
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextItem {
    /// Item type as reported by the endpoint, e.g. `output_text`
    pub kind: String,
    pub text: String,
}

/// What a summarization call produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelResponse {
    /// A flat text field
    DirectText(String),
    /// Typed output items, concatenated in order
    StructuredItems(Vec<TextItem>),
    /// No text under either shape
    Empty,
}

impl ModelResponse {
    /// Text carried by the response, `None` when there is nothing usable
    pub fn into_text(self) -> Option<String> {
        let text = match self {
            ModelResponse::DirectText(text) => text,
            ModelResponse::StructuredItems(items) => items
                .into_iter()
                .map(|item| item.text)
                .filter(|t| !t.trim().is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
            ModelResponse::Empty => return None,
        };
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Classify a Responses-style JSON body
    pub fn from_json(value: serde_json::Value) -> Result<Self, SummarizeError> {
        let body: ResponseBody = serde_json::from_value(value)
            .map_err(|e| SummarizeError::InvalidResponse(e.to_string()))?;
        Ok(body.into_response())
    }
}

#[derive(Debug, Deserialize)]
struct ResponseBody {
    #[serde(default)]
    output_text: Option<String>,
    #[serde(default)]
    output: Vec<OutputItem>,
}

#[derive(Debug, Deserialize)]
struct OutputItem {
    #[serde(default)]
    content: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl ResponseBody {
    fn into_response(self) -> ModelResponse {
        if let Some(text) = self.output_text
            && !text.trim().is_empty()
        {
            return ModelResponse::DirectText(text);
        }

        let items: Vec<TextItem> = self
            .output
            .into_iter()
            .flat_map(|item| item.content)
            .filter(|part| matches!(part.kind.as_str(), "output_text" | "text"))
            .filter_map(|part| {
                part.text.map(|text| TextItem {
                    kind: part.kind,
                    text,
                })
            })
            .collect();

        if items.is_empty() {
            ModelResponse::Empty
        } else {
            ModelResponse::StructuredItems(items)
        }
    }
}

/// Remote text summarizer
pub trait Summarizer: Send + Sync {
    /// Submit a prompt with instructions; no retry is attempted
    fn submit(&self, prompt: &str, instructions: &str) -> Result<ModelResponse, DigestError>;

    /// Model identifier, for logging
    fn model_name(&self) -> &str;
}

/// Submit one stage and require text back
///
/// An empty response becomes [`SummarizeError::EmptyModelResponse`] naming `stage`.
pub fn summarize_stage(
    summarizer: &dyn Summarizer,
    stage: &str,
    prompt: &str,
    instructions: &str,
) -> Result<String, DigestError> {
    tracing::debug!(
        "Submitting stage '{}' ({} chars) to {}",
        stage,
        prompt.chars().count(),
        summarizer.model_name()
    );
    summarizer
        .submit(prompt, instructions)?
        .into_text()
        .ok_or_else(|| SummarizeError::EmptyModelResponse(stage.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_flat_text_field() {
        let response = ModelResponse::from_json(json!({ "output_text": "notes" })).unwrap();
        assert_eq!(response, ModelResponse::DirectText("notes".to_string()));
        assert_eq!(response.into_text().as_deref(), Some("notes"));
    }

    #[test]
    fn test_structured_items_concatenated_in_order() {
        let payload = json!({
            "output": [
                { "type": "reasoning", "content": [] },
                { "type": "message", "content": [
                    { "type": "output_text", "text": "first" },
                    { "type": "refusal", "refusal": "no" },
                    { "type": "output_text", "text": "second" }
                ]}
            ]
        });
        let response = ModelResponse::from_json(payload).unwrap();
        assert!(matches!(response, ModelResponse::StructuredItems(ref items) if items.len() == 2));
        assert_eq!(response.into_text().as_deref(), Some("first\nsecond"));
    }

    #[test]
    fn test_blank_flat_text_falls_back_to_items() {
        let payload = json!({
            "output_text": "  ",
            "output": [{ "content": [{ "type": "text", "text": "body" }] }]
        });
        let response = ModelResponse::from_json(payload).unwrap();
        assert_eq!(response.into_text().as_deref(), Some("body"));
    }

    #[test]
    fn test_no_text_is_empty() {
        for payload in [json!({}), json!({ "output": [] }), json!({ "output_text": null })] {
            let response = ModelResponse::from_json(payload).unwrap();
            assert_eq!(response, ModelResponse::Empty);
            assert!(response.into_text().is_none());
        }
        let whitespace = ModelResponse::StructuredItems(vec![TextItem {
            kind: "output_text".into(),
            text: " \n".into(),
        }]);
        assert!(whitespace.into_text().is_none());
    }

    #[test]
    fn test_malformed_body() {
        let err = ModelResponse::from_json(json!({ "output": "oops" })).unwrap_err();
        assert!(matches!(err, SummarizeError::InvalidResponse(_)));
    }

    struct Fixed(ModelResponse);

    impl Summarizer for Fixed {
        fn submit(&self, _prompt: &str, _instructions: &str) -> Result<ModelResponse, DigestError> {
            Ok(self.0.clone())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_summarize_stage_names_empty_stage() {
        let err = summarize_stage(&Fixed(ModelResponse::Empty), "batch 2/3", "p", "i").unwrap_err();
        assert_eq!(err.stage_label(), Some("batch 2/3"));

        let text = summarize_stage(&Fixed(ModelResponse::DirectText("ok".into())), "final", "p", "i")
            .unwrap();
        assert_eq!(text, "ok");
    }
}
