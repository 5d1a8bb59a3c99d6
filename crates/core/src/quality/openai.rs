//! A relevance judge backed by an OpenAI compatible chat-completions API.

use std::str::FromStr;

use async_trait::async_trait;
use indoc::formatdoc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tracing::{debug, instrument};

use crate::config::OpenAiConfig;
use crate::errors::QualityError;
use crate::quality::RelevanceJudge;

#[cfg(test)]
#[path = "openai_tests.rs"]
mod tests;

/// Asks a chat model to rate each comment against the issue specification.
#[derive(Debug, Clone)]
pub struct OpenAiRelevanceJudge {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiRelevanceJudge {
    pub fn new(api_key: String, config: &OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: config.model.clone(),
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        }
    }

    fn system_prompt(comment_count: usize) -> String {
        formatdoc!(
            "
            You evaluate how relevant comments in a GitHub issue conversation are to the issue specification.
            Rate each comment with a number from 0 to 1, where 0 is unrelated noise and 1 is essential to resolving the issue.
            Reply with a JSON array of exactly {count} numbers, one per comment, in the order given. Reply with nothing else.
            ",
            count = comment_count
        )
    }

    fn user_prompt(specification: &str, comments: &[String]) -> Result<String, QualityError> {
        let comments = serde_json::to_string_pretty(comments)
            .map_err(|e| QualityError::Request(e.to_string()))?;

        Ok(formatdoc!(
            "
            Specification:
            {specification}

            Comments (JSON array):
            {comments}
            "
        ))
    }
}

#[async_trait]
impl RelevanceJudge for OpenAiRelevanceJudge {
    #[instrument(skip(self, specification, comments), fields(model = %self.model, comments = comments.len()))]
    async fn judge_relevance(
        &self,
        specification: &str,
        comments: &[String],
    ) -> Result<Vec<Decimal>, QualityError> {
        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [
                { "role": "system", "content": Self::system_prompt(comments.len()) },
                { "role": "user", "content": Self::user_prompt(specification, comments)? },
            ],
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| QualityError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(QualityError::Request(format!(
                "API error ({}): {}",
                status, error_text
            )));
        }

        let response_json: Value = response
            .json()
            .await
            .map_err(|e| QualityError::InvalidResponse(e.to_string()))?;
        let content = response_json["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| QualityError::InvalidResponse("missing message content".to_string()))?;

        let scores = parse_scores(content)?;
        if scores.len() != comments.len() {
            return Err(QualityError::LengthMismatch {
                expected: comments.len(),
                received: scores.len(),
            });
        }

        debug!(scores = scores.len(), "Received relevance scores");
        Ok(scores)
    }
}

/// Extracts the JSON array of scores from a model reply. Markdown code
/// fences and text around the array are ignored.
pub fn parse_scores(content: &str) -> Result<Vec<Decimal>, QualityError> {
    let start = content.find('[');
    let end = content.rfind(']');
    let array = match (start, end) {
        (Some(start), Some(end)) if start < end => &content[start..=end],
        _ => {
            return Err(QualityError::InvalidResponse(format!(
                "no JSON array in '{}'",
                content
            )))
        }
    };

    let values: Vec<Value> =
        serde_json::from_str(array).map_err(|e| QualityError::InvalidResponse(e.to_string()))?;

    values.iter().map(parse_score).collect()
}

fn parse_score(value: &Value) -> Result<Decimal, QualityError> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        other => {
            return Err(QualityError::InvalidResponse(format!(
                "'{}' is not a score",
                other
            )))
        }
    };

    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| QualityError::InvalidResponse(format!("'{}' is not a score", text)))
}
