// src/services/insight.rs

//! Market insight generation through an OpenAI-compatible chat endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::ReportConfig;
use crate::utils::http::{classify_status, classify_transport};
use crate::utils::retry::RetryPolicy;

const SYSTEM_PROMPT: &str = "You are a job market analyst. Write a concise, structured market \
report with the sections MARKET_TRENDS, SALARY_ANALYSIS, SKILL_REQUIREMENTS, \
LOCATION_INSIGHTS, COMPANY_ANALYSIS, CAREER_ADVICE and GROWTH_OPPORTUNITIES. \
Base every claim on the listings and statistics provided. Plain text only.";

/// Text in, text out. The output is stored verbatim.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Build the configured generator, or `None` when insight generation is off.
pub fn build_generator(config: &ReportConfig) -> Result<Option<Box<dyn InsightGenerator>>> {
    if !config.enabled {
        return Ok(None);
    }
    let api_key = std::env::var(&config.api_key_env).unwrap_or_default();
    if api_key.trim().is_empty() {
        log::warn!(
            "{} is not set; insight generation will fail and only the CSV will be written",
            config.api_key_env
        );
    }
    Ok(Some(Box::new(OpenAiInsightGenerator::new(config, api_key)?)))
}

pub struct OpenAiInsightGenerator {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
    api_key_env: String,
    retry: RetryPolicy,
}

impl OpenAiInsightGenerator {
    pub fn new(config: &ReportConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            api_key_env: config.api_key_env.clone(),
            retry: RetryPolicy::new(
                config.max_attempts,
                Duration::from_secs(1),
                Duration::from_secs(10),
            ),
        })
    }

    async fn attempt(&self, prompt: &str) -> Result<String> {
        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            messages: Vec<Msg<'a>>,
            temperature: f32,
        }
        #[derive(Deserialize)]
        struct Resp {
            choices: Vec<Choice>,
        }
        #[derive(Deserialize)]
        struct Choice {
            message: ChoiceMsg,
        }
        #[derive(Deserialize)]
        struct ChoiceMsg {
            #[serde(default)]
            content: Option<String>,
        }

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                Msg {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.3,
        };

        let resp = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| classify_transport("insight", e))?;

        if !resp.status().is_success() {
            return Err(classify_status("insight", resp.status(), resp.headers()));
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| AppError::parse("insight response", e))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        sanitize_insight(&content).ok_or_else(|| AppError::report("empty completion"))
    }
}

#[async_trait]
impl InsightGenerator for OpenAiInsightGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        if self.api_key.trim().is_empty() {
            return Err(AppError::report(format!("{} is not set", self.api_key_env)));
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && self.retry.allows_retry(attempt) => {
                    let delay = self.retry.delay_for(attempt, e.retry_after());
                    log::warn!("Insight attempt {attempt} failed: {e}; retrying in {delay:?}");
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(AppError::report(e)),
            }
        }
    }
}

/// Trim a completion; `None` when nothing is left.
pub fn sanitize_insight(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
