//! The generic provider/tool loop shared by all pipeline steps.

use std::sync::Arc;
use std::time::Instant;

use labfollowup_core::message::Message;
use labfollowup_core::provider::{Provider, ProviderRequest};
use labfollowup_core::tool::{ToolCall, ToolRegistry};
use labfollowup_core::Error;
use tracing::{debug, warn};

use crate::roles::RoleDefinition;

/// Runs one role's step to completion: system prompt from the role, user
/// prompt from the task, then an LLM/tool loop until the model answers in
/// plain text or the iteration cap is hit.
pub struct StepRunner {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    max_tool_iterations: u32,
}

impl StepRunner {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.2,
            max_tokens: None,
            max_tool_iterations: 8,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    /// Set the maximum number of provider round trips per step.
    pub fn with_max_tool_iterations(mut self, max: u32) -> Self {
        self.max_tool_iterations = max;
        self
    }

    /// Execute one step and return its text output.
    ///
    /// Each provider round trip may request tool calls; these are executed
    /// sequentially and their outputs fed back as tool messages. Hitting the
    /// iteration cap ends the step with the last assistant text seen.
    pub async fn run_step(
        &self,
        role: &RoleDefinition,
        task_prompt: &str,
        tools: &ToolRegistry,
    ) -> Result<String, Error> {
        debug!(role = role.name, tools = ?role.tools, "Starting step");

        let mut messages = vec![
            Message::system(role.system_prompt()),
            Message::user(task_prompt),
        ];
        let definitions = tools.definitions();

        let mut last_text = String::new();
        let mut iteration = 0;

        loop {
            iteration += 1;
            if iteration > self.max_tool_iterations {
                warn!(
                    role = role.name,
                    iterations = self.max_tool_iterations,
                    "Max tool iterations reached, using last assistant text"
                );
                break;
            }

            let mut request =
                ProviderRequest::new(self.model.clone(), messages.clone(), definitions.clone());
            request.temperature = self.temperature;
            request.max_tokens = self.max_tokens;

            let response = self.provider.complete(request).await?;

            if let Some(usage) = &response.usage {
                debug!(
                    role = role.name,
                    iteration,
                    tokens = usage.total_tokens,
                    "Provider responded"
                );
            }

            if response.message.tool_calls.is_empty() {
                return Ok(response.message.content);
            }

            if !response.message.content.is_empty() {
                last_text = response.message.content.clone();
            }

            let tool_calls = response.message.tool_calls.clone();
            messages.push(response.message);

            for tc in &tool_calls {
                let call = ToolCall {
                    id: tc.id.clone(),
                    name: tc.name.clone(),
                    arguments: serde_json::from_str(&tc.arguments).unwrap_or_default(),
                };

                let start = Instant::now();
                match tools.execute(&call).await {
                    Ok(result) => {
                        debug!(
                            tool = %tc.name,
                            success = result.success,
                            duration_ms = start.elapsed().as_millis() as u64,
                            "Tool executed"
                        );
                        messages.push(Message::tool_result(&tc.id, &result.output));
                    }
                    Err(e) => {
                        // Reported to the model so it can recover or rephrase.
                        warn!(tool = %tc.name, error = %e, "Tool execution failed");
                        messages.push(Message::tool_result(&tc.id, format!("Error: {e}")));
                    }
                }
            }
        }

        Ok(last_text)
    }
}
