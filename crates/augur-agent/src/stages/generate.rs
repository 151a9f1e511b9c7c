use futures::StreamExt;
use tracing::{debug, error};

use augur_core::error::Result;
use augur_core::event::EventSink;
use augur_core::types::{ChatMessage, StreamDelta};

use super::PipelineDeps;
use crate::state::PipelineState;

/// The user turn sent to the model.
pub fn prompt(question: &str, documents: &[String]) -> String {
    format!("Question: {}\nContext: {}", question, documents.join("\n"))
}

/// Apology appended to the answer when the model fails.
pub fn apology(e: &dyn std::fmt::Display) -> String {
    format!("抱歉，生成回答时出现错误: {}", e)
}

/// Stream the answer from the LLM. A failure mid-way keeps the tokens
/// already sent and appends the apology.
pub async fn generate(deps: &PipelineDeps, state: &mut PipelineState, sink: &EventSink) {
    let messages = vec![
        ChatMessage::system(deps.pipeline.system_prompt.clone()),
        ChatMessage::user(prompt(&state.question, &state.documents)),
    ];

    let mut answer = String::new();
    if let Err(e) = stream_answer(deps, messages, sink, &mut answer).await {
        error!(error = %e, "Generation failed");
        let text = apology(&e);
        sink.token(text.clone()).await;
        answer.push_str(&text);
    }

    debug!(chars = answer.chars().count(), "Generated answer");
    state.messages.push(ChatMessage::user(state.question.clone()));
    state.messages.push(ChatMessage::assistant_text(answer.clone()));
    state.generation = answer;
}

async fn stream_answer(
    deps: &PipelineDeps,
    messages: Vec<ChatMessage>,
    sink: &EventSink,
    answer: &mut String,
) -> Result<()> {
    let mut stream = deps.llm.chat_stream(&deps.model, messages).await?;
    while let Some(delta) = stream.next().await {
        match delta? {
            StreamDelta::TextDelta(text) => {
                sink.token(text.clone()).await;
                answer.push_str(&text);
            }
            StreamDelta::Stop(reason) => {
                debug!(?reason, "Stream stopped");
                break;
            }
            StreamDelta::Usage {
                input_tokens,
                output_tokens,
            } => {
                debug!(input_tokens, output_tokens, "Token usage");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_layout() {
        let docs = vec!["甲".to_string(), "乙".to_string()];
        assert_eq!(prompt("问", &docs), "Question: 问\nContext: 甲\n乙");
    }

    #[test]
    fn test_apology_text() {
        assert_eq!(apology(&"boom"), "抱歉，生成回答时出现错误: boom");
    }
}
