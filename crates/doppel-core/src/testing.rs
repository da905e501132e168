//! Scripted `CompletionBackend` and `Retriever` fakes for tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use crate::interfaces::{ChatMessage, CompletionBackend, RetrievedChunk, Retriever};

/// Completion backend that replays canned structured replies in order and
/// answers every chat call with one fixed reply.
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<String>>,
    chat_reply: String,
    failure: Option<String>,
    structured_calls: Mutex<Vec<(String, String, u32)>>,
    chat_calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedBackend {
    pub fn new(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            chat_reply: String::new(),
            failure: None,
            structured_calls: Mutex::new(Vec::new()),
            chat_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_chat_reply(mut self, reply: &str) -> Self {
        self.chat_reply = reply.to_string();
        self
    }

    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new(Vec::new())
        }
    }

    pub fn structured_calls(&self) -> Vec<(String, String, u32)> {
        self.structured_calls.lock().unwrap().clone()
    }

    pub fn chat_calls(&self) -> Vec<Vec<ChatMessage>> {
        self.chat_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn generate_chat_completion(&self, messages: &[ChatMessage]) -> anyhow::Result<String> {
        self.chat_calls.lock().unwrap().push(messages.to_vec());
        match &self.failure {
            Some(msg) => Err(anyhow::anyhow!(msg.clone())),
            None => Ok(self.chat_reply.clone()),
        }
    }

    async fn generate_structured_completion(
        &self,
        prompt: &str,
        system: &str,
        max_tokens: u32,
    ) -> anyhow::Result<String> {
        self.structured_calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), system.to_string(), max_tokens));
        if let Some(msg) = &self.failure {
            return Err(anyhow::anyhow!(msg.clone()));
        }
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| anyhow::anyhow!("no scripted reply left"))
    }

    fn model_name(&self) -> &str {
        "scripted-model"
    }
}

/// Retriever returning a fixed list, truncated to `k`.
pub struct FixedRetriever(pub Vec<RetrievedChunk>);

#[async_trait]
impl Retriever for FixedRetriever {
    async fn retrieve(&self, _query: &str, k: usize) -> anyhow::Result<Vec<RetrievedChunk>> {
        Ok(self.0.iter().take(k).cloned().collect())
    }
}

/// Retriever that always fails with the given message.
pub struct FailingRetriever(pub String);

#[async_trait]
impl Retriever for FailingRetriever {
    async fn retrieve(&self, _query: &str, _k: usize) -> anyhow::Result<Vec<RetrievedChunk>> {
        Err(anyhow::anyhow!(self.0.clone()))
    }
}
