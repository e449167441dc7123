//! Answer orchestration: retrieval, prompt composition, and the wire stream.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::GenerationError;
use crate::models::{DONE_FRAME, GenerationConfig, ProblemContext, RetrievalConfig, StreamEvent};
use crate::services::generation::{AnswerRequest, AnswerStream, GenerationClient};
use crate::services::search::ContextRetriever;

/// An open stream of answer text deltas.
#[async_trait]
pub trait AnswerDeltas: Send {
    async fn next_delta(&mut self) -> Result<Option<String>, GenerationError>;
}

/// Anything that can answer a prompt as a delta stream.
#[async_trait]
pub trait AnswerSource: Send + Sync {
    async fn open(&self, request: AnswerRequest) -> Result<Box<dyn AnswerDeltas>, GenerationError>;
}

#[async_trait]
impl AnswerDeltas for AnswerStream {
    async fn next_delta(&mut self) -> Result<Option<String>, GenerationError> {
        AnswerStream::next_delta(self).await
    }
}

#[async_trait]
impl AnswerSource for GenerationClient {
    async fn open(&self, request: AnswerRequest) -> Result<Box<dyn AnswerDeltas>, GenerationError> {
        let stream = self.stream_answer(&request).await?;
        Ok(Box::new(stream))
    }
}

/// One tutoring question against a corpus.
#[derive(Debug, Clone)]
pub struct TutorRequest {
    pub corpus_id: String,
    pub question: String,
    pub problem: ProblemContext,
}

/// Composes grounded prompts and drives the answer stream.
///
/// The output is a channel of wire frames: a `start` event, one text block
/// of deltas, `finish`, then the `[DONE]` sentinel. Failures surface as a
/// single `error` event; the sentinel is still sent, exactly once, on every
/// path. A dropped receiver stops the stream early.
pub struct AnswerOrchestrator {
    source: Arc<dyn AnswerSource>,
    retriever: ContextRetriever,
    retrieval: RetrievalConfig,
    max_tokens: u32,
    temperature: f32,
}

impl AnswerOrchestrator {
    pub fn new(
        source: Arc<dyn AnswerSource>,
        retriever: ContextRetriever,
        retrieval: RetrievalConfig,
        generation: &GenerationConfig,
    ) -> Self {
        Self {
            source,
            retriever,
            retrieval,
            max_tokens: generation.max_tokens,
            temperature: generation.temperature,
        }
    }

    /// Answer a question, returning the response as a stream of wire frames.
    ///
    /// Retrieval runs before the stream opens; it is best-effort, and a
    /// failed or empty retrieval degrades to the no-materials prompt.
    pub async fn stream_response(&self, request: TutorRequest) -> mpsc::Receiver<String> {
        let (tx, rx) = mpsc::channel(32);

        let chunks = self
            .retriever
            .query_or_empty(
                &request.corpus_id,
                &request.question,
                self.retrieval.top_k as usize,
                self.retrieval.min_similarity,
            )
            .await;
        debug!(
            corpus_id = %request.corpus_id,
            context_chunks = chunks.len(),
            "answering question"
        );

        let answer_request = AnswerRequest {
            prompt: request.question,
            system_prompt: compose_system_prompt(&request.problem, &chunks),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let source = Arc::clone(&self.source);

        tokio::spawn(async move {
            run_stream(source, answer_request, tx).await;
        });

        rx
    }
}

/// Drive one answer stream to completion, emitting wire frames.
///
/// A send failure means the receiver is gone; the upstream stream is dropped
/// and nothing more is produced.
async fn run_stream(
    source: Arc<dyn AnswerSource>,
    request: AnswerRequest,
    tx: mpsc::Sender<String>,
) {
    let message_id = Uuid::new_v4().to_string();
    let block_id = Uuid::new_v4().to_string();

    let send = |frame: String| {
        let tx = tx.clone();
        async move { tx.send(frame).await.is_ok() }
    };

    let outcome: Result<(), GenerationError> = async {
        let mut deltas = source.open(request).await?;

        if !send(StreamEvent::Start { message_id }.to_frame()).await {
            return Ok(());
        }
        if !send(
            StreamEvent::TextStart {
                id: block_id.clone(),
            }
            .to_frame(),
        )
        .await
        {
            return Ok(());
        }

        while let Some(delta) = deltas.next_delta().await? {
            let event = StreamEvent::TextDelta {
                id: block_id.clone(),
                delta,
            };
            if !send(event.to_frame()).await {
                return Ok(());
            }
        }

        if !send(StreamEvent::TextEnd { id: block_id }.to_frame()).await {
            return Ok(());
        }
        send(StreamEvent::Finish.to_frame()).await;
        Ok(())
    }
    .await;

    if let Err(e) = outcome {
        warn!(error = %e, "answer stream failed");
        let event = StreamEvent::Error {
            error_text: e.to_string(),
        };
        if !send(event.to_frame()).await {
            return;
        }
    }

    let _ = tx.send(DONE_FRAME.to_string()).await;
}

/// Build the grounded system prompt for a question.
///
/// With retrieved context, the prompt confines the model to the supplied
/// course materials. Without it, the prompt switches to a general-guidance
/// stance that names the absence explicitly.
pub fn compose_system_prompt(problem: &ProblemContext, context_chunks: &[String]) -> String {
    let has_context = !context_chunks.is_empty();

    let mut prompt = format!(
        "You are an AI tutoring assistant designed to help students learn programming concepts. \
         You are helping with the \"{}\" problem.\n\
         \n\
         IMPORTANT RESTRICTIONS:\n\
         1. You can ONLY use information from the provided course materials below{}\n\
         2. You must NOT provide direct solutions or complete code implementations\n\
         3. You should guide students to think through problems step by step\n\
         4. If asked about topics not covered in the materials, politely redirect to the assignment content\n\
         5. Encourage learning through hints and questions rather than direct answers\n\
         \n\
         PROBLEM CONTEXT:\n\
         Title: {}\n\
         Description: {}\n",
        problem.title,
        if has_context {
            ""
        } else {
            " (NO MATERIALS PROVIDED - see guidelines below)"
        },
        problem.title,
        problem.description,
    );

    if has_context {
        let materials = context_chunks
            .iter()
            .enumerate()
            .map(|(i, chunk)| format!("[Context {}]: {}", i + 1, chunk))
            .collect::<Vec<_>>()
            .join("\n\n");

        prompt.push_str(&format!(
            "\nCOURSE MATERIALS (ONLY SOURCE OF INFORMATION):\n\
             {materials}\n\
             \n\
             You must base ALL your responses on the above course materials. If the student asks \
             about something not covered in these materials, explain that you can only help with \
             topics covered in the course materials for this assignment.\n"
        ));
    } else {
        prompt.push_str(
            "\nNO COURSE MATERIALS PROVIDED: Since no course materials have been uploaded for \
             this assignment yet, you should:\n\
             1. Explain that specific course materials haven't been provided\n\
             2. Only offer general programming guidance related to the problem\n\
             3. Suggest the student refer to their course materials or ask their instructor for specific concepts\n\
             4. Still avoid giving direct solutions - focus on general problem-solving strategies\n",
        );
    }

    prompt.push_str(
        "\nRESPONSE GUIDELINES:\n\
         - Be encouraging and supportive\n\
         - Ask guiding questions to help the student think\n\
         - Break down complex problems into smaller steps\n\
         - Reference specific parts of the course materials when applicable\n\
         - If you cannot help with a question, explain why and redirect appropriately\n\
         \n\
         Remember: Your goal is to facilitate learning, not to provide answers directly.",
    );

    prompt
}
