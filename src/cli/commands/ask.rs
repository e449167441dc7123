//! Ask command implementation: streams a grounded answer to the terminal.

use anyhow::Result;
use clap::Args;
use std::io::Write;
use std::sync::Arc;

use crate::cli::output::get_formatter;
use crate::models::{Config, Frame, OutputFormat, ProblemContext, StreamEvent, decode_frame};
use crate::services::{
    AnswerOrchestrator, ContextRetriever, CorpusStoreClient, EmbeddingClient, GenerationClient,
    TutorRequest,
};

#[derive(Debug, Args)]
pub struct AskArgs {
    #[arg(required = true, help = "Question to ask the tutor")]
    pub question: String,

    /// Corpus identifier holding the course materials
    #[arg(long, short = 'c')]
    pub corpus: String,

    #[arg(long, help = "Problem title the question is about")]
    pub title: Option<String>,

    #[arg(long, help = "Problem description the question is about")]
    pub description: Option<String>,

    /// Print raw wire frames instead of plain answer text
    #[arg(long)]
    pub wire: bool,
}

pub async fn handle_ask(args: AskArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let question = args.question.trim();
    if question.is_empty() {
        anyhow::bail!("question cannot be empty");
    }

    let config = Config::load()?;
    let formatter = get_formatter(format);

    let problem = match (args.title, args.description) {
        (Some(title), Some(description)) => ProblemContext {
            id: args.corpus.clone(),
            title,
            description,
        },
        (None, None) => ProblemContext::default(),
        _ => anyhow::bail!("--title and --description must be given together"),
    };

    if verbose {
        eprintln!("Question: \"{question}\"");
        eprintln!("  Corpus: {}", args.corpus);
        eprintln!("  Problem: {}", problem.title);
    }

    let retriever = ContextRetriever::new(
        Arc::new(CorpusStoreClient::new(&config.storage)),
        Arc::new(EmbeddingClient::new(&config.embedding)?),
    );
    let generation = GenerationClient::new(&config.generation)?;
    let orchestrator = AnswerOrchestrator::new(
        Arc::new(generation),
        retriever,
        config.retrieval.clone(),
        &config.generation,
    );

    let mut rx = orchestrator
        .stream_response(TutorRequest {
            corpus_id: args.corpus,
            question: question.to_string(),
            problem,
        })
        .await;

    let mut stdout = std::io::stdout();
    let mut failed = false;

    while let Some(frame) = rx.recv().await {
        if args.wire {
            print!("{frame}");
            stdout.flush()?;
            continue;
        }

        match decode_frame(&frame) {
            Some(Frame::Event(StreamEvent::TextDelta { delta, .. })) => {
                print!("{delta}");
                stdout.flush()?;
            }
            Some(Frame::Event(StreamEvent::Error { error_text })) => {
                eprint!("{}", formatter.format_error(&error_text));
                failed = true;
            }
            Some(Frame::Done) => break,
            _ => {}
        }
    }

    if !args.wire {
        println!();
    }
    if failed {
        anyhow::bail!("answer stream ended with an error");
    }

    Ok(())
}
