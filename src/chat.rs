//! Question answering over the knowledge store.
//!
//! [`ChatService`] is what an interactive front end talks to. It owns one
//! store, one matcher, one fallback responder, and the conversation
//! [`Session`] for a single user. Every [`ChatService::ask`] logs the user's
//! text exactly as typed, resolves it, and logs the reply.

use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::Path;

use query_desk_core::{
    MatchResult, Matched, Matcher, NoMatchReason, Record, RecordStore, Role, Session,
};

use crate::config::Config;
use crate::ingest::{append_upload, read_upload};
use crate::persist::{load_store, save_store};
use crate::responder::{CannedResponder, FallbackResponder};

/// Where an answer came from.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerSource {
    Greeting,
    Store { position: usize },
    Fallback { reason: NoMatchReason },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Match score for greetings and store hits.
    pub score: Option<f64>,
    pub source: AnswerSource,
}

pub struct ChatService<S: RecordStore> {
    store: S,
    matcher: Matcher,
    responder: Box<dyn FallbackResponder>,
    response_column: String,
    session: Session,
}

impl<S: RecordStore> ChatService<S> {
    pub fn new(
        store: S,
        matcher: Matcher,
        responder: impl FallbackResponder + 'static,
        response_column: impl Into<String>,
    ) -> Self {
        Self {
            store,
            matcher,
            responder: Box::new(responder),
            response_column: response_column.into(),
            session: Session::new(),
        }
    }

    pub fn from_config(config: &Config, store: S) -> Self {
        Self::new(
            store,
            Matcher::new(config.match_config()),
            CannedResponder::from_config(&config.replies),
            config.matching.response_column.clone(),
        )
    }

    pub fn ask(&mut self, query: &str) -> Answer {
        self.session.append_turn(Role::User, query);

        let answer = match self.matcher.match_query(query, &self.store) {
            MatchResult::Hit {
                matched: Matched::Greeting { reply },
                score,
            } => Answer {
                text: reply,
                score: Some(score),
                source: AnswerSource::Greeting,
            },
            MatchResult::Hit {
                matched: Matched::Record { record, position },
                score,
            } => Answer {
                text: render_record(&record, &self.response_column),
                score: Some(score),
                source: AnswerSource::Store { position },
            },
            MatchResult::NoMatch { reason } => {
                tracing::debug!(%reason, "no match; using fallback responder");
                Answer {
                    text: self.responder.respond(query, reason),
                    score: None,
                    source: AnswerSource::Fallback { reason },
                }
            }
        };

        self.session.append_turn(Role::Assistant, answer.text.clone());
        answer
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

/// The response column's value, or every column as `name: value` lines
/// when the record has no (or an empty) response column.
pub fn render_record(record: &Record, response_column: &str) -> String {
    match record.get(response_column) {
        Some(value) if !value.trim().is_empty() => value.to_string(),
        _ => record
            .iter()
            .map(|(c, v)| format!("{}: {}", c, v))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn describe(answer: &Answer) -> String {
    match (&answer.source, answer.score) {
        (AnswerSource::Fallback { reason }, _) => format!("no match: {}", reason),
        (_, Some(score)) => format!("score: {:.1}", score),
        (_, None) => String::new(),
    }
}

/// `qdesk ask`: answer one query and exit.
pub fn run_ask(config: &Config, query: &str) -> Result<()> {
    let store = load_store(config)?;
    let mut service = ChatService::from_config(config, store);
    let answer = service.ask(query);
    println!("{}", answer.text);
    println!("{}", describe(&answer));
    Ok(())
}

/// `qdesk chat`: line-oriented session on stdin/stdout.
pub fn run_chat(config: &Config, transcript: Option<&Path>) -> Result<()> {
    let store = load_store(config)?;
    let mut service = ChatService::from_config(config, store);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    chat_loop(
        &mut service,
        stdin.lock(),
        stdout.lock(),
        Some(config.store.path.as_path()),
    )?;

    if let Some(path) = transcript {
        let json = serde_json::to_string_pretty(service.session().turns())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write transcript: {}", path.display()))?;
    }
    Ok(())
}

/// Drive a session from `input` until EOF or `/quit`.
///
/// `/ingest <path>` appends a file to the store (saved to `save_to` when
/// given). Ingest failures, including schema mismatches, are reported on
/// `output` and the session continues.
pub fn chat_loop<S, R, W>(
    service: &mut ChatService<S>,
    input: R,
    mut output: W,
    save_to: Option<&Path>,
) -> Result<()>
where
    S: RecordStore,
    R: BufRead,
    W: Write,
{
    for line in input.lines() {
        let line = line?;
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if query == "/quit" || query == "/exit" {
            break;
        }

        if let Some(path) = query.strip_prefix("/ingest ") {
            let path = Path::new(path.trim());
            match ingest_one(service.store(), path, save_to) {
                Ok(count) => writeln!(output, "ingested {} record(s) from {}", count, path.display())?,
                Err(e) => writeln!(output, "error: {:#}", e)?,
            }
            continue;
        }

        let answer = service.ask(&line);
        writeln!(output, "{}", answer.text)?;
        writeln!(output, "({})", describe(&answer))?;
    }
    output.flush()?;
    Ok(())
}

fn ingest_one<S: RecordStore>(store: &S, path: &Path, save_to: Option<&Path>) -> Result<usize> {
    let upload = read_upload(path)?;
    append_upload(store, &upload)
        .with_context(|| format!("Cannot ingest {}", path.display()))?;
    if let Some(target) = save_to {
        save_store(target, store)?;
    }
    Ok(upload.records().len())
}
