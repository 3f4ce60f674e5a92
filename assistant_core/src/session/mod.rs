//! The read-act-respond loop.

mod directive;

use std::io::{self, BufRead, BufReader, Read, Write};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use directive::Directive;
use directive::trim_line_ending;

use crate::embed::collect_matching_files;
use crate::memory::ConversationMemory;
use crate::request::{CtrlC, Interrupt, InterruptWatcher};
use crate::stream::{MirroredReader, MirroredWriter};
use crate::{Backend, BackendError, Error, Result};

const ASSISTANT_TAG: &str = "ASSISTANT) ";
const USER_CUE: &str = "USER) ";

pub const GREETING: &str = "Hello, I am your assistant. How can I help you today?";
pub const FAREWELL: &str = "Goodbye!";
pub const CANCELLED_NOTICE: &str = "You cancelled the request, so I'll stop talking!";
pub const FORGET_CONFIRMATION: &str = "I've forgotten everything we've talked about!";
pub const EMBED_ACKNOWLEDGEMENT: &str = "Thanks for the examples!";
pub const EMBED_USAGE: &str = "Tell me which files to use, for example >notes.txt";

/// How a session ended without error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The user typed `exit`.
    Exit,
    /// The input stream was closed.
    EndOfInput,
}

/// Assembles a [`Session`] around a backend and an audit sink.
///
/// The audit sink is cloned into both the input and output mirrors, so it
/// must be a shared handle such as [`crate::SharedSink`].
pub struct SessionBuilder<B, A> {
    backend: B,
    audit: A,
    input: Box<dyn Read + Send>,
    output: Box<dyn Write + Send>,
    interrupt: Arc<dyn Interrupt>,
    workdir: Option<PathBuf>,
}

impl<B, A> SessionBuilder<B, A>
where
    B: Backend,
    A: Write + Clone + Send + 'static,
{
    /// Defaults to stdin/stdout, Ctrl-C interrupts and the current directory.
    pub fn new(backend: B, audit: A) -> Self {
        Self {
            backend,
            audit,
            input: Box::new(io::stdin()),
            output: Box::new(io::stdout()),
            interrupt: Arc::new(CtrlC),
            workdir: None,
        }
    }

    #[must_use]
    pub fn input(mut self, input: impl Read + Send + 'static) -> Self {
        self.input = Box::new(input);
        self
    }

    #[must_use]
    pub fn output(mut self, output: impl Write + Send + 'static) -> Self {
        self.output = Box::new(output);
        self
    }

    #[must_use]
    pub fn interrupt(mut self, interrupt: Arc<dyn Interrupt>) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Root of the tree searched by the `>` directive.
    #[must_use]
    pub fn workdir(mut self, workdir: impl Into<PathBuf>) -> Self {
        self.workdir = Some(workdir.into());
        self
    }

    pub fn build(self) -> io::Result<Session<B>> {
        let workdir = match self.workdir {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };

        let reader = MirroredReader::new(self.input, self.audit.clone());
        let output = MirroredWriter::with_audit(self.output, self.audit);

        Ok(Session {
            backend: self.backend,
            input: Box::new(BufReader::new(reader)),
            output,
            memory: ConversationMemory::new(),
            interrupt: self.interrupt,
            workdir,
        })
    }
}

/// One interactive conversation.
pub struct Session<B> {
    backend: B,
    input: Box<dyn BufRead + Send>,
    output: MirroredWriter,
    memory: ConversationMemory,
    interrupt: Arc<dyn Interrupt>,
    workdir: PathBuf,
}

impl<B: Backend> Session<B> {
    pub fn builder<A>(backend: B, audit: A) -> SessionBuilder<B, A>
    where
        A: Write + Clone + Send + 'static,
    {
        SessionBuilder::new(backend, audit)
    }

    /// Greet the user, then handle lines until exit, end of input or a
    /// fatal error.
    pub async fn run(&mut self) -> Result<Termination> {
        info!("Session started in {}", self.workdir.display());
        self.prompt(GREETING)?;

        let mut buf = Vec::new();
        loop {
            buf.clear();
            if self.input.read_until(b'\n', &mut buf)? == 0 {
                info!("Input closed, ending session");
                return Ok(Termination::EndOfInput);
            }

            let line = String::from_utf8_lossy(&buf).into_owned();
            if let ControlFlow::Break(termination) = self.act(trim_line_ending(&line)).await? {
                info!("Session ended: {termination:?}");
                return Ok(termination);
            }
        }
    }

    /// Handle a single line.
    pub async fn act(&mut self, line: &str) -> Result<ControlFlow<Termination>> {
        match Directive::parse(line) {
            Directive::Exit => {
                self.say(FAREWELL)?;
                return Ok(ControlFlow::Break(Termination::Exit));
            }
            Directive::Embed(token) => self.embed_files(token)?,
            Directive::Forget => {
                self.forget();
                self.prompt(FORGET_CONFIRMATION)?;
            }
            Directive::Ask(question) => self.ask(question).await?,
        }
        Ok(ControlFlow::Continue(()))
    }

    /// Ask the backend under a fresh token that Ctrl-C (or the configured
    /// interrupt) can cancel.
    pub async fn ask(&mut self, question: &str) -> Result<()> {
        let token = CancellationToken::new();
        let _watcher = InterruptWatcher::spawn(Arc::clone(&self.interrupt), token.clone());
        self.ask_with_token(question, &token).await
    }

    /// Ask the backend under a caller-owned token.
    ///
    /// Once the token is cancelled the outcome is reported as a cancellation
    /// no matter what the backend returned, and nothing is remembered.
    pub async fn ask_with_token(&mut self, question: &str, token: &CancellationToken) -> Result<()> {
        debug!(
            "Asking backend: {} chars, {} exchanges in memory",
            question.len(),
            self.memory.len()
        );

        let answer = match self.backend.ask(question, token).await {
            Ok(answer) if !token.is_cancelled() => answer,
            Err(BackendError::Failed(e)) if !token.is_cancelled() => {
                return Err(Error::Backend(e));
            }
            _ => {
                info!("Request cancelled");
                self.prompt(CANCELLED_NOTICE)?;
                return Ok(());
            }
        };

        self.prompt(&answer)?;
        self.remember(question.to_string(), answer);
        Ok(())
    }

    /// Record an exchange and hand it to the backend as an example.
    pub fn remember(&mut self, question: String, answer: String) {
        let exchange = self.memory.record(question, answer);
        debug!("Remembered exchange #{}", exchange.index());
        self.backend
            .give_example(exchange.question(), exchange.answer());
    }

    /// Clear memory and the backend's accumulated examples.
    pub fn forget(&mut self) {
        info!("Forgetting {} exchanges", self.memory.len());
        self.memory.clear();
        self.backend.reset();
    }

    fn embed_files(&mut self, token: &str) -> Result<()> {
        if token.is_empty() {
            self.prompt(EMBED_USAGE)?;
            return Ok(());
        }

        let files = collect_matching_files(&self.workdir, token)?;
        info!("Embedding {} files matching {token:?}", files.len());

        let mut listing = String::new();
        for file in files {
            listing.push_str("  > ");
            listing.push_str(&file.name());
            listing.push('\n');
            let marker = file.marker();
            self.remember(file.contents, marker);
        }

        self.prompt(&format!("{EMBED_ACKNOWLEDGEMENT}\n{listing}"))?;
        Ok(())
    }

    /// `ASSISTANT) <text>` followed by the `USER) ` cue, as one write.
    fn prompt(&mut self, text: &str) -> io::Result<()> {
        self.write_framed(&format!("{ASSISTANT_TAG}{text}\n{USER_CUE}"))
    }

    /// `ASSISTANT) <text>` with no cue; used for the last line of a session.
    fn say(&mut self, text: &str) -> io::Result<()> {
        self.write_framed(&format!("{ASSISTANT_TAG}{text}\n"))
    }

    fn write_framed(&mut self, framed: &str) -> io::Result<()> {
        self.output.write_all(framed.as_bytes())?;
        self.output.flush()
    }

    #[must_use]
    pub const fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }
}
