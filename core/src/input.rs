//! The line-oriented input collaborator.
//!
//! The supervisor races [`LineSource::next_line`] against the window
//! deadline and the interrupt token, so implementations must be cancel safe:
//! dropping a pending call must not lose a line that was already read.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

#[async_trait]
pub trait LineSource: Send {
    /// Returns the next trimmed line, or `None` once the source is exhausted.
    async fn next_line(&mut self) -> anyhow::Result<Option<String>>;
}

/// Reads lines from any buffered async reader (stdin, a pipe, a byte slice).
pub struct ReaderSource<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> ReaderSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: reader.lines(),
        }
    }
}

#[async_trait]
impl<R> LineSource for ReaderSource<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        let line = self.lines.next_line().await?;
        Ok(line.map(|l| l.trim().to_owned()))
    }
}

/// What a [`ScriptedSource`] does after its last line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhausted {
    Eof,
    /// Never returns, like a terminal nobody types into.
    Hang,
}

/// A fixed list of lines, handy for tests and non-interactive runs.
pub struct ScriptedSource {
    lines: VecDeque<String>,
    exhausted: Exhausted,
}

impl ScriptedSource {
    pub fn new<I, S>(lines: I, exhausted: Exhausted) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
            exhausted,
        }
    }
}

#[async_trait]
impl LineSource for ScriptedSource {
    async fn next_line(&mut self) -> anyhow::Result<Option<String>> {
        if let Some(line) = self.lines.pop_front() {
            return Ok(Some(line.trim().to_owned()));
        }
        match self.exhausted {
            Exhausted::Eof => Ok(None),
            Exhausted::Hang => std::future::pending().await,
        }
    }
}
