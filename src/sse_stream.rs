//! Server-Sent Events framing for `streamGenerateContent?alt=sse`.

use crate::Error;
use futures_util::{Stream, StreamExt};
use memchr::memmem;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

/// Upper bound on bytes buffered while waiting for an event terminator.
const MAX_BUFFER: usize = 1_000_000;

/// One SSE event. Gemini only ever sends `data:` lines.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub event_type: Option<String>,
    pub data: String,
}

impl SseEvent {
    /// Sentinel some proxies append after the last chunk.
    pub fn is_done(&self) -> bool {
        self.data.trim() == "[DONE]"
    }

    fn parse(text: &str) -> Option<Self> {
        let mut event_type = None;
        let mut data_lines = Vec::new();

        for line in text.lines() {
            let line = line.trim_end_matches('\r');
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let Some((field, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field.trim_start_matches('\u{FEFF}') {
                "event" => event_type = Some(value.to_string()),
                "data" => data_lines.push(value),
                _ => {}
            }
        }

        if data_lines.is_empty() {
            return None;
        }

        Some(SseEvent {
            event_type,
            data: data_lines.join("\n"),
        })
    }
}

/// Splits a byte stream into SSE events, buffering across chunk boundaries.
pub struct SseStream<S> {
    inner: S,
    buffer: Vec<u8>,
    events: VecDeque<SseEvent>,
    /// Error to report once the events queued before it have been yielded.
    failure: Option<Error>,
    finished: bool,
}

impl<S> SseStream<S> {
    pub fn new(stream: S) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            events: VecDeque::new(),
            failure: None,
            finished: false,
        }
    }

    /// Move every complete event out of the buffer.
    fn drain_complete(&mut self) -> Result<(), Error> {
        // Normalise CRLF framing so one separator search covers both.
        if memmem::find(&self.buffer, b"\r\n").is_some() {
            let normalised: Vec<u8> = {
                let mut out = Vec::with_capacity(self.buffer.len());
                let mut iter = self.buffer.iter().peekable();
                while let Some(&b) = iter.next() {
                    if b == b'\r' && iter.peek() == Some(&&b'\n') {
                        continue;
                    }
                    out.push(b);
                }
                out
            };
            self.buffer = normalised;
        }

        let finder = memmem::Finder::new(b"\n\n");
        let mut start = 0;
        while let Some(pos) = finder.find(&self.buffer[start..]) {
            let end = start + pos;
            let text = std::str::from_utf8(&self.buffer[start..end])
                .map_err(|e| Error::streaming(format!("Invalid UTF-8 in SSE event: {e}")))?;
            if let Some(event) = SseEvent::parse(text) {
                self.events.push_back(event);
            }
            start = end + 2;
        }

        if start > 0 {
            self.buffer.drain(..start);
        }
        Ok(())
    }

    /// Whatever is left once the body ends, parsed as a last event.
    fn take_trailing(&mut self) -> Option<SseEvent> {
        let buffer = std::mem::take(&mut self.buffer);
        let text = std::str::from_utf8(&buffer).ok()?;
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        SseEvent::parse(text)
    }
}

impl<S, E> Stream for SseStream<S>
where
    S: Stream<Item = Result<bytes::Bytes, E>> + Unpin,
    E: std::fmt::Display,
{
    type Item = Result<SseEvent, Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            if let Some(event) = self.events.pop_front() {
                return Poll::Ready(Some(Ok(event)));
            }
            if let Some(error) = self.failure.take() {
                return Poll::Ready(Some(Err(error)));
            }
            if self.finished {
                return Poll::Ready(None);
            }

            match ready!(self.inner.poll_next_unpin(cx)) {
                Some(Ok(chunk)) => {
                    self.buffer.extend_from_slice(&chunk);
                    // The cap applies to the unterminated remainder only.
                    let drained = self.drain_complete().and_then(|()| {
                        if self.buffer.len() > MAX_BUFFER {
                            Err(Error::streaming("SSE buffer exceeded maximum size"))
                        } else {
                            Ok(())
                        }
                    });
                    if let Err(e) = drained {
                        self.buffer.clear();
                        self.finished = true;
                        self.failure = Some(e);
                    }
                }
                Some(Err(e)) => {
                    return Poll::Ready(Some(Err(Error::streaming(format!(
                        "Stream error: {e}"
                    )))));
                }
                None => {
                    self.finished = true;
                    if let Some(event) = self.take_trailing() {
                        return Poll::Ready(Some(Ok(event)));
                    }
                    return Poll::Ready(None);
                }
            }
        }
    }
}
