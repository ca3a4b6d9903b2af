//! Response handling for Gemini generations.

use crate::types::Content;
use crate::{Error, FinishReason, StreamEvent, Usage};
use futures_util::stream::Stream;
use std::pin::Pin;

/// A complete response from the model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteResponse {
    /// The model's turn, ready to be appended to a chat history.
    pub content: Content,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

impl CompleteResponse {
    /// Get the reply text.
    pub fn text(&self) -> String {
        self.content.text()
    }
}

/// Event stream of a generation. Can be consumed incrementally or buffered.
pub struct Response {
    stream: Pin<Box<dyn Stream<Item = Result<StreamEvent, Error>> + Send>>,
}

impl Response {
    /// Create a new response from a stream of events.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<StreamEvent, Error>> + Send + 'static,
    {
        Self {
            stream: Box::pin(stream),
        }
    }

    /// Buffer the entire response by consuming the stream.
    pub async fn buffer(self) -> Result<CompleteResponse, Error> {
        Self::buffer_stream(self.stream).await
    }

    /// Get just the text content (convenience method).
    pub async fn text(self) -> Result<String, Error> {
        let complete = self.buffer().await?;
        Ok(complete.text())
    }

    /// Stream the response events.
    pub fn stream(self) -> Pin<Box<dyn Stream<Item = Result<StreamEvent, Error>> + Send>> {
        self.stream
    }

    async fn buffer_stream(
        mut stream: Pin<Box<dyn Stream<Item = Result<StreamEvent, Error>> + Send>>,
    ) -> Result<CompleteResponse, Error> {
        use futures_util::StreamExt;

        let mut accumulator = crate::accumulator::ResponseAccumulator::new();

        while let Some(event_result) = stream.next().await {
            let event = event_result?;
            let terminal = event.is_terminal();
            accumulator.process_event(event)?;
            if terminal {
                break;
            }
        }

        accumulator.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Role;

    #[test]
    fn test_complete_response_text() {
        let response = CompleteResponse {
            content: Content::model("Hello, world!"),
            finish_reason: FinishReason::Stop,
            usage: Usage::default(),
        };

        assert_eq!(response.text(), "Hello, world!");
        assert_eq!(response.content.role, Role::Model);
    }

    #[tokio::test]
    async fn test_response_buffering() {
        let events = vec![
            Ok(StreamEvent::ContentDelta {
                delta: "Test ".to_string(),
            }),
            Ok(StreamEvent::ContentDelta {
                delta: "response".to_string(),
            }),
            Ok(StreamEvent::Done {
                finish_reason: FinishReason::Stop,
                usage: Usage::default(),
            }),
            // Anything after Done is ignored
            Ok(StreamEvent::ContentDelta {
                delta: " trailing".to_string(),
            }),
        ];

        let stream = futures_util::stream::iter(events);
        let response = Response::from_stream(stream);
        let text = response.text().await.unwrap();
        assert_eq!(text, "Test response");
    }

    #[tokio::test]
    async fn test_response_buffering_error_event() {
        let events = vec![
            Ok(StreamEvent::ContentDelta {
                delta: "partial".to_string(),
            }),
            Ok(StreamEvent::Error {
                error: "quota exceeded".to_string(),
            }),
        ];

        let response = Response::from_stream(futures_util::stream::iter(events));
        let result = response.buffer().await;
        assert!(matches!(result, Err(Error::Streaming(msg)) if msg == "quota exceeded"));
    }
}
