//! Delta accumulation logic for streaming responses.

use crate::types::{Content, FinishReason, Part, Role, StreamEvent, Usage};
use crate::CompleteResponse;
use crate::Error;

/// Accumulates streaming deltas into a complete response.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    /// Text received so far.
    text: String,
    /// Final finish reason (if received).
    finish_reason: Option<FinishReason>,
    /// Final usage statistics (if received).
    usage: Option<Usage>,
}

impl ResponseAccumulator {
    /// Create a new response accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Process a stream event and update the accumulation.
    pub fn process_event(&mut self, event: StreamEvent) -> Result<(), Error> {
        match event {
            StreamEvent::ContentDelta { delta } => {
                self.text.push_str(&delta);
            }
            StreamEvent::Done {
                finish_reason,
                usage,
            } => {
                self.finish_reason = Some(finish_reason);
                self.usage = Some(usage);
            }
            StreamEvent::Error { error } => {
                return Err(Error::streaming(error));
            }
        }

        Ok(())
    }

    /// Finalize and return the complete response.
    pub fn finalize(self) -> Result<CompleteResponse, Error> {
        Ok(CompleteResponse {
            content: Content::new(Role::Model, vec![Part::text(self.text)]),
            finish_reason: self.finish_reason.unwrap_or(FinishReason::Stop),
            usage: self.usage.unwrap_or_default(),
        })
    }

    /// Get the text accumulated so far.
    pub fn current_content(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_accumulation() {
        let mut accumulator = ResponseAccumulator::new();

        accumulator
            .process_event(StreamEvent::ContentDelta {
                delta: "Hello ".to_string(),
            })
            .unwrap();
        assert_eq!(accumulator.current_content(), "Hello ");

        accumulator
            .process_event(StreamEvent::ContentDelta {
                delta: "world!".to_string(),
            })
            .unwrap();
        assert_eq!(accumulator.current_content(), "Hello world!");
    }

    #[test]
    fn test_error_event_fails() {
        let mut accumulator = ResponseAccumulator::new();
        let result = accumulator.process_event(StreamEvent::Error {
            error: "connection reset".to_string(),
        });
        assert!(matches!(result, Err(Error::Streaming(_))));
    }

    #[test]
    fn test_finalization() {
        let mut accumulator = ResponseAccumulator::new();

        accumulator
            .process_event(StreamEvent::ContentDelta {
                delta: "Test response".to_string(),
            })
            .unwrap();
        accumulator
            .process_event(StreamEvent::Done {
                finish_reason: FinishReason::MaxTokens,
                usage: Usage {
                    input_tokens: 3,
                    output_tokens: 2,
                    total_tokens: 5,
                },
            })
            .unwrap();

        let complete = accumulator.finalize().unwrap();
        assert_eq!(complete.text(), "Test response");
        assert_eq!(complete.content.role, Role::Model);
        assert_eq!(complete.finish_reason, FinishReason::MaxTokens);
        assert_eq!(complete.usage.total_tokens, 5);
    }
}
