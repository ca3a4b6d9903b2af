//! In-memory chat sessions.

use tracing::{debug, instrument};
use uuid::Uuid;

use crate::model::GenerativeModel;
use crate::types::{Content, Prompt};
use crate::{CompleteResponse, Error, Response};

/// A conversation with one model. History lives only as long as the session.
#[derive(Debug, Clone)]
pub struct ChatSession {
    id: Uuid,
    model: GenerativeModel,
    history: Vec<Content>,
}

impl ChatSession {
    pub(crate) fn new(model: GenerativeModel, history: Vec<Content>) -> Self {
        Self {
            id: Uuid::new_v4(),
            model,
            history,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    pub fn model(&self) -> &GenerativeModel {
        &self.model
    }

    /// Send one user turn and wait for the reply.
    ///
    /// The request carries the current history followed by the new turn. On
    /// success both turns are appended; on failure the history is left as it
    /// was and the error is returned without retrying.
    #[instrument(skip_all, fields(session = %self.id, prior_turns = self.history.len()))]
    pub async fn send_message(
        &mut self,
        prompt: impl Into<Prompt>,
    ) -> Result<CompleteResponse, Error> {
        let user_turn = self.model.user_turn(prompt)?;
        let mut contents = self.history.clone();
        contents.push(user_turn.clone());

        let request = self.model.request(contents);
        let response = self.model.send(&request).await?;

        self.history.push(user_turn);
        self.history.push(response.content.clone());
        debug!(turns = self.history.len(), "chat history updated");
        Ok(response)
    }

    /// Send one user turn and stream the reply.
    ///
    /// History is not updated: the caller holds the stream and may record the
    /// exchange with [`ChatSession::record`] once it has been consumed.
    #[instrument(skip_all, fields(session = %self.id, prior_turns = self.history.len()))]
    pub async fn send_message_stream(&self, prompt: impl Into<Prompt>) -> Result<Response, Error> {
        let user_turn = self.model.user_turn(prompt)?;
        let mut contents = self.history.clone();
        contents.push(user_turn);

        let request = self.model.request(contents);
        self.model.send_stream(&request).await
    }

    /// Append a completed exchange to the history.
    pub fn record(&mut self, prompt: impl Into<Prompt>, reply: &CompleteResponse) {
        self.history.push(prompt.into().into_content());
        self.history.push(reply.content.clone());
    }
}
