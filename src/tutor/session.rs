use tracing::{info, instrument};

use super::format::format_tutor_response;
use super::prompts::{attachment_prompt, feedback_prompt, system_prompt, AttachmentKind, EducationLevel};
use crate::model::GenerativeModel;
use crate::types::{Part, Prompt};
use crate::Error;

/// An uploaded file to analyse, as base64 (optionally a `data:` URL).
#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub data: String,
}

impl Attachment {
    pub fn image(data: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Image,
            data: data.into(),
        }
    }

    pub fn pdf(data: impl Into<String>) -> Self {
        Self {
            kind: AttachmentKind::Pdf,
            data: data.into(),
        }
    }

    fn to_part(&self) -> Part {
        Part::inline_data_url(self.kind.mime_type(), &self.data)
    }
}

/// A model bound to one level and subject.
#[derive(Debug, Clone)]
pub struct TutorSession {
    model: GenerativeModel,
    level: EducationLevel,
    subject: String,
    system_prompt: String,
}

impl TutorSession {
    /// Fails with [`Error::UnknownSubject`] if the subject is not taught at `level`.
    pub fn new(
        model: GenerativeModel,
        level: EducationLevel,
        subject: impl Into<String>,
    ) -> Result<Self, Error> {
        let subject = subject.into();
        let system_prompt = system_prompt(level, &subject)?;
        Ok(Self {
            model,
            level,
            subject,
            system_prompt,
        })
    }

    pub fn level(&self) -> EducationLevel {
        self.level
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    /// Ask a text question and get formatted HTML back.
    ///
    /// Primes a fresh chat with the subject prompt, then sends the question.
    #[instrument(skip_all, fields(level = %self.level, subject = %self.subject))]
    pub async fn ask(&self, question: &str) -> Result<String, Error> {
        if question.trim().is_empty() {
            return Err(Error::config("Question must not be empty"));
        }
        let mut chat = self.model.start_chat(vec![]);
        chat.send_message(self.system_prompt.as_str()).await?;
        let reply = chat.send_message(question).await?;
        info!(chars = reply.text().len(), "tutor replied");
        Ok(format_tutor_response(&reply.text(), self.level, &self.subject))
    }

    /// Analyse an uploaded image or PDF in a single request.
    #[instrument(skip_all, fields(level = %self.level, subject = %self.subject, kind = ?attachment.kind))]
    pub async fn analyze_attachment(
        &self,
        attachment: &Attachment,
        note: Option<&str>,
    ) -> Result<String, Error> {
        let instruction = attachment_prompt(
            &self.system_prompt,
            self.level,
            &self.subject,
            attachment.kind,
            note,
        );
        let prompt = Prompt::new()
            .with_part(attachment.to_part())
            .with_text(instruction);
        let reply = self.model.generate_content(prompt).await?;
        Ok(format_tutor_response(&reply.text(), self.level, &self.subject))
    }

    /// Ask the model how it could improve given a student's feedback.
    #[instrument(skip_all)]
    pub async fn review_feedback(&self, kind: &str, comment: &str) -> Result<String, Error> {
        let reply = self
            .model
            .generate_content(feedback_prompt(kind, comment))
            .await?;
        Ok(reply.text())
    }
}
