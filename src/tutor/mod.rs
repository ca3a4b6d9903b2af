//! Tutoring helpers for Singapore PSLE and O-Level students.

pub mod format;
pub mod prompts;
pub mod session;

pub use format::{format_display, format_markdown, format_tutor_response};
pub use prompts::{
    subjects, system_prompt, AttachmentKind, EducationLevel, COMMON_GUARDRAILS,
    ENGLISH_TUTOR_PROMPT,
};
pub use session::{Attachment, TutorSession};
