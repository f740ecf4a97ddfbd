//! # Submission rules
//!
//! Validation and normalisation of a new-thread form, plus the naming scheme
//! for stored uploads. Nothing in here touches storage.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use rand::Rng;
use thiserror::Error;

/// Posting limits taken from the deployment configuration.
#[derive(Debug, Clone)]
pub struct PostingRules {
    pub default_name: String,
    pub max_subject_length: usize,
    pub max_name_length: usize,
    pub max_email_length: usize,
    pub max_message_length: usize,
    /// Lower-case, without the leading dot.
    pub allowed_extensions: Vec<String>,
}

/// A file received with a submission.
#[derive(Debug, Clone)]
pub struct Upload {
    /// Name the client gave the file. Only its extension is kept.
    pub filename: String,
    pub data: Bytes,
}

/// Raw form fields, exactly as received. `None` means the field was absent.
#[derive(Debug, Clone, Default)]
pub struct ThreadSubmission {
    pub subject: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub message: Option<String>,
    pub upload: Option<Upload>,
}

/// One reason a submission was turned down. The `Display` text is shown to the poster.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("You must enter a message.")]
    MissingMessage,

    #[error("Message is too long ({length} characters, the limit is {max}).")]
    MessageTooLong { length: usize, max: usize },

    #[error("You must upload a file to start a thread.")]
    MissingUpload,

    #[error("Extension \"{0}\" is not allowed.")]
    ExtensionNotAllowed(String),
}

/// A submission that passed every check, with its fields already truncated.
#[derive(Debug, Clone)]
pub struct ValidThread {
    pub subject: Option<String>,
    pub email: Option<String>,
    pub name: String,
    pub message: String,
    pub upload: Upload,
    pub extension: String,
}

impl PostingRules {
    /// Checks a new-thread submission.
    ///
    /// Every failing check is reported; validation does not stop at the first
    /// problem. Optional fields are truncated rather than rejected.
    pub fn validate_thread(&self, form: ThreadSubmission) -> Result<ValidThread, Vec<SubmissionError>> {
        let mut errors = Vec::new();

        let subject = optional_field(form.subject, self.max_subject_length);
        let email = optional_field(form.email, self.max_email_length);
        let name = optional_field(form.name, self.max_name_length)
            .unwrap_or_else(|| self.default_name.clone());

        let message = match form.message {
            Some(message) if !message.trim().is_empty() => {
                let length = message.chars().count();
                if length > self.max_message_length {
                    errors.push(SubmissionError::MessageTooLong {
                        length,
                        max: self.max_message_length,
                    });
                }
                Some(message)
            }
            _ => {
                errors.push(SubmissionError::MissingMessage);
                None
            }
        };

        let upload = match form.upload {
            Some(upload) if !upload.filename.trim().is_empty() => {
                let extension = file_extension(&upload.filename);
                if self.allowed_extensions.contains(&extension) {
                    Some((upload, extension))
                } else {
                    errors.push(SubmissionError::ExtensionNotAllowed(extension));
                    None
                }
            }
            _ => {
                errors.push(SubmissionError::MissingUpload);
                None
            }
        };

        match (message, upload) {
            (Some(message), Some((upload, extension))) if errors.is_empty() => Ok(ValidThread {
                subject,
                email,
                name,
                message,
                upload,
                extension,
            }),
            _ => Err(errors),
        }
    }
}

/// Keeps at most `max` characters, never splitting a code point.
pub fn truncate(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

/// Truncated first, so a field that is blank within its limit counts as absent.
fn optional_field(value: Option<String>, max: usize) -> Option<String> {
    value
        .map(|v| truncate(&v, max))
        .filter(|v| !v.trim().is_empty())
}

/// Lower-cased text after the last `.`; empty when the name has no dot.
pub fn file_extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default()
}

/// `{YYYYMMDDHHMMSS}_{suffix}.{extension}`
///
/// Two uploads in the same second that draw the same suffix get the same
/// name and the later one replaces the earlier file.
pub fn generate_filename(at: DateTime<Utc>, suffix: u32, extension: &str) -> String {
    format!("{}_{}.{}", at.format("%Y%m%d%H%M%S"), suffix, extension)
}

/// Stored name for an upload received now, with a fresh random suffix.
pub fn fresh_filename(at: DateTime<Utc>, extension: &str) -> String {
    generate_filename(at, rand::rng().random(), extension)
}
