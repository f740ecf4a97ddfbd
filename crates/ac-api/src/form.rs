//! Multipart form extraction for submissions.

use ac_services::{ThreadSubmission, Upload};
use axum::extract::multipart::{Multipart, MultipartError};

/// Collects the new-thread fields. Unknown fields are skipped; a repeated
/// field keeps its last value.
pub async fn read_thread_submission(mut multipart: Multipart) -> Result<ThreadSubmission, MultipartError> {
    let mut form = ThreadSubmission::default();

    while let Some(field) = multipart.next_field().await? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };

        match name.as_str() {
            "subject" => form.subject = Some(field.text().await?),
            "email" => form.email = Some(field.text().await?),
            "name" => form.name = Some(field.text().await?),
            "message" => form.message = Some(field.text().await?),
            "upload" => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let data = field.bytes().await?;
                form.upload = Some(Upload { filename, data });
            }
            _ => {}
        }
    }

    Ok(form)
}
