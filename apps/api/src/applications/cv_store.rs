//! CV file handling: PDF text extraction and raw-file storage in S3.

use std::io::Write;

use aws_sdk_s3::primitives::ByteStream;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

const MAX_CV_BYTES: usize = 10 * 1024 * 1024;

/// Extracts plain text from an uploaded CV PDF.
///
/// The bytes are staged in a temp file for the extractor; the file is
/// removed when the handle drops.
pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, AppError> {
    if bytes.is_empty() {
        return Err(AppError::Validation("CV file is empty".to_string()));
    }
    if bytes.len() > MAX_CV_BYTES {
        return Err(AppError::Validation("CV file exceeds 10 MB".to_string()));
    }
    if !bytes.starts_with(b"%PDF") {
        return Err(AppError::Validation("CV must be a PDF file".to_string()));
    }

    let mut tmp = tempfile::NamedTempFile::new()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("temp file: {e}")))?;
    tmp.write_all(bytes)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("temp file write: {e}")))?;

    let text = pdf_extract::extract_text(tmp.path())
        .map_err(|e| AppError::Validation(format!("Could not read PDF: {e}")))?;

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Validation(
            "CV PDF contains no extractable text".to_string(),
        ));
    }
    Ok(text)
}

/// Uploads the raw CV PDF to S3 under `cvs/{application_id}.pdf` and
/// returns the object key.
pub async fn upload_cv(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    application_id: Uuid,
    bytes: Vec<u8>,
) -> Result<String, AppError> {
    let key = format!("cvs/{application_id}.pdf");
    s3.put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(bytes))
        .content_type("application/pdf")
        .send()
        .await
        .map_err(|e| AppError::S3(format!("CV upload failed: {e}")))?;

    info!("Uploaded CV to s3://{bucket}/{key}");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_is_rejected() {
        assert!(extract_pdf_text(&[]).is_err());
    }

    #[test]
    fn non_pdf_bytes_are_rejected() {
        let err = extract_pdf_text(b"hello world").unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn oversized_file_is_rejected() {
        let mut bytes = b"%PDF-1.4".to_vec();
        bytes.resize(MAX_CV_BYTES + 1, 0);
        assert!(extract_pdf_text(&bytes).is_err());
    }
}
