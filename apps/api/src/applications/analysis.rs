//! AI analysis of an application: job description + CV text + cover letter
//! are sent to the LLM, which returns a 0-100 fit score and a recruiter
//! summary.

use serde::Deserialize;

use crate::errors::AppError;
use crate::llm_client::prompts::{build_cv_score_prompt, CV_SCORE_SYSTEM};
use crate::llm_client::LlmClient;
use crate::models::application::Application;
use crate::models::job::JobOffer;

const MAX_CV_PROMPT_CHARS: usize = 30_000;

/// Typed LLM output for one application.
#[derive(Debug, Clone, Deserialize)]
pub struct CvAnalysis {
    pub score: f64,
    pub summary: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
}

/// Scores an application against its job offer via the LLM.
pub async fn score_application(
    llm: &LlmClient,
    job: &JobOffer,
    application: &Application,
) -> Result<CvAnalysis, AppError> {
    let cv_text = application
        .cv_text
        .as_deref()
        .ok_or_else(|| AppError::Validation("Application has no CV text to analyze".to_string()))?;

    let prompt = build_cv_score_prompt(
        &job.title,
        &job.description,
        truncate_chars(cv_text, MAX_CV_PROMPT_CHARS),
        application.cover_letter.as_deref().unwrap_or(""),
    );

    let mut analysis: CvAnalysis = llm
        .call_json(&prompt, CV_SCORE_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("CV scoring failed: {e}")))?;

    analysis.score = clamp_score(analysis.score);
    Ok(analysis)
}

/// Clamps an LLM-reported score into the 0-100 contract.
pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        return 0.0;
    }
    score.clamp(0.0, 100.0)
}

/// Truncates on a char boundary so oversized CVs cannot blow the prompt.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_is_clamped_to_range() {
        assert_eq!(clamp_score(150.0), 100.0);
        assert_eq!(clamp_score(-3.0), 0.0);
        assert_eq!(clamp_score(72.5), 72.5);
    }

    #[test]
    fn nan_score_becomes_zero() {
        assert_eq!(clamp_score(f64::NAN), 0.0);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        let truncated = truncate_chars(text, 4);
        assert_eq!(truncated, "héll");
    }

    #[test]
    fn short_text_is_untouched() {
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
