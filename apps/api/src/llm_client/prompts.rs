// Application-scoring prompt templates.
// All prompts for the AI analysis path are defined here.

pub const CV_SCORE_SYSTEM: &str = "\
You are a precise recruitment assistant that evaluates a candidate's CV \
against a job offer. \
You MUST respond with valid JSON only — no markdown fences, no explanations. \
Score strictly on evidence present in the CV and cover letter. \
Never invent experience the candidate did not state.";

pub const CV_SCORE_PROMPT: &str = r#"Evaluate the following application against the job offer.

JOB OFFER:
Title: {job_title}

{job_description}

CANDIDATE CV (extracted text):
{cv_text}

COVER LETTER:
{cover_letter}

OUTPUT SCHEMA (return exactly this structure):
{
  "score": number,          // 0-100, fit of the candidate for this offer
  "summary": "string",      // 2-3 sentence recruiter-facing summary
  "strengths": ["string"],  // up to 5 concrete strengths, evidence-based
  "concerns": ["string"]    // up to 5 concrete gaps or concerns
}"#;

/// Fills the CV scoring prompt template.
pub fn build_cv_score_prompt(
    job_title: &str,
    job_description: &str,
    cv_text: &str,
    cover_letter: &str,
) -> String {
    CV_SCORE_PROMPT
        .replace("{job_title}", job_title)
        .replace("{job_description}", job_description)
        .replace("{cv_text}", cv_text)
        .replace(
            "{cover_letter}",
            if cover_letter.is_empty() {
                "(none provided)"
            } else {
                cover_letter
            },
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_substitutes_all_placeholders() {
        let prompt = build_cv_score_prompt("Backend Engineer", "Build APIs", "Rust, SQL", "Hi");
        assert!(prompt.contains("Backend Engineer"));
        assert!(prompt.contains("Build APIs"));
        assert!(prompt.contains("Rust, SQL"));
        assert!(!prompt.contains("{job_title}"));
        assert!(!prompt.contains("{cv_text}"));
    }

    #[test]
    fn test_empty_cover_letter_is_marked() {
        let prompt = build_cv_score_prompt("T", "D", "C", "");
        assert!(prompt.contains("(none provided)"));
    }
}
