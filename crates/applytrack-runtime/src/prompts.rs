//! Prompt templates for insight and note-summary generation.
//!
//! Both prompts ask for plain text in a fixed layout; the matching parsers
//! live in [`crate::parse`].

use applytrack_core::{Application, ApplicationStage, Note};
use chrono::Local;
use serde::Serialize;

/// Opening of the insights prompt, before the application data.
pub const INSIGHTS_PREAMBLE: &str = r#"You are a job search analytics assistant. Analyze the following job applications and provide 2-4 concise, actionable insights.

Focus on patterns like:
- Which roles or industries are getting more interviews
- Response rates and timing patterns
- Follow-up recommendations for applications that haven't progressed
- Any trends in rejection vs success rates

Applications data:
"#;

/// Closing instructions of the insights prompt.
pub const INSIGHTS_INSTRUCTIONS: &str = "Provide exactly 2-4 insights. Each insight should be a single sentence starting with an observation or recommendation. Do not use bullet points or numbering in your response, just provide plain text insights separated by newlines.";

/// Closing instructions of the summary prompt.
pub const SUMMARY_INSTRUCTIONS: &str = r#"Provide your response in the following exact format:
SUMMARY: [1-2 sentence summary of the overall situation]
TAKEAWAY: [First key takeaway]
TAKEAWAY: [Second key takeaway]
TAKEAWAY: [Third key takeaway - optional]

Be concise and focus on the most important information from the notes."#;

/// What the model sees of one application.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationDigest<'a> {
    company: &'a str,
    role: &'a str,
    stage: ApplicationStage,
    application_date: String,
}

impl<'a> From<&'a Application> for ApplicationDigest<'a> {
    fn from(app: &'a Application) -> Self {
        Self {
            company: &app.company_name,
            role: &app.role,
            stage: app.stage,
            application_date: app.application_date.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Build the insights prompt for an already-selected set of applications.
pub fn insights_prompt(applications: &[&Application]) -> Result<String, serde_json::Error> {
    let digest: Vec<ApplicationDigest<'_>> =
        applications.iter().map(|app| ApplicationDigest::from(*app)).collect();
    let data = serde_json::to_string_pretty(&digest)?;

    Ok(format!(
        "{}{}\n\n{}",
        INSIGHTS_PREAMBLE, data, INSIGHTS_INSTRUCTIONS
    ))
}

/// Render notes oldest first as `[date]: content` blocks.
///
/// Dates are shown in the local time zone, month/day/year.
pub fn render_notes(notes: &[Note]) -> String {
    let mut ordered: Vec<&Note> = notes.iter().collect();
    ordered.sort_by_key(|note| note.created_at);

    ordered
        .iter()
        .map(|note| {
            format!(
                "[{}]: {}",
                note.created_at.with_timezone(&Local).format("%-m/%-d/%Y"),
                note.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the note-summary prompt.
pub fn summary_prompt(notes: &[Note], company: &str, role: &str) -> String {
    format!(
        "Summarize the following interview notes for a job application at {} for the {} position.\n\nNotes:\n{}\n\n{}",
        company,
        role,
        render_notes(notes),
        SUMMARY_INSTRUCTIONS
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_insights_prompt_embeds_digest() {
        let app = Application::new(
            "app-7f3",
            "Acme",
            "Platform Engineer",
            ApplicationStage::Interview,
            Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap(),
        );

        let prompt = insights_prompt(&[&app]).unwrap();

        assert!(prompt.starts_with("You are a job search analytics assistant."));
        assert!(prompt.contains("\"company\": \"Acme\""));
        assert!(prompt.contains("\"role\": \"Platform Engineer\""));
        assert!(prompt.contains("\"stage\": \"interview\""));
        assert!(prompt.contains("\"applicationDate\": \"2025-03-14\""));
        assert!(prompt.ends_with(INSIGHTS_INSTRUCTIONS));
        // ids and links stay out of the prompt
        assert!(!prompt.contains("app-7f3"));
    }

    #[test]
    fn test_notes_render_oldest_first() {
        let early = Utc.with_ymd_and_hms(2025, 1, 5, 12, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 2, 9, 12, 0, 0).unwrap();
        let notes = vec![
            Note::new("n2", "Second round scheduled", late),
            Note::new("n1", "Phone screen went fine", early),
        ];

        let rendered = render_notes(&notes);

        let expected = format!(
            "[{}]: Phone screen went fine\n\n[{}]: Second round scheduled",
            early.with_timezone(&Local).format("%-m/%-d/%Y"),
            late.with_timezone(&Local).format("%-m/%-d/%Y"),
        );
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_summary_prompt_names_company_and_role() {
        let notes = vec![Note::new(
            "n1",
            "Met the hiring manager",
            Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        )];

        let prompt = summary_prompt(&notes, "Globex", "SRE");

        assert!(prompt.starts_with(
            "Summarize the following interview notes for a job application at Globex for the SRE position."
        ));
        assert!(prompt.contains("]: Met the hiring manager"));
        assert!(prompt.contains("SUMMARY: [1-2 sentence summary"));
        assert!(prompt.ends_with("most important information from the notes."));
    }
}
