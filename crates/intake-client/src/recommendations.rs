use anyhow::Context;
use risk_protocol::IntakeRecord;

pub const RECOMMENDATION_INSTRUCTION: &str =
    "Provide 3 recommendations for a patient with the following details (bullet form, short sentence): ";

/// Shown for the severe class in place of generated recommendations.
pub const HIGH_RISK_RECOMMENDATIONS: [&str; 3] = [
    "High risk detected - immediate medical consultation recommended",
    "Urgent lifestyle changes and professional intervention needed",
    "Consider comprehensive health assessment",
];

pub fn build_prompt(record: &IntakeRecord) -> anyhow::Result<String> {
    let details = serde_json::to_string(record).context("failed to serialize intake record")?;
    Ok(format!("{RECOMMENDATION_INSTRUCTION}{details}"))
}

/// Pulls markdown bullet lines out of generated text.
pub fn parse_recommendations(text: &str) -> Vec<String> {
    text.split('\n')
        .filter(|line| line.trim().starts_with('*'))
        .map(clean_bullet)
        .collect()
}

// Only a marker at the very start of the line is stripped; indented bullets
// keep theirs.
fn clean_bullet(line: &str) -> String {
    let body = match line.strip_prefix('*') {
        Some(rest) => rest.trim_start(),
        None => line,
    };
    body.replace("**", "").trim().to_string()
}
