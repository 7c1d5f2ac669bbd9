use std::fmt::Write;

use super::types::MatchResult;

pub const NO_MATCHES_MESSAGE: &str = "No suitable factories found for these requirements.";

/// Plain-text, numbered listing of ranked matches for chat and terminal output.
pub fn render_recommendations(matches: &[MatchResult]) -> String {
    if matches.is_empty() {
        return NO_MATCHES_MESSAGE.to_string();
    }

    let mut output = String::new();
    for (index, result) in matches.iter().enumerate() {
        let factory = &result.factory;
        if index > 0 {
            output.push('\n');
        }
        let _ = writeln!(
            output,
            "#{} {} ({}) - score {}",
            index + 1,
            factory.name,
            factory.geography,
            result.score
        );
        for reason in &result.reasons {
            let _ = writeln!(output, "   - {reason}");
        }
        let _ = writeln!(
            output,
            "   MOQ minimum: {} units | cost tier: {}",
            factory.moq_min, factory.cost_tier
        );
    }

    output.trim_end().to_string()
}
