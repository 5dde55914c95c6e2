use once_cell::sync::Lazy;
use regex::Regex;

/// Extracts the JSON payload of a language model answer.
///
/// Models sometimes wrap the JSON with conversational text or markdown fences:
/// - if the answer contains brackets, the slice from the first `[` to the last `]` is returned
/// - otherwise markdown code fences are stripped from the trimmed answer
pub fn extract_json_payload(answer: &str) -> String {
    if let (Some(start), Some(end)) = (answer.find('['), answer.rfind(']')) {
        if start < end {
            return answer[start..=end].to_string();
        }
    }

    static FENCES: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?m)^\s*```(?:json)?\s*$").expect("Invalid fences regex"));
    FENCES.replace_all(answer, "").trim().to_string()
}
