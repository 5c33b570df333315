/// Words that count as "yes" in the time-check answer
pub const AFFIRMATIVE_TOKENS: &[&str] = &["yes", "بله"];

const TIME_CHECK_TEMPLATE: &str = "Decide whether understanding when the event in the following message happens requires knowing the current date and time (for example because it says \"tomorrow\", \"next Monday\" or \"in two hours\").

Message: \"{message}\"

Answer with a single word: \"yes\" or \"no\".";

const EXTRACTION_TEMPLATE: &str = "Extract the calendar event described in the message below. If the current time is given, use it as the reference for relative dates and times.

Message: {message}
Current time: {current_time}

Return only a JSON object with exactly these keys:
- \"summary\": short title of the event
- \"start_time\": start time in the format YYYY-MM-DD HH:MM
- \"end_time\": end time in the format YYYY-MM-DD HH:MM
- \"description\": any additional details about the event

If a value is unknown or cannot be determined from the message, use JSON null for it. Never guess a value.";

/// Prompt asking whether the message needs the current time to be understood
pub fn time_check_prompt(message: &str) -> String {
    TIME_CHECK_TEMPLATE.replace("{message}", message)
}

/// Prompt asking for the structured event, with an optional current time
pub fn extraction_prompt(message: &str, current_time: Option<&str>) -> String {
    EXTRACTION_TEMPLATE
        .replace("{current_time}", current_time.unwrap_or("unknown"))
        .replace("{message}", message)
}

/// Soft yes/no reading of the time-check answer
pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    AFFIRMATIVE_TOKENS.iter().any(|token| answer.contains(token))
}
