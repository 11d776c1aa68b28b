use crate::constants::MAX_NAME_LEN;

pub const REPLY_PREFIX: &str = "$ ";

pub fn sanitize_name(value: &str) -> String {
    let trimmed: String = value
        .trim()
        .chars()
        .filter(|ch| !ch.is_control())
        .take(MAX_NAME_LEN)
        .collect();
    if trimmed.trim().is_empty() {
        return "Adventurer".to_string();
    }
    trimmed.trim_end().to_string()
}

pub fn format_reply(line: &str) -> String {
    format!("{REPLY_PREFIX}{line}")
}

/// Accepts a decimal `u32`; anything else means "pick one at random".
pub fn parse_seed(raw: Option<&str>) -> Option<u32> {
    raw.and_then(|value| value.trim().parse::<u32>().ok())
}

/// Strips a trailing `\r` left by telnet-style clients.
pub fn normalize_line(raw: &str) -> &str {
    raw.trim_end_matches(['\r', '\n'])
}
