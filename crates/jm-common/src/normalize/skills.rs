/// Split a raw skill-list cell into individual skill tokens. Uploaded data
/// uses pipe, comma, or semicolon delimiters interchangeably; tokens are
/// trimmed and empties dropped.
pub fn split_skill_list(raw: &str) -> Vec<String> {
    raw.split(['|', ',', ';'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}
