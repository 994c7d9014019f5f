use regex::Regex;
use std::sync::LazyLock;

macro_rules! regex {
    ($name:ident, $regex:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($regex).unwrap());
    };
}

// Bracketed segments: "(Official)", "[Colored]", "{Digital}".
regex!(BRACKETS_REGEX, r"\([^)]*\)|\[[^\]]*\]|\{[^}]*\}");
regex!(SEPARATORS_REGEX, r"[^\p{L}\p{N}]+");
regex!(
    ALT_TITLES_HEADER_REGEX,
    r"(?i)^\s*(?:alternative|alternate|alt\.?|associated)\s+(?:titles?|names?)\s*:?\s*(.*)$"
);
regex!(BULLET_REGEX, r"^\s*(?:[-*•·]\s*|\d+[.)]\s+)");

/// Normalize a title for comparison.
///
/// Lowercases, drops bracketed segments, collapses every run of
/// non-alphanumeric characters to a single space and trims. When nothing is
/// left (a title made only of symbols or brackets), the lowercased original
/// is used instead so that such titles still compare equal to themselves.
pub fn clean_title(title: &str) -> String {
    let lowercase = title.to_lowercase();
    let stripped = BRACKETS_REGEX.replace_all(&lowercase, " ");
    let cleaned = SEPARATORS_REGEX.replace_all(&stripped, " ");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() { lowercase.trim().to_string() } else { cleaned.to_string() }
}

/// Alternative titles listed in a description.
///
/// Looks for an "Alternative Titles:" style header. Text after the colon on
/// the same line (split on `;`) and every following non-empty line up to the
/// next blank line count as titles; list bullets are stripped.
pub fn description_alt_titles(description: &str) -> Vec<String> {
    let mut titles = Vec::new();
    let mut lines = description.lines();
    while let Some(line) = lines.next() {
        let Some(captures) = ALT_TITLES_HEADER_REGEX.captures(line) else {
            continue;
        };
        let inline = captures.get(1).map_or("", |m| m.as_str());
        titles.extend(inline.split(';').map(str::trim).filter(|t| !t.is_empty()).map(String::from));
        for line in lines.by_ref() {
            let title = BULLET_REGEX.replace(line, "");
            let title = title.trim();
            if title.is_empty() {
                break;
            }
            titles.push(title.to_string());
        }
    }
    titles
}
