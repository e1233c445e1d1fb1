/// Reduce a raw check-in string to its canonical comparison key:
/// lower-cased, truncated at the first `@`, all whitespace removed.
///
/// Total function. Garbage in, some key out; the empty string is a valid
/// (if unmatchable) key.
pub fn canonical_key(raw: &str) -> String {
    let local = raw.split('@').next().unwrap_or("");
    local
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
