//! Pure `Path` value handling: splitting, joining, and cleaning the
//! `;`-separated segment list. No registry access here, so every rule is
//! unit-testable with an injected existence predicate.

/// Split a raw `Path` value into trimmed, non-empty segments.
pub fn split_path(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Join segments back into a raw `Path` value.
pub fn join_path(parts: &[String]) -> String {
    parts.join(";")
}

/// Clean a raw `Path` value: trim segments, drop empties, drop exact
/// duplicates (first occurrence wins), and drop segments for which
/// `exists` returns false. Surviving segments keep their original
/// relative order, which makes the operation idempotent.
pub fn clean_path<F>(raw: &str, exists: F) -> String
where
    F: Fn(&str) -> bool,
{
    let mut seen: Vec<String> = Vec::new();
    for part in raw.split(';') {
        let part = part.trim();
        if part.is_empty() || seen.iter().any(|s| s == part) {
            continue;
        }
        if exists(part) {
            seen.push(part.to_owned());
        }
    }
    join_path(&seen)
}

/// Whether a registry value carries unexpanded `%VAR%` tokens, which
/// must round-trip as `REG_EXPAND_SZ` rather than `REG_SZ`.
pub fn has_env_token(value: &str) -> bool {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            if let Some(j) = value[i + 1..].find('%') {
                if j > 0 {
                    return true;
                }
                i += j + 1;
            }
        }
        i += 1;
    }
    false
}
