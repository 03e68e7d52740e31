//! Text rendering utilities for human-friendly error messages.
//!
//! Turns the raw `std::any::type_name` output the container works with
//! into something a person wants to read in a diagnostic.

/// Shortens a fully qualified type name for display.
///
/// Every path is reduced to its last segment, inside generic arguments
/// included.
///
/// ```
/// use ambar_support::rendering::shorten_type_name;
///
/// let short = shorten_type_name("my_app::services::user::UserService");
/// assert_eq!(short, "UserService");
///
/// let short = shorten_type_name("alloc::sync::Arc<dyn my_app::traits::Logger>");
/// assert_eq!(short, "Arc<dyn Logger>");
/// ```
pub fn shorten_type_name(full: &str) -> String {
    let mut short = String::with_capacity(full.len());
    let bytes = full.as_bytes();
    let mut segment_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b':' if bytes.get(i + 1) == Some(&b':') => {
                // Discard everything up to and including the separator.
                segment_start = i + 2;
                i += 2;
            }
            b'<' | b'>' | b',' | b' ' | b'(' | b')' | b'[' | b']' => {
                short.push_str(&full[segment_start..i]);
                short.push(bytes[i] as char);
                segment_start = i + 1;
                i += 1;
            }
            _ => i += 1,
        }
    }

    short.push_str(&full[segment_start..]);
    short
}

/// Ranks registered type names by similarity to a requested one, for
/// "did you mean?" output. Returns at most `limit` names, best first.
pub fn suggest_similar(requested: &str, available: &[&str], limit: usize) -> Vec<String> {
    let wanted = requested.to_lowercase();
    let wanted_short = shorten_type_name(requested).to_lowercase();

    let mut ranked: Vec<(usize, &str)> = available
        .iter()
        .filter_map(|&candidate| {
            similarity(&wanted, &wanted_short, candidate).map(|score| (score, candidate))
        })
        .collect();

    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked
        .into_iter()
        .take(limit)
        .map(|(_, name)| name.to_string())
        .collect()
}

fn similarity(wanted: &str, wanted_short: &str, candidate: &str) -> Option<usize> {
    let name = candidate.to_lowercase();
    if name.contains(wanted) || wanted.contains(&name) {
        return Some(100);
    }

    let short = shorten_type_name(candidate).to_lowercase();
    if short.contains(wanted_short) || wanted_short.contains(&short) {
        return Some(80);
    }

    let prefix = short
        .bytes()
        .zip(wanted_short.bytes())
        .take_while(|(a, b)| a == b)
        .count();
    (prefix >= 3).then_some(prefix * 10)
}
