mod location;
mod role;
mod skills;

pub use location::normalize_location;
pub use role::{STANDARD_ROLES, normalize_role};
pub use skills::split_skill_list;

/// Title-case in the Python `str.title` sense: the first alphabetic character
/// of every word is uppercased, the rest lowercased. Used as the fallback for
/// strings that match nothing in a taxonomy, so repeated application is a
/// no-op.
pub(crate) fn title_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut at_word_start = true;

    for ch in raw.chars() {
        if ch.is_alphabetic() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.extend(ch.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }

    out
}
