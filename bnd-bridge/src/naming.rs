//! Snake-case name derivation for methods, globals and classes.
//!
//! Words are consumed from the front of the name, skipping underscores:
//! the literal `IDs`, a capitalized word (`Get`), an acronym not followed by
//! a lowercase letter (`DSP` in `DSPConnection`), or an already-lowercase
//! run (`get`, `3d`). Derivation stops at the first position where none of
//! these match. Lowercase runs make the rule idempotent on its own output.

/// `GetDSPConnection` → `get_dsp_connection`, `Get3DAttributes` →
/// `get_3d_attributes`, `GetIDs` → `get_ids`.
pub fn to_snake_case(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut rest = name;
    loop {
        rest = rest.trim_start_matches('_');
        let len = leading_word_len(rest);
        if len == 0 {
            break;
        }
        words.push(rest[..len].to_ascii_lowercase());
        rest = &rest[len..];
    }
    words.join("_")
}

fn leading_word_len(s: &str) -> usize {
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return 0;
    }
    if s.starts_with("IDs") {
        return 3;
    }

    if bytes[0].is_ascii_uppercase() {
        let lower = count_while(&bytes[1..], |b| b.is_ascii_lowercase());
        if lower > 0 {
            return 1 + lower;
        }
    }

    let acronym = count_while(bytes, |b| b.is_ascii_uppercase() || b.is_ascii_digit());
    // A bare digit run joins the lowercase letters after it (`12d`).
    if bytes[..acronym].iter().any(|b| b.is_ascii_uppercase()) {
        // Give the last capital back if it starts a capitalized word.
        let followed_by_lower = bytes.get(acronym).is_some_and(|b| b.is_ascii_lowercase());
        let len = if followed_by_lower { acronym - 1 } else { acronym };
        if len > 0 {
            return len;
        }
    }

    count_while(bytes, |b| b.is_ascii_lowercase() || b.is_ascii_digit())
}

fn count_while(bytes: &[u8], pred: impl Fn(u8) -> bool) -> usize {
    bytes.iter().take_while(|&&b| pred(b)).count()
}
