//! Deterministic identifier generation.
//!
//! A record's identifier is derived from its name. When that collides with
//! an identifier already in use, the generator first tries the record's
//! disambiguation values, then falls back to numeric suffixes:
//!
//! ```text
//! "log"  -> "log"                 (free)
//!        -> "log_function"        (disambiguated by a `type` field)
//!        -> "log_1", "log_2", ... (numeric fallback)
//! ```
//!
//! Every variant, including the numeric ones, extends the *original*
//! normalized name. The `taken` predicate is consulted live, so a numeric
//! suffix never reuses an identifier produced earlier in the same call.

/// Reserved identifier of the synthetic root record.
pub const ROOT_UID: &str = "root";

/// Replace every character outside `[A-Za-z0-9_]` with `_`.
#[must_use]
pub fn normalize(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Derive a free identifier for `name`.
///
/// `values` are the record's disambiguation values, tried in order.
/// `taken` reports whether a candidate is already in use.
pub fn generate<S, F>(name: &str, values: &[S], taken: F) -> String
where
    S: AsRef<str>,
    F: Fn(&str) -> bool,
{
    let base = normalize(name);
    if !taken(&base) {
        return base;
    }

    for value in values {
        let candidate = format!("{base}_{}", normalize(value.as_ref()));
        if !taken(&candidate) {
            return candidate;
        }
    }

    let mut n: u64 = 1;
    loop {
        let candidate = format!("{base}_{n}");
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
