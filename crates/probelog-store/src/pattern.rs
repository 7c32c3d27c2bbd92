//! strftime-style filename pattern rendering.
//!
//! The store only needs the handful of directives the default pattern and
//! its documented variants use, so this is a small fixed subset rather than
//! a full strftime implementation. Unknown directives are an error instead
//! of silently passing through.

use time::OffsetDateTime;

use crate::error::{Error, Result};

/// Render a filename pattern against a point in time.
///
/// Supported directives: `%Y` (4-digit year), `%m` (month), `%d` (day),
/// `%H` (hour), `%M` (minute), `%S` (second), `%%` (literal percent).
pub fn render(pattern: &str, at: OffsetDateTime) -> Result<String> {
    let mut out = String::with_capacity(pattern.len() + 8);
    let mut chars = pattern.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('Y') => out.push_str(&format!("{:04}", at.year())),
            Some('m') => out.push_str(&format!("{:02}", u8::from(at.month()))),
            Some('d') => out.push_str(&format!("{:02}", at.day())),
            Some('H') => out.push_str(&format!("{:02}", at.hour())),
            Some('M') => out.push_str(&format!("{:02}", at.minute())),
            Some('S') => out.push_str(&format!("{:02}", at.second())),
            Some('%') => out.push('%'),
            Some(other) => return Err(Error::Pattern(other)),
            // A trailing bare '%' is kept literally.
            None => out.push('%'),
        }
    }

    Ok(out)
}
