//! Positional placeholder scanning.
//!
//! `?` characters inside quoted literals, quoted identifiers and comments are
//! not placeholders; everything else is.

/// Byte offsets of every `?` placeholder in `sql`.
fn placeholder_offsets(sql: &str) -> Vec<usize> {
    let bytes = sql.as_bytes();
    let mut offsets = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            quote @ (b'\'' | b'"') => {
                // Doubled quotes inside a literal are escapes; skipping to the
                // next quote and continuing handles them naturally.
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    i += 1;
                }
            }
            b'-' if bytes.get(i + 1) == Some(&b'-') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i += 2;
                while i < bytes.len() && !(bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/')) {
                    i += 1;
                }
                i += 1;
            }
            b'?' => offsets.push(i),
            _ => {}
        }
        i += 1;
    }

    offsets
}

/// Counts positional `?` placeholders in `sql`.
pub fn placeholder_count(sql: &str) -> usize {
    placeholder_offsets(sql).len()
}

/// Rewrites `?` placeholders as `$1, $2, ...` for drivers that number them.
pub fn to_numbered(sql: &str) -> String {
    let offsets = placeholder_offsets(sql);
    let mut out = String::with_capacity(sql.len() + offsets.len() * 2);
    let mut last = 0;

    for (n, offset) in offsets.iter().enumerate() {
        out.push_str(&sql[last..*offset]);
        out.push('$');
        out.push_str(&(n + 1).to_string());
        last = offset + 1;
    }
    out.push_str(&sql[last..]);
    out
}
