//! Struct tag lookup with the conventional `key:"value"` syntax.

use crate::syntax::unquote;

/// A decoded struct tag, e.g. `json:"id,omitempty" db:"id"`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct StructTag<'a>(pub &'a str);

impl<'a> StructTag<'a> {
    /// Value associated with `key`.
    ///
    /// Scanning stops at the first malformed pair, so keys after it are not
    /// found. An unparsable value is reported the same as a missing key.
    pub fn lookup(&self, key: &str) -> Option<String> {
        let mut rest = self.0;
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                return None;
            }

            let bytes = rest.as_bytes();
            let name_len = bytes
                .iter()
                .position(|&b| b <= b' ' || b == b':' || b == b'"' || b == 0x7f)
                .unwrap_or(bytes.len());
            if name_len == 0
                || name_len + 1 >= bytes.len()
                || bytes[name_len] != b':'
                || bytes[name_len + 1] != b'"'
            {
                return None;
            }
            let name = &rest[..name_len];
            rest = &rest[name_len + 1..];

            let bytes = rest.as_bytes();
            let mut i = 1;
            while i < bytes.len() && bytes[i] != b'"' {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            if i >= bytes.len() {
                return None;
            }
            let quoted = &rest[..=i];
            rest = &rest[i + 1..];

            if name == key {
                return unquote(quoted);
            }
        }
    }
}
