//! Go string literal decoding, shared by import paths and struct tags.

/// Decodes a raw (`` `...` ``) or interpreted (`"..."`) string literal.
///
/// Returns `None` for anything that is not a well-formed literal.
pub fn unquote(literal: &str) -> Option<String> {
    if let Some(raw) = literal
        .strip_prefix('`')
        .and_then(|rest| rest.strip_suffix('`'))
    {
        // Carriage returns are discarded from raw strings.
        return Some(raw.replace('\r', ""));
    }
    let body = literal.strip_prefix('"')?.strip_suffix('"')?;
    unescape(body, '"')
}

/// Decodes the escapes of an interpreted string body delimited by `quote`.
pub(crate) fn unescape(body: &str, quote: char) -> Option<String> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        if c == quote || c == '\n' {
            return None;
        }
        if c != '\\' {
            out.push(c);
            continue;
        }
        let escaped = match chars.next()? {
            'a' => '\x07',
            'b' => '\x08',
            'f' => '\x0c',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'v' => '\x0b',
            '\\' => '\\',
            '\'' => '\'',
            '"' => '"',
            'x' => char::from(hex_value(&mut chars, 2)? as u8),
            'u' => char::from_u32(hex_value(&mut chars, 4)?)?,
            'U' => char::from_u32(hex_value(&mut chars, 8)?)?,
            d @ '0'..='7' => {
                let mut value = d.to_digit(8)?;
                for _ in 0..2 {
                    value = value * 8 + chars.next()?.to_digit(8)?;
                }
                char::from(u8::try_from(value).ok()?)
            }
            _ => return None,
        };
        out.push(escaped);
    }
    Some(out)
}

fn hex_value(chars: &mut std::str::Chars<'_>, digits: usize) -> Option<u32> {
    (0..digits).try_fold(0u32, |acc, _| Some(acc * 16 + chars.next()?.to_digit(16)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unquote_raw() {
        assert_eq!(unquote("`json:\"id\"`").as_deref(), Some("json:\"id\""));
    }

    #[test]
    fn test_unquote_interpreted() {
        assert_eq!(unquote("\"github.com/a/b\"").as_deref(), Some("github.com/a/b"));
        assert_eq!(
            unquote(r#""json:\"id\" db:\"x\"""#).as_deref(),
            Some(r#"json:"id" db:"x""#)
        );
        assert_eq!(unquote(r#""\x41é\101""#).as_deref(), Some("AéA"));
    }

    #[test]
    fn test_unquote_rejects_malformed() {
        assert_eq!(unquote("github.com/a/b"), None);
        assert_eq!(unquote("\"unterminated"), None);
        assert_eq!(unquote(r#""bad \q escape""#), None);
        assert_eq!(unquote(r#""a"b""#), None);
    }
}
