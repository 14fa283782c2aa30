//! Store-style glob patterns: `*`, `?`, `[abc]`, `[^a-z]` and `\` escapes.
//!
//! Used client-side to match empty placeholders against a `KEYS` pattern and
//! by the in-memory engine to answer `KEYS`.

const SPECIAL: &[u8] = b"*?[]\\";

/// True if `text` matches `pattern`.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let (p, t) = (pattern.as_bytes(), text.as_bytes());
    let (mut pi, mut ti) = (0, 0);
    // Position after the last `*` seen, and the text index it is retried from.
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        let step = match p.get(pi) {
            Some(b'*') => {
                backtrack = Some((pi + 1, ti));
                pi += 1;
                continue;
            }
            Some(b'?') => Some(1),
            Some(b'[') => match_class(&p[pi..], t[ti]),
            Some(b'\\') if pi + 1 < p.len() => (p[pi + 1] == t[ti]).then_some(2),
            Some(&c) => (c == t[ti]).then_some(1),
            None => None,
        };
        match (step, backtrack) {
            (Some(width), _) => {
                pi += width;
                ti += 1;
            }
            (None, Some((star_pi, star_ti))) => {
                backtrack = Some((star_pi, star_ti + 1));
                pi = star_pi;
                ti = star_ti + 1;
            }
            (None, None) => return false,
        }
    }
    p[pi..].iter().all(|&c| c == b'*')
}

/// Match one byte against the class at the start of `class` (`[` included).
/// Returns the class width on a match; `None` on a miss or an unclosed class.
fn match_class(class: &[u8], ch: u8) -> Option<usize> {
    let mut i = 1;
    let negate = class.get(i) == Some(&b'^');
    if negate {
        i += 1;
    }
    let mut hit = false;
    loop {
        match class.get(i)? {
            b']' => break,
            b'\\' => {
                hit |= *class.get(i + 1)? == ch;
                i += 2;
            }
            &lo if class.get(i + 1) == Some(&b'-') && class.get(i + 2).is_some_and(|&c| c != b']') => {
                let hi = class[i + 2];
                hit |= (lo.min(hi)..=lo.max(hi)).contains(&ch);
                i += 3;
            }
            &c => {
                hit |= c == ch;
                i += 1;
            }
        }
    }
    (hit != negate).then_some(i + 1)
}

/// Escape glob metacharacters so `text` only matches itself.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_ascii() && SPECIAL.contains(&(c as u8)) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// True if `pattern` contains an unescaped wildcard or class.
pub fn has_wildcards(pattern: &str) -> bool {
    let mut bytes = pattern.bytes();
    while let Some(b) = bytes.next() {
        match b {
            b'\\' => {
                bytes.next();
            }
            b'*' | b'?' | b'[' => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_and_question() {
        assert!(glob_match("*", ""));
        assert!(glob_match("user:*:posts", "user:42:posts"));
        assert!(glob_match("user:*:posts", "user::posts"));
        assert!(!glob_match("user:*:posts", "user:42:likes"));
        assert!(glob_match("a?c", "abc"));
        assert!(!glob_match("a?c", "ac"));
        assert!(glob_match("*b*d", "abcxbd"));
    }

    #[test]
    fn test_classes() {
        assert!(glob_match("h[ae]llo", "hallo"));
        assert!(!glob_match("h[ae]llo", "hillo"));
        assert!(glob_match("id:[0-9]", "id:7"));
        assert!(!glob_match("id:[^0-9]", "id:7"));
        assert!(!glob_match("id:[0-9", "id:7"));
    }

    #[test]
    fn test_escape_round_trip() {
        let literal = "weird*key?[1]";
        let pattern = escape(literal);
        assert_eq!(pattern, r"weird\*key\?\[1\]");
        assert!(glob_match(&pattern, literal));
        assert!(!glob_match(&pattern, "weirdXkey?[1]"));
        assert!(!has_wildcards(&pattern));
        assert!(has_wildcards("user:*"));
    }
}
