//! JSON-with-comments support for `tsconfig.json` and `typedoc.json`.
//!
//! Both files are conventionally written as JSONC: `//` and `/* */` comments
//! and trailing commas are accepted by the tools that read them.

/// Strip comments and trailing commas so the result parses as strict JSON.
///
/// String contents are left untouched, including escaped quotes.
/// Newlines inside block comments are preserved so serde error positions
/// still point at the right line.
#[must_use]
pub fn strip_jsonc(source: &str) -> String {
    let without_comments = strip_comments(source);
    strip_trailing_commas(&without_comments)
}

fn strip_comments(source: &str) -> String {
    let mut result = String::with_capacity(source.len());
    let chars: Vec<char> = source.chars().collect();
    let len = chars.len();
    let mut i = 0;
    let mut in_string = false;
    let mut escaped = false;

    while i < len {
        let c = chars[i];
        if in_string {
            result.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
        } else if c == '/' && i + 1 < len && chars[i + 1] == '/' {
            while i < len && chars[i] != '\n' {
                i += 1;
            }
        } else if c == '/' && i + 1 < len && chars[i + 1] == '*' {
            i += 2;
            while i < len && !(chars[i] == '*' && i + 1 < len && chars[i + 1] == '/') {
                if chars[i] == '\n' {
                    result.push('\n');
                }
                i += 1;
            }
            i += 2;
        } else {
            if c == '"' {
                in_string = true;
            }
            result.push(c);
            i += 1;
        }
    }

    result
}

fn strip_trailing_commas(source: &str) -> String {
    let chars: Vec<char> = source.chars().collect();
    let mut result = String::with_capacity(source.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            result.push(c);
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                result.push(c);
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|ch| !ch.is_whitespace());
                if !matches!(next, Some('}' | ']')) {
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
    }

    result
}
