//! Canonical form for inline `style` attributes.
//!
//! Hosts serialize the same style in different ways (`rgb(...)` vs hex,
//! spacing, trailing semicolons). Normalizing on the way into the model keeps
//! the attribute diff from reporting changes that are not changes.

/// Normalize a `style` attribute value:
///
/// - declarations trimmed, empty ones dropped
/// - property names lower-cased
/// - runs of whitespace in values collapsed, except inside quotes
/// - `rgb(r, g, b)` and opaque `rgba(r, g, b, 1)` rewritten as `#rrggbb`
pub fn normalize_style(style: &str) -> String {
    split_declarations(style)
        .into_iter()
        .filter_map(|declaration| {
            let (name, value) = declaration.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = collapse_whitespace(value.trim());
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some(format!("{}: {}", name, normalize_colors(&value)))
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Split on `;` outside parentheses and quotes, so `url(data:...;base64,...)`
/// and quoted font names stay whole.
fn split_declarations(style: &str) -> Vec<&str> {
    let mut declarations = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, ch) in style.char_indices() {
        match (quote, ch) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                declarations.push(&style[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    declarations.push(&style[start..]);
    declarations
}

fn collapse_whitespace(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut last_was_space = false;
    let mut quote: Option<char> = None;

    for ch in value.chars() {
        match (quote, ch) {
            (Some(open), c) if c == open => quote = None,
            (None, '"' | '\'') => quote = Some(ch),
            _ => {}
        }
        if ch.is_whitespace() && quote.is_none() {
            if !last_was_space {
                result.push(' ');
                last_was_space = true;
            }
        } else {
            result.push(ch);
            last_was_space = false;
        }
    }

    result
}

/// Rewrite every `rgb()`/`rgba()` occurrence in a value that can be expressed
/// as a hex color. Anything unparseable is left untouched.
fn normalize_colors(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = find_color_function(rest) {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        let Some(close) = tail.find(')') else {
            out.push_str(tail);
            return out;
        };
        let call = &tail[..=close];
        match rgb_to_hex(call) {
            Some(hex) => out.push_str(&hex),
            None => out.push_str(call),
        }
        rest = &tail[close + 1..];
    }

    out.push_str(rest);
    out
}

fn find_color_function(value: &str) -> Option<usize> {
    let lower = value.to_ascii_lowercase();
    lower.find("rgb(").into_iter().chain(lower.find("rgba(")).min()
}

fn rgb_to_hex(call: &str) -> Option<String> {
    let open = call.find('(')?;
    let args: Vec<&str> = call[open + 1..call.len() - 1]
        .split(',')
        .map(str::trim)
        .collect();

    let channels = match args.as_slice() {
        [r, g, b] => [*r, *g, *b],
        [r, g, b, a] => {
            let alpha: f32 = a.parse().ok()?;
            if (alpha - 1.0).abs() > f32::EPSILON {
                return None;
            }
            [*r, *g, *b]
        }
        _ => return None,
    };

    let mut hex = String::from("#");
    for channel in channels {
        let value: u8 = channel.parse().ok()?;
        hex.push_str(&format!("{:02x}", value));
    }
    Some(hex)
}
