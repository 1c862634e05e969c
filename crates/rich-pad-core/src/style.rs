/// Inline `style` attribute helpers: declaration parsing and pixel lengths.

/// Splits a style attribute into `(property, value)` pairs.
///
/// Property names are lower-cased; empty or malformed declarations are skipped.
pub fn declarations(style: &str) -> Vec<(String, String)> {
    style
        .split(';')
        .filter_map(|decl| {
            let (name, value) = decl.split_once(':')?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim();
            if name.is_empty() || value.is_empty() {
                return None;
            }
            Some((name, value.to_string()))
        })
        .collect()
}

/// Joins declarations back into attribute form: `a: 1; b: 2`.
pub fn serialize(decls: &[(String, String)]) -> String {
    decls
        .iter()
        .map(|(k, v)| format!("{k}: {v}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Returns the value of `name`. The last declaration wins, as in CSS.
pub fn get(style: &str, name: &str) -> Option<String> {
    declarations(style)
        .into_iter()
        .rev()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v)
}

/// Returns `style` with `name` set to `value`, replacing earlier declarations.
pub fn set(style: &str, name: &str, value: &str) -> String {
    let mut decls = declarations(style);
    decls.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    if !value.is_empty() {
        decls.push((name.to_ascii_lowercase(), value.to_string()));
    }
    serialize(&decls)
}

/// Returns `style` without any declaration of `name`.
pub fn remove(style: &str, name: &str) -> String {
    let mut decls = declarations(style);
    decls.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
    serialize(&decls)
}

/// Parses a pixel length such as `200px`, `200` or `120.6px`, rounded.
///
/// Returns `None` for relative units (`%`, `em`, `auto`, ...) and negatives.
pub fn parse_px(value: &str) -> Option<u32> {
    let value = value.trim();
    let number = value
        .strip_suffix("px")
        .or_else(|| value.strip_suffix("PX"))
        .unwrap_or(value)
        .trim();
    let parsed: f64 = number.parse().ok()?;
    if !parsed.is_finite() || parsed < 0.0 {
        return None;
    }
    Some(parsed.round() as u32)
}
