//! Visible rendering of whitespace inside tokens.

use std::borrow::Cow;

/// Shown in place of a space.
pub const SPACE_GLYPH: char = '␣';
/// Shown in place of a newline.
pub const NEWLINE_GLYPH: char = '↵';
/// Shown in place of a tab.
pub const TAB_GLYPH: char = '→';

/// Render a token with space, newline and tab made visible.
///
/// Borrows when there is nothing to replace.
pub fn to_display(token: &str) -> Cow<'_, str> {
    if !token.contains([' ', '\n', '\t']) {
        return Cow::Borrowed(token);
    }
    Cow::Owned(
        token
            .chars()
            .map(|c| match c {
                ' ' => SPACE_GLYPH,
                '\n' => NEWLINE_GLYPH,
                '\t' => TAB_GLYPH,
                other => other,
            })
            .collect(),
    )
}

/// Render a token sequence as `[a, b, c]` with visible whitespace.
pub fn join_display<S: AsRef<str>>(tokens: &[S]) -> String {
    let rendered: Vec<Cow<'_, str>> = tokens.iter().map(|t| to_display(t.as_ref())).collect();
    format!("[{}]", rendered.join(", "))
}
