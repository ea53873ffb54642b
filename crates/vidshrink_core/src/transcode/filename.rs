//! Suggested file name for the compressed download.

/// Marker placed between the original stem and the `.mp4` extension.
pub const COMPRESSED_SUFFIX: &str = "_compressed.mp4";

/// Used when the source file name is unknown.
pub const FALLBACK_DOWNLOAD_NAME: &str = "output_compressed.mp4";

/// Derive the download name from the original file name.
///
/// Whitespace becomes `_`, and a trailing extension (a dot followed by at
/// least one non-dot character) is replaced by `_compressed.mp4`. A name
/// without such an extension keeps its form. Nothing else is sanitised.
pub fn download_file_name(original: Option<&str>) -> String {
    let original = match original {
        Some(name) if !name.is_empty() => name,
        _ => return FALLBACK_DOWNLOAD_NAME.to_string(),
    };

    let underscored: String = original
        .chars()
        .map(|c| if is_browser_whitespace(c) { '_' } else { c })
        .collect();

    match underscored.rfind('.') {
        Some(dot) if dot + 1 < underscored.len() => {
            format!("{}{}", &underscored[..dot], COMPRESSED_SUFFIX)
        }
        _ => underscored,
    }
}

/// Whitespace and line terminators as matched by `\s` in browser regexes.
/// Differs from `char::is_whitespace`: U+FEFF counts, U+0085 does not.
fn is_browser_whitespace(c: char) -> bool {
    matches!(
        c,
        '\t' | '\n'
            | '\u{000B}'
            | '\u{000C}'
            | '\r'
            | ' '
            | '\u{00A0}'
            | '\u{1680}'
            | '\u{2000}'..='\u{200A}'
            | '\u{2028}'
            | '\u{2029}'
            | '\u{202F}'
            | '\u{205F}'
            | '\u{3000}'
            | '\u{FEFF}'
    )
}
