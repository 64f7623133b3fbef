use std::borrow::Cow;

/// Removes characters that are not allowed anywhere in an XML 1.0 document.
///
/// Provider text occasionally carries stray C0 control characters (copied
/// from rich-text editors). Escaping cannot help with those: `&#1;` is just
/// as illegal as the raw byte. Tab, newline and carriage return are kept.
///
/// Returns `Cow::Borrowed` when nothing needs removing.
///
/// # Examples
///
/// ```
/// use raiplayrss::util::strip_xml_invalid_chars;
///
/// assert_eq!(strip_xml_invalid_chars("La storia\u{1} in giallo"), "La storia in giallo");
/// assert_eq!(strip_xml_invalid_chars("riga\nnuova"), "riga\nnuova");
/// ```
pub fn strip_xml_invalid_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_xml_invalid) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_xml_invalid(c)).collect())
}

fn is_xml_invalid(c: char) -> bool {
    match c {
        '\t' | '\n' | '\r' => false,
        '\u{0}'..='\u{1f}' => true,
        '\u{fffe}' | '\u{ffff}' => true,
        _ => false,
    }
}
