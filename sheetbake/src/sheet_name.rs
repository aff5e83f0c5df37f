//! Sheet name rules. Comment and pseudo sheets are written `<name>` or `$name`.

pub fn is_pseudo(name: &str) -> bool {
    let name = name.trim();
    name.starts_with('$') || name.starts_with('<') || name.ends_with('>')
}

/// A regular sheet name: not blank and not a pseudo sheet.
pub fn is_valid(name: &str) -> bool {
    !name.trim().is_empty() && !is_pseudo(name)
}

/// Persisted file name of a sheet. `<name>` maps to `$name`, a blank name at a known position maps to `$<index>`.
pub fn file_name(name: &str, index: Option<usize>) -> Option<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return index.map(|i| format!("${i}"));
    }
    match trimmed.strip_prefix('<').and_then(|rest| rest.strip_suffix('>')) {
        Some(inner) if !inner.trim().is_empty() => Some(format!("${}", inner.trim())),
        Some(_) => index.map(|i| format!("${i}")),
        None => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pseudo_sheets_are_not_valid() {
        assert!(is_valid("Heroes"));
        assert!(!is_valid("  "));
        assert!(!is_valid("$notes"));
        assert!(!is_valid("<notes>"));
        assert!(!is_valid("notes>"));
        assert!(is_pseudo("<notes"));
    }

    #[test]
    fn file_names_follow_sheet_names() {
        assert_eq!(file_name("Heroes", Some(0)).as_deref(), Some("Heroes"));
        assert_eq!(file_name("<Notes>", None).as_deref(), Some("$Notes"));
        assert_eq!(file_name("", Some(3)).as_deref(), Some("$3"));
        assert_eq!(file_name(" ", None), None);
        assert_eq!(file_name("<>", Some(1)).as_deref(), Some("$1"));
    }
}
