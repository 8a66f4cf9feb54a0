/// Best-effort "Last, First" -> "First Last". Text after a second comma is dropped.
///
/// Without a comma the trailing token is taken as the surname and moved to the
/// front, so `"John Smith"` becomes `"Smith John"`. Single tokens pass through.
pub fn format_rep_name(raw: &str) -> String {
    let mut parts = raw.split(',');
    if let (Some(last), Some(first)) = (parts.next(), parts.next()) {
        return format!("{} {}", first.trim(), last.trim()).trim().to_string();
    }

    let tokens: Vec<&str> = raw.split_whitespace().collect();
    match tokens.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{} {}", last, rest.join(" ")),
        _ => raw.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_comma_separated_names() {
        assert_eq!(format_rep_name("Smith, John"), "John Smith");
        assert_eq!(format_rep_name("  Doe ,Jane  "), "Jane Doe");
        assert_eq!(format_rep_name("Garcia Lopez, Maria Elena"), "Maria Elena Garcia Lopez");
    }

    #[test]
    fn moves_trailing_token_to_front() {
        assert_eq!(format_rep_name("John Smith"), "Smith John");
        assert_eq!(format_rep_name("Mary Ann  Jones"), "Jones Mary Ann");
    }

    #[test]
    fn single_tokens_and_blanks_pass_through() {
        assert_eq!(format_rep_name("John"), "John");
        assert_eq!(format_rep_name("  "), "");
        assert_eq!(format_rep_name(""), "");
    }

    #[test]
    fn suffix_after_second_comma_is_dropped() {
        assert_eq!(format_rep_name("Smith, John, Jr"), "John Smith");
        assert_eq!(format_rep_name("Smith,"), "Smith");
    }
}
