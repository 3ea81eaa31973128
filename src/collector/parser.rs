use crate::error::ParseError;

/// Разбирает строку вида "12/7 2024-05-01 10:30" в пару (левый, правый)
///
/// Все после первого пробела игнорируется.
pub fn parse_counts(line: &str) -> Result<(u32, u32), ParseError> {
    let counts = line.split_whitespace().next().ok_or(ParseError::Empty)?;

    let mut parts = counts.split('/');
    let left = parts.next().unwrap_or_default();
    let right = parts
        .next()
        .ok_or_else(|| ParseError::MissingSeparator(counts.to_string()))?;
    if parts.next().is_some() {
        return Err(ParseError::ExtraSeparator(counts.to_string()));
    }

    Ok((parse_count(left)?, parse_count(right)?))
}

fn parse_count(token: &str) -> Result<u32, ParseError> {
    token
        .parse::<u32>()
        .map_err(|_| ParseError::InvalidCount(token.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_counts_and_ignores_tail() {
        assert_eq!(parse_counts("5/7 foo"), Ok((5, 7)));
        assert_eq!(parse_counts("0/0"), Ok((0, 0)));
        assert_eq!(parse_counts("123/45 2024-05-01 10:30:00 extra"), Ok((123, 45)));
        assert_eq!(parse_counts("  8/9\tbar"), Ok((8, 9)));
    }

    #[test]
    fn empty_line_fails() {
        assert_eq!(parse_counts(""), Err(ParseError::Empty));
        assert_eq!(parse_counts("   "), Err(ParseError::Empty));
    }

    #[test]
    fn missing_separator_fails() {
        assert_eq!(
            parse_counts("57 foo"),
            Err(ParseError::MissingSeparator("57".to_string()))
        );
    }

    #[test]
    fn extra_separator_fails() {
        assert_eq!(
            parse_counts("1/2/3 foo"),
            Err(ParseError::ExtraSeparator("1/2/3".to_string()))
        );
    }

    #[test]
    fn non_integer_and_negative_fail() {
        assert_eq!(
            parse_counts("a/7"),
            Err(ParseError::InvalidCount("a".to_string()))
        );
        assert_eq!(
            parse_counts("5/-1"),
            Err(ParseError::InvalidCount("-1".to_string()))
        );
        assert_eq!(
            parse_counts("5/ 7"),
            Err(ParseError::InvalidCount("".to_string()))
        );
    }
}
