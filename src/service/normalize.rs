use crate::error::ParseError;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

/// 日期格式，按顺序尝试，第一个成功即返回
///
/// 美式 (月/日) 排在欧式 (日/月) 之前：03/04/2024 解析为 3 月 4 日
pub const DATE_LAYOUTS: &[&str] = &[
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%b %d, %Y",
    "%d %b %Y",
    "%B %d, %Y",
    "%Y/%m/%d",
];

/// 金额整数部分最多位数，超出视为识别噪声 (卡号、单号等)
pub const MAX_AMOUNT_DIGITS: usize = 10;

/// 解析金额文本 ("$1.99", "12,50")
///
/// 删除数字、逗号、句点以外的所有字符，逗号一律替换为句点。
/// 不识别千分位："$1,234.56" 变成 "1.234.56"，解析失败
pub fn parse_amount(text: &str) -> Result<BigDecimal, ParseError> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    if cleaned.is_empty() || cleaned == "." || cleaned.matches('.').count() > 1 {
        return Err(ParseError::amount(text));
    }

    let integer_part = cleaned.split('.').next().unwrap_or_default().trim_start_matches('0');
    if integer_part.len() > MAX_AMOUNT_DIGITS {
        return Err(ParseError::amount(text));
    }

    BigDecimal::from_str(&cleaned).map_err(|_| ParseError::amount(text))
}

/// 解析日期文本，见 [`DATE_LAYOUTS`]
pub fn parse_date(text: &str) -> Result<NaiveDate, ParseError> {
    let trimmed = text.trim();
    DATE_LAYOUTS
        .iter()
        .find_map(|layout| NaiveDate::parse_from_str(trimmed, layout).ok())
        .ok_or_else(|| ParseError::date(text))
}

/// OCR 文本噪声大：解析失败时保留字段默认值，只记 debug 日志
pub fn best_effort<T>(field: &str, parsed: Result<T, ParseError>) -> Option<T> {
    match parsed {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::debug!("ignoring {} field: {}", field, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn amount_strips_currency_symbols() {
        assert_eq!(parse_amount("$25.00").unwrap(), dec("25.00"));
        assert_eq!(parse_amount("  4.5 USD").unwrap(), dec("4.5"));
        assert_eq!(parse_amount("R$ 7,5").unwrap(), dec("7.5"));
        assert_eq!(parse_amount("12,50").unwrap(), dec("12.50"));
        assert_eq!(parse_amount("100").unwrap(), dec("100"));
    }

    #[test]
    fn amount_drops_sign() {
        assert_eq!(parse_amount("-3.00").unwrap(), dec("3"));
    }

    #[test]
    fn amount_thousands_separators_are_not_understood() {
        // 逗号一律视作小数点，两种千分位写法都会出现两个句点
        assert!(parse_amount("$1,234.56").is_err());
        assert!(parse_amount("1.234,56").is_err());
    }

    #[test]
    fn amount_rejects_implausible_magnitude() {
        assert!(parse_amount("4111 1111 1111 1111").is_err());
        assert!(parse_amount("12345678901.00").is_err());
        assert_eq!(parse_amount("9999999999.99").unwrap(), dec("9999999999.99"));
        assert_eq!(parse_amount("000000000000042").unwrap(), dec("42"));
    }

    #[test]
    fn amount_rejects_empty() {
        assert!(parse_amount("").is_err());
        assert!(parse_amount("$").is_err());
        assert!(parse_amount("total").is_err());
        assert!(parse_amount(".").is_err());
    }

    #[test]
    fn date_layouts() {
        let expected = ymd(2024, 3, 15);
        for text in [
            "2024-03-15",
            "03/15/2024",
            "15/03/2024",
            "Mar 15, 2024",
            "15 Mar 2024",
            "March 15, 2024",
            "2024/03/15",
        ] {
            assert_eq!(parse_date(text).unwrap(), expected, "layout for {}", text);
        }
    }

    #[test]
    fn date_single_digit_day() {
        assert_eq!(parse_date("Jan 2, 2024").unwrap(), ymd(2024, 1, 2));
        assert_eq!(parse_date("2 Jan 2024").unwrap(), ymd(2024, 1, 2));
    }

    #[test]
    fn date_ambiguous_numeric_prefers_us() {
        assert_eq!(parse_date("03/04/2024").unwrap(), ymd(2024, 3, 4));
        assert_eq!(parse_date("25/12/2024").unwrap(), ymd(2024, 12, 25));
    }

    #[test]
    fn date_trims_whitespace() {
        assert_eq!(parse_date(" 2024-01-31\n").unwrap(), ymd(2024, 1, 31));
    }

    #[test]
    fn date_failure_names_input() {
        let err = parse_date("not-a-date").unwrap_err();
        assert_eq!(err, ParseError::date("not-a-date"));
        assert!(err.to_string().contains("not-a-date"));
        assert!(parse_date("2024-13-45").is_err());
    }

    #[test]
    fn best_effort_discards_errors() {
        assert_eq!(best_effort("TOTAL", parse_amount("$2.50")), Some(dec("2.50")));
        assert_eq!(best_effort("TOTAL", parse_amount("n/a")), None);
    }
}
