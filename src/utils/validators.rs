use once_cell::sync::Lazy;
use regex::Regex;

use crate::utils::period::MONTH_NAMES;

static PHONE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+7[0-9]{10}$").unwrap());

static PLOT_NUMBER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9/-]{0,31}$").unwrap());

static YEAR_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{4}$").unwrap());

pub fn validate_phone(phone: &str) -> bool {
    PHONE_REGEX.is_match(phone)
}

pub fn validate_plot_number(number: &str) -> bool {
    PLOT_NUMBER_REGEX.is_match(number)
}

/// Метка месяца должна совпадать с одним из хранимых названий,
/// иначе сводка молча вернёт нули по опечатке.
pub fn validate_month_name(month: &str) -> bool {
    MONTH_NAMES.contains(&month)
}

pub fn validate_year(year: &str) -> bool {
    YEAR_REGEX.is_match(year)
}

pub fn sanitize_string(input: &str) -> String {
    input.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+77771234567"));
        assert!(!validate_phone("87771234567"));
        assert!(!validate_phone("+7777123456"));
        assert!(!validate_phone("+777712345678"));
    }

    #[test]
    fn test_validate_plot_number() {
        assert!(validate_plot_number("A-12"));
        assert!(validate_plot_number("17/3"));
        assert!(!validate_plot_number(""));
        assert!(!validate_plot_number("-12"));
        assert!(!validate_plot_number("номер"));
    }

    #[test]
    fn test_validate_month_name() {
        assert!(validate_month_name("March"));
        assert!(validate_month_name("December"));
        assert!(!validate_month_name("march"));
        assert!(!validate_month_name("Martius"));
    }

    #[test]
    fn test_validate_year() {
        assert!(validate_year("2024"));
        assert!(!validate_year("24"));
        assert!(!validate_year("20244"));
    }
}
