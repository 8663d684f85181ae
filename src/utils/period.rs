use chrono::{Datelike, NaiveDate};

pub const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Название месяца по дате (полное английское имя)
pub fn month_name(date: NaiveDate) -> &'static str {
    MONTH_NAMES[date.month0() as usize]
}

/// Метки month/year, которые хранятся вместе с платежом.
/// Пересчитываются при каждом изменении due_date.
pub fn derive_period(due_date: NaiveDate) -> (String, String) {
    (month_name(due_date).to_string(), due_date.year().to_string())
}

/// Первое число следующего календарного месяца относительно `today`.
/// Все неоплаченные платежи переносятся на одну и ту же дату,
/// независимо от их собственных сроков.
pub fn next_month_start(today: NaiveDate) -> NaiveDate {
    let (year, month) = if today.month() == 12 {
        (today.year() + 1, 1)
    } else {
        (today.year(), today.month() + 1)
    };

    // 1-е число существует в любом месяце
    NaiveDate::from_ymd_opt(year, month, 1).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_month_name() {
        assert_eq!(month_name(date(2024, 1, 15)), "January");
        assert_eq!(month_name(date(2024, 3, 15)), "March");
        assert_eq!(month_name(date(2024, 12, 31)), "December");
    }

    #[test]
    fn test_derive_period() {
        let (month, year) = derive_period(date(2024, 3, 15));
        assert_eq!(month, "March");
        assert_eq!(year, "2024");

        let (month, year) = derive_period(date(1999, 11, 1));
        assert_eq!(month, "November");
        assert_eq!(year, "1999");
    }

    #[test]
    fn test_next_month_start() {
        assert_eq!(next_month_start(date(2024, 3, 15)), date(2024, 4, 1));
        assert_eq!(next_month_start(date(2024, 1, 31)), date(2024, 2, 1));
        // перенос через конец года
        assert_eq!(next_month_start(date(2024, 12, 5)), date(2025, 1, 1));
    }

    #[test]
    fn test_next_month_start_from_first_day() {
        assert_eq!(next_month_start(date(2024, 6, 1)), date(2024, 7, 1));
    }
}
