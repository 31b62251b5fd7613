//! Month arithmetic shared by the simulations. Simulations advance one
//! calendar month at a time and always address a month by its first day.

use chrono::{Datelike, Months, NaiveDate};

/// First day of the month containing `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// First day of the month `n` months after the month containing `date`.
pub fn add_months(date: NaiveDate, n: u32) -> NaiveDate {
    let start = month_start(date);
    start.checked_add_months(Months::new(n)).unwrap_or(start)
}

/// First days of every month from `from` to `to`, both months included.
pub fn month_range(from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
    let mut months = Vec::new();
    let mut current = month_start(from);
    let last = month_start(to);
    while current <= last {
        months.push(current);
        let next = add_months(current, 1);
        if next == current {
            break;
        }
        current = next;
    }
    months
}

/// Whether two dates fall in the same calendar month.
pub fn same_month(a: NaiveDate, b: NaiveDate) -> bool {
    a.year() == b.year() && a.month() == b.month()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_range_includes_both_ends() {
        let months = month_range(d(2023, 11, 15), d(2024, 2, 3));
        assert_eq!(months, vec![d(2023, 11, 1), d(2023, 12, 1), d(2024, 1, 1), d(2024, 2, 1)]);
    }

    #[test]
    fn month_range_empty_when_reversed() {
        assert!(month_range(d(2024, 3, 1), d(2024, 1, 1)).is_empty());
    }

    #[test]
    fn add_months_crosses_year() {
        assert_eq!(add_months(d(2023, 12, 31), 1), d(2024, 1, 1));
    }
}
