use crate::records::RecordStore;

/// KPI header of the table: revenue and transaction count over the filtered rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Summary {
    pub transactions: usize,
    /// Sum of the amount column in cents.
    pub revenue_cents: i64,
}

impl Summary {
    pub fn of(store: &RecordStore, rows: &[usize], amount_field: &str) -> Self {
        let revenue_cents = rows
            .iter()
            .filter_map(|&idx| store.get(idx))
            .filter_map(|r| parse_cents(r.cell(amount_field)))
            .sum();
        Self {
            transactions: rows.len(),
            revenue_cents,
        }
    }

    pub fn revenue(&self) -> String {
        format_euro_cents(self.revenue_cents)
    }

    pub fn count(&self) -> String {
        group_thousands(self.transactions as u64)
    }
}

/// "€1,234.56" / "1234.5" / "-3" → cents. Unparsable cells give `None`.
pub fn parse_cents(cell: &str) -> Option<i64> {
    let cleaned: String = cell
        .trim()
        .trim_start_matches('€')
        .chars()
        .filter(|&c| c != ',')
        .collect();
    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some((value * 100.0).round() as i64)
}

pub fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn format_euro_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{sign}€{}.{:02}", group_thousands(abs / 100), abs % 100)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::columns::{ColumnRegistry, RecordShape};
    use crate::records::Record;
    use std::collections::HashMap;

    #[test]
    fn parses_formatted_amounts() {
        assert_eq!(parse_cents("€123.45"), Some(12345));
        assert_eq!(parse_cents("€1,234.5"), Some(123450));
        assert_eq!(parse_cents(" 7 "), Some(700));
        assert_eq!(parse_cents("n/a"), None);
        assert_eq!(parse_cents(""), None);
    }

    #[test]
    fn formats_with_thousands_separators() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1324), "1,324");
        assert_eq!(group_thousands(15_625_000), "15,625,000");
        assert_eq!(format_euro_cents(415_600), "€4,156.00");
        assert_eq!(format_euro_cents(-5), "-€0.05");
    }

    #[test]
    fn sums_only_the_given_rows() {
        let registry = ColumnRegistry::new(RecordShape::Normal, Vec::new()).unwrap();
        let records = ["€10.00", "€2.50", "bogus", "€1,000.00"]
            .iter()
            .enumerate()
            .map(|(i, amount)| {
                let fields = HashMap::from([("amount".to_string(), amount.to_string())]);
                Record::new(i + 1, "malmo", fields)
            })
            .collect();
        let store = RecordStore::new(&registry, records).unwrap();

        let all = Summary::of(&store, &[0, 1, 2, 3], "amount");
        assert_eq!(all.transactions, 4);
        assert_eq!(all.revenue(), "€1,012.50");

        let some = Summary::of(&store, &[1, 2], "amount");
        assert_eq!(some.revenue_cents, 250);
        assert_eq!(some.count(), "2");
    }
}
