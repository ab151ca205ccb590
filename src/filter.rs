use chrono::NaiveDate;
use tracing::trace;

use crate::columns::{ColumnDescriptor, ColumnRegistry};
use crate::records::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    /// The week ending on `today`, the picker's initial range.
    pub fn last_week(today: NaiveDate) -> Self {
        Self {
            from: today - chrono::Days::new(7),
            to: Some(today),
        }
    }

    pub fn label(&self) -> String {
        let from = self.from.format("%b %d, %Y");
        match self.to {
            Some(to) => format!("{} - {}", from, to.format("%b %d, %Y")),
            None => from.to_string(),
        }
    }
}

/// Operator selection of the transaction table.
///
/// An empty selection matches every record, exactly like selecting every operator.
/// The date range is carried for display and for a future query backend; it does not
/// restrict the rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    operators: Vec<String>,
    date_range: Option<DateRange>,
}

impl FilterState {
    pub fn new(date_range: Option<DateRange>) -> Self {
        Self {
            operators: Vec::new(),
            date_range,
        }
    }

    /// Selected operators in selection order.
    pub fn operators(&self) -> &[String] {
        &self.operators
    }

    pub fn is_selected(&self, operator: &str) -> bool {
        self.operators.iter().any(|o| o == operator)
    }

    pub fn toggle_operator(&mut self, operator: &str) {
        if let Some(pos) = self.operators.iter().position(|o| o == operator) {
            self.operators.remove(pos);
        } else {
            self.operators.push(operator.to_string());
        }
        trace!("Operator selection: {:?}", self.operators);
    }

    pub fn clear_operators(&mut self) {
        self.operators.clear();
    }

    pub fn matches(&self, operator: &str) -> bool {
        self.operators.is_empty() || self.is_selected(operator)
    }

    pub fn date_range(&self) -> Option<DateRange> {
        self.date_range
    }
}

/// Store indices of the records passing `filter`, in store order.
pub fn filter_rows(store: &RecordStore, filter: &FilterState) -> Vec<usize> {
    store
        .records()
        .iter()
        .enumerate()
        .filter(|(_, r)| filter.matches(r.operator()))
        .map(|(idx, _)| idx)
        .collect()
}

/// Visible columns in registry order.
pub fn visible_columns(registry: &ColumnRegistry) -> Vec<&ColumnDescriptor> {
    registry.columns().iter().filter(|c| c.visible).collect()
}
