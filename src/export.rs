use std::collections::BTreeSet;
use std::fmt;

use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ExportFormat {
    Excel,
    Csv,
    Json,
    Pdf,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 4] = [
        ExportFormat::Excel,
        ExportFormat::Csv,
        ExportFormat::Json,
        ExportFormat::Pdf,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ExportFormat::Excel => "Excel",
            ExportFormat::Csv => "CSV",
            ExportFormat::Json => "JSON",
            ExportFormat::Pdf => "PDF",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataAmount {
    #[default]
    All,
    /// First `n` rows of the filtered result.
    Limited(usize),
}

impl DataAmount {
    pub fn row_cap(self) -> Option<usize> {
        match self {
            DataAmount::All => None,
            DataAmount::Limited(n) => Some(n),
        }
    }
}

/// One export operation handed to the export backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportIntent {
    pub format: ExportFormat,
    pub row_cap: Option<usize>,
    /// Rows the artifact will contain for the filtered result it was built from.
    pub rows: usize,
}

impl ExportIntent {
    fn new(format: ExportFormat, amount: DataAmount, filtered: usize) -> Self {
        let row_cap = amount.row_cap();
        Self {
            format,
            row_cap,
            rows: row_cap.map_or(filtered, |cap| std::cmp::min(cap, filtered)),
        }
    }
}

impl fmt::Display for ExportIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row_cap {
            Some(cap) => write!(f, "{} (first {} rows, {} exported)", self.format, cap, self.rows),
            None => write!(f, "{} (all {} rows)", self.format, self.rows),
        }
    }
}

pub const SELECT_FORMAT_NOTICE: &str = "Select at least one format";

/// "Download" dialog state: chosen formats and data amount.
#[derive(Debug)]
pub struct ExportDialog {
    formats: BTreeSet<ExportFormat>,
    amount: DataAmount,
    row_limit: usize,
    curser: usize,
}

impl ExportDialog {
    pub fn new(row_limit: usize) -> Self {
        Self {
            formats: BTreeSet::from([ExportFormat::Excel]),
            amount: DataAmount::All,
            row_limit,
            curser: 0,
        }
    }

    /// Puts the curser back on the first row. Selections survive between openings.
    pub fn open(&mut self) {
        self.curser = 0;
    }

    pub fn is_selected(&self, format: ExportFormat) -> bool {
        self.formats.contains(&format)
    }

    pub fn amount(&self) -> DataAmount {
        self.amount
    }

    pub fn row_limit(&self) -> usize {
        self.row_limit
    }

    pub fn toggle_format(&mut self, format: ExportFormat) {
        if !self.formats.remove(&format) {
            self.formats.insert(format);
        }
    }

    pub fn select_all(&mut self) {
        self.formats.extend(ExportFormat::ALL);
    }

    pub fn deselect_all(&mut self) {
        self.formats.clear();
    }

    pub fn set_limited(&mut self, limited: bool) {
        self.amount = if limited {
            DataAmount::Limited(self.row_limit)
        } else {
            DataAmount::All
        };
    }

    pub fn can_download(&self) -> bool {
        !self.formats.is_empty()
    }

    /// Dialog rows: the four formats followed by the two data amount options.
    pub const ROWS: usize = ExportFormat::ALL.len() + 2;

    pub fn curser(&self) -> usize {
        self.curser
    }

    pub fn move_up(&mut self) {
        self.curser = self.curser.saturating_sub(1);
    }

    pub fn move_down(&mut self) {
        self.curser = std::cmp::min(self.curser + 1, Self::ROWS - 1);
    }

    pub fn toggle_selected(&mut self) {
        match ExportFormat::ALL.get(self.curser) {
            Some(&format) => self.toggle_format(format),
            None => self.set_limited(self.curser == Self::ROWS - 1),
        }
    }

    /// One intent per selected format, all sharing the data amount.
    pub fn confirm(&mut self, filtered: usize) -> Result<Vec<ExportIntent>, &'static str> {
        if !self.can_download() {
            return Err(SELECT_FORMAT_NOTICE);
        }
        let intents: Vec<ExportIntent> = self
            .formats
            .iter()
            .map(|&format| ExportIntent::new(format, self.amount, filtered))
            .collect();
        for intent in intents.iter() {
            info!("Export requested: {intent}");
        }
        Ok(intents)
    }
}

/// The table's "Download CSV" shortcut.
pub fn quick_csv(filtered: usize) -> ExportIntent {
    let intent = ExportIntent::new(ExportFormat::Csv, DataAmount::All, filtered);
    info!("Export requested: {intent}");
    intent
}
