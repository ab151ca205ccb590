use std::fmt;
use std::io::Error;

use derive_setters::Setters;
use polars::error::PolarsError;
use ratatui::crossterm::event::KeyEvent;

use crate::columns::RecordShape;
use crate::pagination::PageSize;

#[derive(Debug)]
pub enum DashError {
    IoError(Error),
    PolarsError(PolarsError),
    LoadingFailed(String),
    FileNotFound,
    PermissionDenied,
    UnknownFileType,
    MissingField { record: usize, field: String },
    DuplicateColumn(String),
}

impl fmt::Display for DashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DashError::IoError(e) => write!(f, "I/O error: {e}"),
            DashError::PolarsError(e) => write!(f, "Data error: {e}"),
            DashError::LoadingFailed(msg) => write!(f, "Loading failed: {msg}"),
            DashError::FileNotFound => write!(f, "File not found"),
            DashError::PermissionDenied => write!(f, "Permission denied"),
            DashError::UnknownFileType => write!(f, "Unknown file type (expected csv, parquet or arrow)"),
            DashError::MissingField { record, field } => {
                write!(f, "Record {record} has no value for column \"{field}\"")
            }
            DashError::DuplicateColumn(id) => write!(f, "Column \"{id}\" is defined twice"),
        }
    }
}

impl std::error::Error for DashError {}

impl From<Error> for DashError {
    fn from(err: Error) -> Self {
        DashError::IoError(err)
    }
}

impl From<PolarsError> for DashError {
    fn from(err: PolarsError) -> Self {
        DashError::PolarsError(err)
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct DashConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub page_size: PageSize,
    pub shape: RecordShape,
    pub mock_rows: usize,
    pub seed: u64,
    pub export_row_limit: usize,
    pub download_delay_ms: u64,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 32,
            page_size: PageSize::Ten,
            shape: RecordShape::Normal,
            mock_rows: 50,
            seed: 2025,
            export_row_limit: 5000,
            download_delay_ms: 1500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Quit,
    Help,
    Exit,
    Enter,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    FirstPage,
    PrevPage,
    NextPage,
    LastPage,
    CyclePageSize,
    ToggleShape,
    Operators,
    Columns,
    Export,
    Schedules,
    Reports,
    Toggle,
    SelectAll,
    DeselectAll,
    ClearOperators,
    Apply,
    Save,
    TestNow,
    New,
    Edit,
    Delete,
    DownloadExcel,
    DownloadPdf,
    QuickCsv,
    CopyCell,
    CopyRow,
    Resize(usize, usize),
    RawKey(KeyEvent),
}

pub const HELP_TEXT: &str = "\
Transactions
  j/k ↑/↓      move row          h/l ←/→      scroll columns
  n/p          next/prev page    g/G          first/last page
  z            rows per page     t            normal / reservation
  o            operator filter   c            column settings
  e            download dialog   d            download CSV
  s            schedule delivery r            reports
  y / Y        copy cell / row   ?            help
  q            quit

Operators     space toggle, x clear all, esc close
Columns       space toggle, a apply, esc cancel
Download      space toggle, a select all, A deselect all, enter download
Schedules     n new, e/enter edit, D delete | in form: enter edit field,
              ←/→ change option, ctrl-s save, ctrl-t test now, esc cancel
Reports       ←/→ month, x excel, p pdf, esc close";
