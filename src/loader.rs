use polars::prelude::*;
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, error, info, instrument};
use tracing_error::SpanTrace;

use crate::columns::{ColumnRegistry, RecordShape};
use crate::domain::DashError;
use crate::records::{OPERATOR_FIELD, Record, RecordStore};

#[derive(Debug, PartialEq)]
enum FileType {
    Csv,
    Parquet,
    Arrow,
}

#[derive(Debug)]
struct FileInfo {
    path: PathBuf,
    file_size: u64,
    file_type: FileType,
}

/// One data file column, every value rendered to a display string.
struct Column {
    name: String,
    data: Vec<String>,
}

/// Loads transactions of `shape` from a CSV, Parquet or Arrow file.
///
/// Every column is cast to strings on its own rayon task. The file needs a
/// `supplierValue` column and a column for every id of the shape's registry.
#[instrument(skip_all, fields(path = %path.display(), %shape))]
pub fn load_data_file(path: PathBuf, shape: RecordShape) -> Result<RecordStore, DashError> {
    let result = load(path, shape);
    if let Err(e) = &result {
        error!("Loading failed: {e}\n{}", SpanTrace::capture());
    }
    result
}

fn load(path: PathBuf, shape: RecordShape) -> Result<RecordStore, DashError> {
    let file_info = get_file_info(path)?;
    debug!("Loading {:?}", file_info);
    let frame = match file_info.file_type {
        FileType::Csv => load_csv(&file_info.path)?,
        FileType::Parquet => load_parquet(&file_info.path)?,
        FileType::Arrow => load_arrow(&file_info.path)?,
    };

    let start_time = Instant::now();
    let df = frame.collect()?;
    let columns: Vec<Column> = df
        .get_column_names()
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect::<Result<Vec<Column>, PolarsError>>()?;

    let records = into_records(columns)?;
    info!(
        "Loaded {} records ({} bytes) in {}ms",
        records.len(),
        file_info.file_size,
        start_time.elapsed().as_millis()
    );
    RecordStore::new(&ColumnRegistry::for_shape(shape)?, records)
}

fn into_records(columns: Vec<Column>) -> Result<Vec<Record>, DashError> {
    let operator = columns
        .iter()
        .position(|c| c.name == OPERATOR_FIELD)
        .ok_or_else(|| DashError::LoadingFailed(format!("missing \"{OPERATOR_FIELD}\" column")))?;
    let id = columns.iter().position(|c| c.name == "id");
    let nrows = columns.first().map_or(0, |c| c.data.len());

    let records = (0..nrows)
        .map(|row| {
            let fields: HashMap<String, String> = columns
                .iter()
                .map(|c| (c.name.clone(), c.data[row].clone()))
                .collect();
            let record_id = id
                .and_then(|idx| columns[idx].data[row].parse().ok())
                .unwrap_or(row + 1);
            Record::new(record_id, columns[operator].data[row].clone(), fields)
        })
        .collect();
    Ok(records)
}

fn load_column(df: &DataFrame, col_name: &str) -> Result<Column, PolarsError> {
    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    let data = series
        .into_iter()
        .map(|value| match value {
            Some(s) => s.replace("\r\n", " ↵ ").replace('\n', " ↵ "),
            None => String::new(),
        })
        .collect();

    Ok(Column {
        name: col_name.to_string(),
        data,
    })
}

fn detect_file_type(path: &Path) -> Result<FileType, DashError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::Csv),
        Some("PARQUET") | Some("PQ") => Ok(FileType::Parquet),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::Arrow),
        _ => Err(DashError::UnknownFileType),
    }
}

fn get_file_info(path: PathBuf) -> Result<FileInfo, DashError> {
    let metadata = fs::metadata(&path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => DashError::FileNotFound,
        ErrorKind::PermissionDenied => DashError::PermissionDenied,
        _ => DashError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(DashError::LoadingFailed("Not a file!".into()));
    }

    let file_type = detect_file_type(&path)?;

    Ok(FileInfo {
        path,
        file_size: metadata.len(),
        file_type,
    })
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
    }

    #[test]
    fn loads_normal_transactions_from_csv() {
        let store = load_data_file(fixture("transactions_01.csv"), RecordShape::Normal).unwrap();
        assert_eq!(store.len(), 6);

        let first = store.get(0).unwrap();
        assert_eq!(first.id, 101);
        assert_eq!(first.operator(), "stockholm");
        assert_eq!(first.cell("amount"), "€123.45");
        assert_eq!(first.cell("zoneCode"), "004711");
        assert_eq!(store.get(5).unwrap().cell("localTimeStart"), "");
    }

    #[test]
    fn csv_without_operator_column_fails() {
        match load_data_file(fixture("no_operator.csv"), RecordShape::Normal) {
            Err(DashError::LoadingFailed(msg)) => assert!(msg.contains(OPERATOR_FIELD)),
            other => panic!("unexpected result {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn wrong_shape_reports_the_missing_column() {
        match load_data_file(fixture("transactions_01.csv"), RecordShape::Reservation) {
            Err(DashError::MissingField { field, .. }) => assert_eq!(field, "micrositeId"),
            other => panic!("unexpected result {:?}", other.map(|s| s.len())),
        }
    }

    #[test]
    fn file_errors_are_classified() {
        assert!(matches!(
            load_data_file(fixture("does_not_exist.csv"), RecordShape::Normal),
            Err(DashError::FileNotFound)
        ));
        assert!(matches!(
            detect_file_type(Path::new("data.xlsx")),
            Err(DashError::UnknownFileType)
        ));
        assert_eq!(detect_file_type(Path::new("a.PQ")).unwrap(), FileType::Parquet);
        assert_eq!(detect_file_type(Path::new("a.feather")).unwrap(), FileType::Arrow);
    }
}
