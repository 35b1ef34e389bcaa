use calamine::{open_workbook, Reader, Xlsx};
use log::info;
use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const NAME_COLUMN: &str = "Name";
pub const REGISTRATION_COLUMN: &str = "Registration No.";
pub const ADDRESS_COLUMN: &str = "Address";

#[derive(Debug, Error)]
pub enum InputError {
    #[error("input file {0:?} does not exist")]
    FileMissing(PathBuf),
    #[error("input is missing the required column '{0}'")]
    MissingColumn(&'static str),
    #[error("could not read input file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not parse CSV input: {0}")]
    Csv(#[from] csv::Error),
    #[error("could not open Excel workbook: {0}")]
    Excel(#[from] calamine::XlsxError),
    #[error("Excel workbook has no worksheets")]
    NoWorksheet,
}

/// One input row. Only `name` is read by the pipeline; the other fields
/// pass through to the results untouched.
#[derive(Debug, Clone)]
pub struct EntityRecord {
    pub name: String,
    pub registration_no: Option<String>,
    pub address: Option<String>,
}

struct ColumnMap {
    name: usize,
    registration_no: Option<usize>,
    address: Option<usize>,
}

impl ColumnMap {
    /// A bare `Name` file is accepted; once any auxiliary column appears,
    /// all three are required.
    fn from_headers(headers: &[String]) -> Result<Self, InputError> {
        let find = |wanted: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(wanted))
        };

        let name = find(NAME_COLUMN).ok_or(InputError::MissingColumn(NAME_COLUMN))?;
        let registration_no = find(REGISTRATION_COLUMN);
        let address = find(ADDRESS_COLUMN);

        match (registration_no, address) {
            (Some(_), None) => Err(InputError::MissingColumn(ADDRESS_COLUMN)),
            (None, Some(_)) => Err(InputError::MissingColumn(REGISTRATION_COLUMN)),
            _ => Ok(ColumnMap {
                name,
                registration_no,
                address,
            }),
        }
    }

    fn name_only(&self) -> bool {
        self.registration_no.is_none() && self.address.is_none()
    }
}

/// Loads entity records from a CSV or Excel file, dispatching on the
/// extension. Validation failures here are fatal to the whole batch.
pub fn load_records<P: AsRef<Path>>(filename: P) -> Result<Vec<EntityRecord>, InputError> {
    let path = filename.as_ref();
    if !path.exists() {
        return Err(InputError::FileMissing(path.to_path_buf()));
    }

    let is_excel = path
        .extension()
        .map_or(false, |ext| ext == "xlsx" || ext == "xls");

    let records = if is_excel {
        load_excel(path)?
    } else {
        load_csv(path)?
    };

    info!("Loaded {} records from {:?}", records.len(), path);
    Ok(records)
}

fn load_csv(path: &Path) -> Result<Vec<EntityRecord>, InputError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(File::open(path)?);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut rows = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cell = |idx: usize| row.get(idx).unwrap_or("").trim().to_string();
        rows.push(EntityRecord {
            name: cell(columns.name),
            registration_no: columns.registration_no.map(cell),
            address: columns.address.map(cell),
        });
    }

    Ok(finish(rows, columns.name_only()))
}

fn load_excel(path: &Path) -> Result<Vec<EntityRecord>, InputError> {
    let mut workbook: Xlsx<_> = open_workbook(path)?;
    let worksheets = workbook.worksheets();
    let (_, range) = worksheets.first().ok_or(InputError::NoWorksheet)?;

    let mut iter = range.rows();
    let headers: Vec<String> = iter
        .next()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .unwrap_or_default();
    let columns = ColumnMap::from_headers(&headers)?;

    let mut rows = Vec::new();
    for row in iter {
        let cell = |idx: usize| {
            row.get(idx)
                .map(|c| c.to_string().trim().to_string())
                .unwrap_or_default()
        };
        rows.push(EntityRecord {
            name: cell(columns.name),
            registration_no: columns.registration_no.map(cell),
            address: columns.address.map(cell),
        });
    }

    Ok(finish(rows, columns.name_only()))
}

/// Drops nameless rows; the historical name-only input shape is also
/// deduplicated by name, keeping first occurrences.
fn finish(rows: Vec<EntityRecord>, dedup: bool) -> Vec<EntityRecord> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter(|r| !r.name.is_empty())
        .filter(|r| !dedup || seen.insert(r.name.clone()))
        .collect()
}
