//! CSV, Excel and JSON codec for delivery lists.
//!
//! # Output formats
//!
//! - CSV: header `名前,住所,ステータス,配送日`, every field quoted, status as
//!   its Japanese label. UTF-8 (optional BOM) or Shift_JIS.
//! - Excel: one worksheet `配送一覧` with a bold header row.
//! - JSON: pretty-printed array of full records.
//!
//! # Import
//!
//! [`parse_csv`] accepts what [`to_csv`] writes, plus English headers and
//! canonical status codes. Validation errors are collected per line instead
//! of aborting the whole file.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDateTime;
use csv::{QuoteStyle, ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use encoding_rs::SHIFT_JIS;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use delivery_tracker_core::{DateError, Delivery, DeliveryDate, DeliveryStatus, NewDelivery};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const SHEET_NAME: &str = "配送一覧";

/// Errors that can occur while encoding an export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("csv buffer error: {0}")]
    Buffer(String),

    #[error("excel error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The text contains a character Shift_JIS cannot represent.
    #[error("character {0:?} cannot be encoded as Shift_JIS")]
    Unmappable(char),
}

/// Text encoding of a CSV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextEncoding {
    #[default]
    Utf8,
    ShiftJis,
}

impl FromStr for TextEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "shift_jis" | "shift-jis" | "sjis" => Ok(Self::ShiftJis),
            other => Err(format!("unknown encoding: {other}")),
        }
    }
}

/// Field separator of a CSV file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    #[default]
    Comma,
    Tab,
    Semicolon,
}

impl Delimiter {
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        match self {
            Self::Comma => b',',
            Self::Tab => b'\t',
            Self::Semicolon => b';',
        }
    }

    /// Pick the separator that occurs most often outside quotes in `line`.
    /// Ties and lines without any separator resolve to a comma.
    fn detect(line: &str) -> Self {
        let (mut commas, mut tabs, mut semicolons) = (0usize, 0usize, 0usize);
        let mut in_quotes = false;
        for ch in line.chars() {
            match ch {
                '"' => in_quotes = !in_quotes,
                ',' if !in_quotes => commas += 1,
                '\t' if !in_quotes => tabs += 1,
                ';' if !in_quotes => semicolons += 1,
                _ => {}
            }
        }

        if tabs > commas && tabs >= semicolons {
            Self::Tab
        } else if semicolons > commas && semicolons > tabs {
            Self::Semicolon
        } else {
            Self::Comma
        }
    }
}

impl FromStr for Delimiter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "comma" | "," => Ok(Self::Comma),
            "tab" | "\t" => Ok(Self::Tab),
            "semicolon" | ";" => Ok(Self::Semicolon),
            other => Err(format!("unknown delimiter: {other}")),
        }
    }
}

/// How to write a CSV export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExportOptions {
    pub encoding: TextEncoding,
    pub delimiter: Delimiter,
    /// Prefix a UTF-8 BOM. Ignored for Shift_JIS.
    pub include_bom: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            encoding: TextEncoding::Utf8,
            delimiter: Delimiter::Comma,
            include_bom: true,
        }
    }
}

/// How to read a CSV import. `None` means detect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportOptions {
    pub encoding: Option<TextEncoding>,
    pub delimiter: Option<Delimiter>,
}

/// Result of parsing a CSV import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOutcome {
    /// Rows that passed validation, in file order.
    pub data: Vec<NewDelivery>,
    /// One message per failed check, prefixed with the line number.
    pub errors: Vec<String>,
}

impl ParseOutcome {
    /// Whether every row was valid.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn failed(message: String) -> Self {
        Self {
            data: Vec::new(),
            errors: vec![message],
        }
    }
}

// =============================================================================
// Export
// =============================================================================

/// Encode deliveries as CSV.
///
/// # Errors
///
/// Returns `ExportError::Unmappable` if Shift_JIS output is requested and a
/// field contains a character outside that character set.
pub fn to_csv(deliveries: &[Delivery], options: &ExportOptions) -> Result<Vec<u8>, ExportError> {
    let mut writer = WriterBuilder::new()
        .delimiter(options.delimiter.as_byte())
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(Column::ALL.map(Column::header))?;
    for delivery in deliveries {
        writer.write_record([
            delivery.name.as_str(),
            delivery.address.as_str(),
            delivery.status.label(),
            delivery.delivery_date.as_str(),
        ])?;
    }

    let utf8 = writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.to_string()))?;

    match options.encoding {
        TextEncoding::Utf8 if options.include_bom => {
            let mut out = Vec::with_capacity(UTF8_BOM.len() + utf8.len());
            out.extend_from_slice(UTF8_BOM);
            out.extend_from_slice(&utf8);
            Ok(out)
        }
        TextEncoding::Utf8 => Ok(utf8),
        TextEncoding::ShiftJis => {
            let text = String::from_utf8(utf8).map_err(|e| ExportError::Buffer(e.to_string()))?;
            encode_shift_jis(&text)
        }
    }
}

fn encode_shift_jis(text: &str) -> Result<Vec<u8>, ExportError> {
    let (encoded, _, had_errors) = SHIFT_JIS.encode(text);
    if !had_errors {
        return Ok(encoded.into_owned());
    }

    let mut buf = [0u8; 4];
    let culprit = text
        .chars()
        .find(|ch| SHIFT_JIS.encode(ch.encode_utf8(&mut buf)).2)
        .unwrap_or(char::REPLACEMENT_CHARACTER);
    Err(ExportError::Unmappable(culprit))
}

/// Encode deliveries as an Excel workbook.
///
/// # Errors
///
/// Returns `ExportError::Xlsx` if the workbook cannot be built.
pub fn to_xlsx(deliveries: &[Delivery]) -> Result<Vec<u8>, ExportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    let headers = ["ID", "名前", "住所", "ステータス", "配送日"];
    let widths = [18.0, 20.0, 40.0, 12.0, 12.0];
    for ((col, header), width) in (0u16..).zip(headers).zip(widths) {
        worksheet.write_string_with_format(0, col, header, &bold)?;
        worksheet.set_column_width(col, width)?;
    }

    for (row, delivery) in (1u32..).zip(deliveries) {
        worksheet.write_string(row, 0, delivery.id.as_str())?;
        worksheet.write_string(row, 1, &delivery.name)?;
        worksheet.write_string(row, 2, &delivery.address)?;
        worksheet.write_string(row, 3, delivery.status.label())?;
        worksheet.write_string(row, 4, delivery.delivery_date.as_str())?;
    }

    Ok(workbook.save_to_buffer()?)
}

/// Encode deliveries as pretty JSON, ids included.
///
/// # Errors
///
/// Returns `ExportError::Json` if serialization fails.
pub fn to_json(deliveries: &[Delivery]) -> Result<Vec<u8>, ExportError> {
    Ok(serde_json::to_vec_pretty(deliveries)?)
}

/// Download file name: `<prefix>_<YYYYMMDD_HHMMSS>.<ext>`.
#[must_use]
pub fn export_filename(prefix: &str, ext: &str, now: NaiveDateTime) -> String {
    format!("{prefix}_{}.{ext}", now.format("%Y%m%d_%H%M%S"))
}

// =============================================================================
// Import
// =============================================================================

/// Columns of the delivery CSV layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Name,
    Address,
    Status,
    DeliveryDate,
}

impl Column {
    const ALL: [Self; 4] = [Self::Name, Self::Address, Self::Status, Self::DeliveryDate];

    const fn header(self) -> &'static str {
        match self {
            Self::Name => "名前",
            Self::Address => "住所",
            Self::Status => "ステータス",
            Self::DeliveryDate => "配送日",
        }
    }

    const fn field(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Address => "address",
            Self::Status => "status",
            Self::DeliveryDate => "deliveryDate",
        }
    }

    /// "名前 (name)", as used in error messages.
    fn describe(self) -> String {
        format!("{} ({})", self.header(), self.field())
    }

    fn from_header(cell: &str) -> Option<Self> {
        let cell = cell.trim().trim_start_matches('\u{feff}');
        let lower = cell.to_ascii_lowercase();
        Self::ALL.into_iter().find(|c| {
            cell == c.header()
                || lower == c.field().to_ascii_lowercase()
                || (*c == Self::DeliveryDate && lower == "delivery_date")
        })
    }
}

/// Parse CSV bytes into validated delivery payloads.
///
/// The first non-blank line is the header. Line numbers in messages count
/// from 1 at the header.
#[must_use]
pub fn parse_csv(bytes: &[u8], options: &ImportOptions) -> ParseOutcome {
    let Some(text) = decode(bytes, options.encoding) else {
        return ParseOutcome::failed(
            "ファイルの文字コードを読み取れません (encoding)".to_string(),
        );
    };

    let first_line = text.lines().find(|l| !l.trim().is_empty()).unwrap_or("");
    let delimiter = options
        .delimiter
        .unwrap_or_else(|| Delimiter::detect(first_line));

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut columns: Option<HashMap<Column, usize>> = None;
    let mut outcome = ParseOutcome::default();

    for (index, result) in reader.records().enumerate() {
        let fallback_line = u64::try_from(index).unwrap_or(u64::MAX).saturating_add(1);
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                let line = e.position().map_or(fallback_line, csv::Position::line);
                outcome.errors.push(format!("行 {line}: CSVの形式が不正です ({e})"));
                continue;
            }
        };
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let line = record.position().map_or(fallback_line, csv::Position::line);

        match &columns {
            None => match map_header(&record) {
                Ok(map) => columns = Some(map),
                Err(missing) => return ParseOutcome::failed(format!(
                    "行 {line}: 必須の列がありません: {missing}"
                )),
            },
            Some(map) => match validate_row(&record, map, line) {
                Ok(new) => outcome.data.push(new),
                Err(mut errors) => outcome.errors.append(&mut errors),
            },
        }
    }

    if columns.is_none() {
        return ParseOutcome::failed("行 1: ヘッダー行がありません".to_string());
    }

    outcome
}

/// Strip a UTF-8 BOM and decode. With no explicit encoding, valid UTF-8 wins
/// and anything else is read as Shift_JIS.
fn decode(bytes: &[u8], encoding: Option<TextEncoding>) -> Option<String> {
    let (body, has_bom) = bytes
        .strip_prefix(UTF8_BOM)
        .map_or((bytes, false), |rest| (rest, true));

    let encoding = encoding.unwrap_or_else(|| {
        if has_bom || std::str::from_utf8(body).is_ok() {
            TextEncoding::Utf8
        } else {
            TextEncoding::ShiftJis
        }
    });

    match encoding {
        TextEncoding::Utf8 => std::str::from_utf8(body).ok().map(str::to_owned),
        TextEncoding::ShiftJis => {
            let (text, had_errors) = SHIFT_JIS.decode_without_bom_handling(body);
            (!had_errors).then(|| text.into_owned())
        }
    }
}

fn map_header(record: &StringRecord) -> Result<HashMap<Column, usize>, String> {
    let mut map = HashMap::new();
    for (index, cell) in record.iter().enumerate() {
        if let Some(column) = Column::from_header(cell) {
            map.entry(column).or_insert(index);
        }
    }

    let missing: Vec<String> = Column::ALL
        .into_iter()
        .filter(|c| !map.contains_key(c))
        .map(Column::describe)
        .collect();

    if missing.is_empty() {
        Ok(map)
    } else {
        Err(missing.join(", "))
    }
}

fn validate_row(
    record: &StringRecord,
    columns: &HashMap<Column, usize>,
    line: u64,
) -> Result<NewDelivery, Vec<String>> {
    let cell = |column: Column| {
        columns
            .get(&column)
            .and_then(|i| record.get(*i))
            .unwrap_or("")
    };

    // Name and address are stored as written; only the blank check trims.
    let mut errors = Vec::new();
    let mut required = |column: Column| {
        let value = cell(column);
        if value.trim().is_empty() {
            errors.push(format!("行 {line}: {} は必須です", column.describe()));
        }
        value
    };

    let name = required(Column::Name);
    let address = required(Column::Address);
    let raw_status = required(Column::Status).trim();
    let raw_date = required(Column::DeliveryDate).trim();

    let status = if raw_status.is_empty() {
        None
    } else {
        DeliveryStatus::parse_code_or_label(raw_status)
            .map_err(|_| {
                errors.push(format!(
                    "行 {line}: {} が不正です: {raw_status}",
                    Column::Status.describe()
                ));
            })
            .ok()
    };

    let date = if raw_date.is_empty() {
        None
    } else {
        DeliveryDate::parse(raw_date)
            .map_err(|e| {
                let problem = match e {
                    DateError::Format(_) => "はYYYY-MM-DD形式で入力してください",
                    DateError::Nonexistent(_) => "が存在しない日付です",
                };
                errors.push(format!(
                    "行 {line}: {} {problem}: {raw_date}",
                    Column::DeliveryDate.describe()
                ));
            })
            .ok()
    };

    match (status, date) {
        (Some(status), Some(delivery_date)) if errors.is_empty() => Ok(NewDelivery {
            name: name.to_string(),
            address: address.to_string(),
            status,
            delivery_date,
        }),
        _ => Err(errors),
    }
}
