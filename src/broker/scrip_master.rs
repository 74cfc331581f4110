/// Scrip master parsing (JSON and CSV) into a symbol -> token map
use tracing::debug;

use crate::broker::token_map::TokenMap;
use crate::error::Result;
use crate::types::ScripRecord;

/// Wire format of a scrip master download
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScripFormat {
    Json,
    Csv,
}

impl ScripFormat {
    /// Pick the format from the URL suffix; anything that is not `.json` is CSV
    pub fn from_url(url: &str) -> Self {
        if url.to_ascii_lowercase().ends_with(".json") {
            ScripFormat::Json
        } else {
            ScripFormat::Csv
        }
    }

    /// File name the raw download is kept under in the data directory
    pub fn raw_file_name(&self) -> &str {
        match self {
            ScripFormat::Json => "OpenAPIScripMaster.json",
            ScripFormat::Csv => "OpenAPIScripMaster.csv",
        }
    }
}

/// Parse the broker's JSON array of instrument records
pub fn parse_json(raw: &[u8]) -> Result<Vec<ScripRecord>> {
    let records: Vec<ScripRecord> = serde_json::from_slice(raw)?;
    debug!("Parsed {} JSON scrip records", records.len());
    Ok(records)
}

/// Parse a header-driven CSV scrip master
///
/// Columns are located by header name, so column order does not matter.
/// Missing columns read as empty strings.
pub fn parse_csv(raw: &[u8]) -> Result<Vec<ScripRecord>> {
    let text = String::from_utf8_lossy(raw);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim_start_matches('\u{feff}').trim().eq_ignore_ascii_case(name))
    };
    let token_col = column("token");
    let symbol_col = column("symbol");
    let name_col = column("name");
    let exch_col = column("exch_seg");
    let type_col = column("instrumenttype");

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let field = |col: Option<usize>| {
            col.and_then(|i| row.get(i)).unwrap_or("").trim().to_string()
        };
        records.push(ScripRecord {
            token: field(token_col),
            symbol: field(symbol_col),
            name: field(name_col),
            exch_seg: field(exch_col),
            instrumenttype: field(type_col),
        });
    }

    debug!("Parsed {} CSV scrip records", records.len());
    Ok(records)
}

/// Keep records of one exchange segment that carry both symbol and token
///
/// Symbols and tokens are stored trimmed, for JSON records as well as CSV
/// rows, so a padded `" TCS-EQ"` in the download maps as `TCS-EQ`. Later
/// duplicates of a symbol overwrite earlier ones.
pub fn build_token_map<I>(records: I, exchange_segment: &str) -> TokenMap
where
    I: IntoIterator<Item = ScripRecord>,
{
    let segment = exchange_segment.trim();
    let mut map = TokenMap::new();

    for record in records {
        let symbol = record.symbol.trim();
        let token = record.token.trim();
        if symbol.is_empty() || token.is_empty() {
            continue;
        }
        if record.exch_seg.trim().eq_ignore_ascii_case(segment) {
            map.insert(symbol.to_string(), token.to_string());
        }
    }

    map
}

/// Parse raw bytes in the given format and build the filtered map
pub fn parse_token_map(raw: &[u8], format: ScripFormat, exchange_segment: &str) -> Result<TokenMap> {
    let records = match format {
        ScripFormat::Json => parse_json(raw)?,
        ScripFormat::Csv => parse_csv(raw)?,
    };
    Ok(build_token_map(records, exchange_segment))
}
