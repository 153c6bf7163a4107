use crate::config::SheetSettings;
use crate::core::access::AccessKey;
use crate::error::{Error, Result};
use chrono::Utc;
use reqwest::Client;
use tracing::{debug, info};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Everything the remote key sheet provides for one session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySheet {
    pub youtube_keys: Vec<String>,
    pub ai_keys: Vec<String>,
    pub access_keys: Vec<AccessKey>,
}

pub async fn fetch_key_sheet(http: &Client, settings: &SheetSettings) -> Result<KeySheet> {
    let url = cache_busted(&settings.url, Utc::now().timestamp_millis());
    debug!("fetching key sheet");

    let response = http.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(Error::Configuration(format!(
            "Failed to fetch the key sheet: HTTP {status}"
        )));
    }

    let text = response.text().await?;
    let sheet = parse_key_sheet(&text, &settings.youtube_column, &settings.ai_column)?;
    info!(
        youtube = sheet.youtube_keys.len(),
        ai = sheet.ai_keys.len(),
        access = sheet.access_keys.len(),
        "key sheet loaded"
    );
    Ok(sheet)
}

fn cache_busted(url: &str, millis: i64) -> String {
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}_={millis}")
}

/// Parse the CSV export of the key sheet.
///
/// API key columns are found by exact header name (case-insensitive); a
/// missing API column just yields no keys. The access key and expiry columns
/// are found by keyword so both English and Vietnamese headers work, and a
/// sheet with content but without them is a configuration error.
pub fn parse_key_sheet(text: &str, youtube_header: &str, ai_header: &str) -> Result<KeySheet> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let lowered = text.trim_start().to_ascii_lowercase();
    if lowered.starts_with("<!doctype html") || lowered.starts_with("<html") {
        return Err(Error::Configuration(
            "The key sheet returned HTML instead of CSV; make sure it is shared publicly".into(),
        ));
    }

    let rows = read_rows(text)?;
    let Some(header_index) = rows.iter().position(|row| !is_blank(row)) else {
        return Ok(KeySheet::default());
    };
    let headers = &rows[header_index];
    let data = &rows[header_index + 1..];

    let youtube_keys = column_values(headers, data, youtube_header);
    let ai_keys = column_values(headers, data, ai_header);
    let access_keys = access_keys(headers, data)?;

    Ok(KeySheet {
        youtube_keys,
        ai_keys,
        access_keys,
    })
}

fn read_rows(text: &str) -> Result<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}

fn is_blank(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

fn column_values(headers: &[String], data: &[Vec<String>], name: &str) -> Vec<String> {
    let wanted = sanitize_header(name);
    let Some(index) = headers
        .iter()
        .position(|header| sanitize_header(header) == wanted)
    else {
        debug!(column = name, "column not present in key sheet");
        return Vec::new();
    };

    data.iter()
        .filter_map(|row| row.get(index))
        .map(|cell| cell.trim())
        .filter(|cell| !cell.is_empty())
        .map(str::to_string)
        .collect()
}

fn access_keys(headers: &[String], data: &[Vec<String>]) -> Result<Vec<AccessKey>> {
    let sanitized: Vec<String> = headers.iter().map(|header| sanitize_header(header)).collect();

    let key_index = sanitized
        .iter()
        .position(|h| (h.contains("key") || h.contains("khoa")) && !h.contains("api"));
    let expiry_index = sanitized
        .iter()
        .position(|h| h.contains("exp") || (h.contains("het") && h.contains("han")));

    let (Some(key_index), Some(expiry_index)) = (key_index, expiry_index) else {
        return Err(Error::Configuration(format!(
            "Could not find the 'Key' and 'Expiration date' columns in the key sheet. Columns found: [{}]",
            headers.join(", ")
        )));
    };

    Ok(data
        .iter()
        .filter(|row| !is_blank(row))
        .filter_map(|row| {
            let key = row.get(key_index)?.trim();
            let expiry = row.get(expiry_index)?.trim();
            (!key.is_empty() && !expiry.is_empty()).then(|| AccessKey {
                key: key.to_string(),
                expiration_date: expiry.to_string(),
            })
        })
        .collect())
}

/// Lowercase with diacritics removed, so `Ngày hết hạn` matches `het`/`han`.
pub fn sanitize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SHEET: &str = "\u{feff}API Key Youtube,API Key AI,Key,Expiration date\n\
yt-1,ai-1,alpha,31/12/2099\n\
yt-2,,beta,01/01/2000\n\
,ai-2,,\n";

    fn access(key: &str, date: &str) -> AccessKey {
        AccessKey {
            key: key.into(),
            expiration_date: date.into(),
        }
    }

    #[test]
    fn headers_lose_case_and_diacritics() {
        assert_eq!(sanitize_header("  Ngày Hết Hạn "), "ngay het han");
        assert_eq!(sanitize_header("Khóa"), "khoa");
    }

    #[test]
    fn parses_every_column() {
        let sheet = parse_key_sheet(SHEET, "API Key Youtube", "API Key AI").unwrap();
        assert_eq!(
            sheet,
            KeySheet {
                youtube_keys: vec!["yt-1".into(), "yt-2".into()],
                ai_keys: vec!["ai-1".into(), "ai-2".into()],
                access_keys: vec![access("alpha", "31/12/2099"), access("beta", "01/01/2000")],
            }
        );
    }

    #[test]
    fn vietnamese_headers_and_leading_blank_rows() {
        let text = ",,\nAPI Key Youtube,Khóa,Ngày hết hạn\nyt,\"k,1\",05/06/2030\n";
        let sheet = parse_key_sheet(text, "api key youtube", "API Key AI").unwrap();

        assert_eq!(sheet.youtube_keys, vec!["yt".to_string()]);
        assert!(sheet.ai_keys.is_empty());
        assert_eq!(sheet.access_keys, vec![access("k,1", "05/06/2030")]);
    }

    #[test]
    fn api_key_columns_match_without_case_or_accents() {
        let text = "API KEY YOUTUBÉ,Khóa API AI,Key,Expiration date\nyt,ai,alpha,31/12/2099\n";
        let sheet = parse_key_sheet(text, "API Key Youtube", "khoa api ai").unwrap();
        assert_eq!(sheet.youtube_keys, vec!["yt"]);
        assert_eq!(sheet.ai_keys, vec!["ai"]);
    }

    #[test]
    fn missing_access_columns_is_a_configuration_error() {
        let err = parse_key_sheet("API Key Youtube\nyt\n", "API Key Youtube", "AI").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains("API Key Youtube"));
    }

    #[test]
    fn html_bodies_are_rejected() {
        let err = parse_key_sheet("<!DOCTYPE html><html></html>", "a", "b").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn empty_sheet_has_no_keys() {
        assert_eq!(parse_key_sheet("", "a", "b").unwrap(), KeySheet::default());
    }

    #[test]
    fn cache_buster_is_appended() {
        assert_eq!(
            cache_busted("https://x/export?format=csv", 42),
            "https://x/export?format=csv&_=42"
        );
        assert_eq!(cache_busted("https://x/keys.csv", 7), "https://x/keys.csv?_=7");
    }
}
