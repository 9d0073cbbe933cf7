use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, error};

use super::{RecordStore, Row, StoreError, StoreResult, Table};
use crate::external::google::GoogleAuth;

const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Google Sheets backend: one worksheet per [`Table`] in a single
/// spreadsheet. Request timeouts come from the shared `reqwest::Client`.
pub struct SheetsStore {
    spreadsheet_id: String,
    auth: Arc<GoogleAuth>,
    http: reqwest::Client,
}

impl SheetsStore {
    pub fn new(spreadsheet_id: String, auth: Arc<GoogleAuth>, http: reqwest::Client) -> Self {
        Self {
            spreadsheet_id,
            auth,
            http,
        }
    }

    fn values_url(&self, range: &str) -> StoreResult<Url> {
        let mut url = Url::parse(SHEETS_API).map_err(|e| StoreError::unavailable(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::unavailable("sheets api url cannot be a base"))?
            .push(&self.spreadsheet_id)
            .push("values")
            .push(range);
        Ok(url)
    }

    async fn request(&self, method: Method, url: Url) -> StoreResult<RequestBuilder> {
        let token = self
            .auth
            .access_token()
            .await
            .map_err(|e| StoreError::unavailable(e.to_string()))?;
        Ok(self.http.request(method, url).bearer_auth(token))
    }
}

fn sheet_range(table: Table) -> String {
    format!("'{}'", table)
}

/// A1 column letters for a 1-based column index.
fn column_letter(mut column: usize) -> String {
    let mut letters = Vec::new();
    while column > 0 {
        let rem = (column - 1) % 26;
        letters.push(b'A' + rem as u8);
        column = (column - 1) / 26;
    }
    letters.reverse();
    String::from_utf8_lossy(&letters).into_owned()
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn transport(table: Table, op: &'static str) -> impl Fn(reqwest::Error) -> StoreError {
    move |e| {
        let reason = if e.is_timeout() {
            format!("{op} on {table} timed out")
        } else {
            format!("{op} on {table}: {e}")
        };
        error!(%table, op, error = %e, "Sheets request failed");
        StoreError::unavailable(reason)
    }
}

#[async_trait]
impl RecordStore for SheetsStore {
    async fn read_all(&self, table: Table) -> StoreResult<Vec<Row>> {
        let url = self.values_url(&sheet_range(table))?;
        let body: ValueRange = self
            .request(Method::GET, url)
            .await?
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport(table, "read"))?
            .json()
            .await
            .map_err(transport(table, "decode"))?;

        debug!(%table, rows = body.values.len(), "Read sheet");

        Ok(body
            .values
            .into_iter()
            .map(|cells| Row(cells.into_iter().map(cell_text).collect()))
            .collect())
    }

    async fn append_row(&self, table: Table, row: Row) -> StoreResult<()> {
        let mut url = self.values_url(&format!("{}:append", sheet_range(table)))?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", "RAW")
            .append_pair("insertDataOption", "INSERT_ROWS");

        self.request(Method::POST, url)
            .await?
            .json(&json!({ "values": [row.cells()] }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport(table, "append"))?;

        debug!(%table, "Appended row");
        Ok(())
    }

    async fn update_cell(
        &self,
        table: Table,
        row_index: usize,
        column: usize,
        value: &str,
    ) -> StoreResult<()> {
        if row_index == 0 || column == 0 {
            return Err(StoreError::unavailable("row and column are 1-based"));
        }
        let range = format!("{}!{}{}", sheet_range(table), column_letter(column), row_index);
        let mut url = self.values_url(&range)?;
        url.query_pairs_mut().append_pair("valueInputOption", "RAW");

        self.request(Method::PUT, url)
            .await?
            .json(&json!({ "range": range, "values": [[value]] }))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(transport(table, "update"))?;

        debug!(%table, row_index, column, "Updated cell");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letters() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(4), "D");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(53), "BA");
    }

    #[test]
    fn non_string_cells_are_stringified() {
        assert_eq!(cell_text(json!(42)), "42");
        assert_eq!(cell_text(Value::Null), "");
        assert_eq!(cell_text(json!("E100")), "E100");
    }
}
