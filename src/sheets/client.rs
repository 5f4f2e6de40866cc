use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::SyncError;
use crate::settings::SheetCredentials;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";
const SHEETS_API: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const CLIENT_AGENT: &str = "survey-collector/0.1";

/// The three spreadsheet operations the sync job needs.
pub trait SheetTarget {
    /// First row of the tab; empty when the sheet has no rows.
    fn read_header(&mut self) -> Result<Vec<String>, SyncError>;
    /// Overwrites the first row.
    fn write_header(&mut self, header: &[String]) -> Result<(), SyncError>;
    /// Appends a row after the last non-empty one.
    fn append_row(&mut self, row: &[String]) -> Result<(), SyncError>;
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Google Sheets REST client authenticated as a service account.
pub struct GoogleSheets {
    client: Client,
    credentials: SheetCredentials,
    token: Option<(String, DateTime<Utc>)>,
}

impl GoogleSheets {
    pub fn new(credentials: SheetCredentials) -> Result<Self, SyncError> {
        Ok(Self {
            client: Client::builder().build()?,
            credentials,
            token: None,
        })
    }

    fn signed_assertion(&self, now: DateTime<Utc>) -> Result<String, SyncError> {
        let claims = AssertionClaims {
            iss: &self.credentials.client_email,
            scope: SHEETS_SCOPE,
            aud: TOKEN_URL,
            iat: now.timestamp(),
            exp: (now + Duration::hours(1)).timestamp(),
        };
        let key = EncodingKey::from_rsa_pem(self.credentials.private_key.as_bytes())?;
        Ok(encode(&Header::new(Algorithm::RS256), &claims, &key)?)
    }

    fn access_token(&mut self) -> Result<String, SyncError> {
        let now = Utc::now();
        if let Some((token, expires)) = &self.token {
            if *expires > now + Duration::seconds(60) {
                return Ok(token.clone());
            }
        }
        let assertion = self.signed_assertion(now)?;
        let response = self
            .client
            .post(TOKEN_URL)
            .header(USER_AGENT, CLIENT_AGENT)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()?;
        let response = check_status(response)?;
        let token: TokenResponse = response.json()?;
        let expires = now + Duration::seconds(token.expires_in.unwrap_or(3600));
        self.token = Some((token.access_token.clone(), expires));
        Ok(token.access_token)
    }

    fn values_url(&self, range: &str, suffix: &str) -> String {
        format!(
            "{SHEETS_API}/{}/values/{}{suffix}",
            urlencoding::encode(&self.credentials.spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    fn first_cell(&self) -> String {
        format!("{}!A1", self.credentials.tab)
    }
}

fn check_status(
    response: reqwest::blocking::Response,
) -> Result<reqwest::blocking::Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().unwrap_or_default();
    Err(SyncError::Status {
        status: status.as_u16(),
        body,
    })
}

impl SheetTarget for GoogleSheets {
    fn read_header(&mut self) -> Result<Vec<String>, SyncError> {
        let token = self.access_token()?;
        let url = self.values_url(&format!("{}!A1:1", self.credentials.tab), "");
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, CLIENT_AGENT)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()?;
        let range: ValueRange = check_status(response)?.json()?;
        Ok(range
            .values
            .into_iter()
            .next()
            .map(|row| row.iter().map(cell_text).collect())
            .unwrap_or_default())
    }

    fn write_header(&mut self, header: &[String]) -> Result<(), SyncError> {
        let token = self.access_token()?;
        let url = self.values_url(&self.first_cell(), "?valueInputOption=RAW");
        let response = self
            .client
            .put(url)
            .header(USER_AGENT, CLIENT_AGENT)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(&json!({ "values": [header] }))
            .send()?;
        check_status(response)?;
        Ok(())
    }

    fn append_row(&mut self, row: &[String]) -> Result<(), SyncError> {
        let token = self.access_token()?;
        let url = self.values_url(
            &self.first_cell(),
            ":append?valueInputOption=RAW&insertDataOption=INSERT_ROWS",
        );
        let response = self
            .client
            .post(url)
            .header(USER_AGENT, CLIENT_AGENT)
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .json(&json!({ "values": [row] }))
            .send()?;
        check_status(response)?;
        Ok(())
    }
}
