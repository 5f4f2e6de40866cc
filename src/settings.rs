use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::SettingsError;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SheetSettings {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_tab")]
    pub tab: String,
    #[serde(default)]
    pub client_email: String,
    #[serde(default)]
    pub private_key: String,
}

impl Default for SheetSettings {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            tab: default_tab(),
            client_email: String::new(),
            private_key: String::new(),
        }
    }
}

/// Everything the Sheets client needs, only produced when no field is blank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SheetCredentials {
    pub spreadsheet_id: String,
    pub tab: String,
    pub client_email: String,
    pub private_key: String,
}

impl SheetSettings {
    pub fn credentials(&self) -> Option<SheetCredentials> {
        let id = self.spreadsheet_id.trim();
        let email = self.client_email.trim();
        let key = self.private_key.trim();
        if id.is_empty() || email.is_empty() || key.is_empty() {
            return None;
        }
        let tab = match self.tab.trim() {
            "" => default_tab(),
            tab => tab.to_string(),
        };
        Some(SheetCredentials {
            spreadsheet_id: id.to_string(),
            tab,
            client_email: email.to_string(),
            private_key: key.replace("\\n", "\n"),
        })
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    #[serde(default = "default_database_file")]
    pub database_file: String,
    #[serde(default)]
    pub admin_emails: Vec<String>,
    #[serde(default = "default_completion_cookie")]
    pub completion_cookie: String,
    #[serde(default)]
    pub sheets: SheetSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            database_file: default_database_file(),
            admin_emails: Vec::new(),
            completion_cookie: default_completion_cookie(),
            sheets: SheetSettings::default(),
        }
    }
}

fn default_tab() -> String {
    "Responses".to_string()
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_database_file() -> String {
    "survey.sqlite3".to_string()
}

fn default_completion_cookie() -> String {
    "surveySubmitted".to_string()
}

impl Settings {
    pub fn database_path(&self, data_dir: &Path) -> PathBuf {
        let file = Path::new(&self.database_file);
        if file.is_absolute() {
            file.to_path_buf()
        } else {
            data_dir.join(file)
        }
    }

    /// Lower-cased allow-list. Empty means any signed-in account is an admin.
    pub fn admin_allow_list(&self) -> Vec<String> {
        self.admin_emails
            .iter()
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty())
            .collect()
    }

    /// Applies `SURVEY_*` overrides through `lookup`; blank values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(value) = get("SURVEY_SHEET_ID") {
            self.sheets.spreadsheet_id = value;
        }
        if let Some(value) = get("SURVEY_SHEET_TAB") {
            self.sheets.tab = value;
        }
        if let Some(value) = get("SURVEY_SHEET_CLIENT_EMAIL") {
            self.sheets.client_email = value;
        }
        if let Some(value) = get("SURVEY_SHEET_PRIVATE_KEY") {
            self.sheets.private_key = value;
        }
        if let Some(value) = get("SURVEY_ADMIN_EMAILS") {
            self.admin_emails = value
                .split(',')
                .map(|email| email.trim().to_string())
                .filter(|email| !email.is_empty())
                .collect();
        }
    }
}

pub fn settings_path(data_dir: &Path) -> PathBuf {
    data_dir.join(SETTINGS_FILE)
}

fn io_error(path: &Path, source: std::io::Error) -> SettingsError {
    SettingsError::Io {
        path: path.display().to_string(),
        source,
    }
}

pub fn load_settings(data_dir: &Path) -> Result<Settings, SettingsError> {
    let path = settings_path(data_dir);
    if !path.exists() {
        let defaults = Settings::default();
        save_settings(data_dir, &defaults)?;
        return Ok(defaults);
    }
    let raw = fs::read_to_string(&path).map_err(|e| io_error(&path, e))?;
    if raw.trim().is_empty() {
        let defaults = Settings::default();
        save_settings(data_dir, &defaults)?;
        return Ok(defaults);
    }
    Ok(serde_json::from_str(&raw)?)
}

pub fn save_settings(data_dir: &Path, settings: &Settings) -> Result<(), SettingsError> {
    fs::create_dir_all(data_dir).map_err(|e| io_error(data_dir, e))?;
    let path = settings_path(data_dir);
    let payload = serde_json::to_string_pretty(settings)?;
    fs::write(&path, payload).map_err(|e| io_error(&path, e))
}

/// Settings file plus process environment.
pub fn resolve_settings(data_dir: &Path) -> Result<Settings, SettingsError> {
    let mut settings = load_settings(data_dir)?;
    settings.apply_overrides(|key| std::env::var(key).ok());
    Ok(settings)
}
