// src/config/options.rs
//
// `config.yaml`, read at start and written back after runs that move the
// search window (`url_params.date_from`) or export column lists.

use std::{collections::BTreeMap, fs, path::{Path, PathBuf}};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::consts::*;
use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub database: PathBuf,
    pub api_url: String,
    /// Sent with every request.
    pub headers: BTreeMap<String, String>,
    /// Raw API responses are dumped here when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub areas_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vacancies_file: Option<PathBuf>,
    pub tables: Tables,
    pub url_params: VacancyFilters,
    /// Table -> column names, refreshed by the `columns` command.
    pub filters_columns: BTreeMap<String, Vec<String>>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            api_url: API_URL.to_string(),
            headers: BTreeMap::from([("User-Agent".to_string(), USER_AGENT.to_string())]),
            areas_file: None,
            vacancies_file: None,
            tables: Tables::default(),
            url_params: VacancyFilters::default(),
            filters_columns: BTreeMap::new(),
        }
    }
}

impl Options {
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("config: {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)?;
        serde_yaml::from_str(&text).map_err(|source| Error::Config { path: path.to_path_buf(), source })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_yaml::to_string(self)
            .map_err(|source| Error::Config { path: path.to_path_buf(), source })?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(path, text)?;
        debug!("config: saved {}", path.display());
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tables {
    pub areas: String,
    pub vacancies: String,
    pub streets: String,
    pub metro_stations: String,
    pub employers: String,
    pub vacancies_metro_stations: String,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            areas: AREAS_TABLE.to_string(),
            vacancies: VACANCIES_TABLE.to_string(),
            streets: STREETS_TABLE.to_string(),
            metro_stations: METRO_STATIONS_TABLE.to_string(),
            employers: EMPLOYERS_TABLE.to_string(),
            vacancies_metro_stations: VACANCIES_METRO_STATIONS_TABLE.to_string(),
        }
    }
}

impl Tables {
    pub fn all(&self) -> [&str; 6] {
        [
            &self.areas,
            &self.vacancies,
            &self.streets,
            &self.metro_stations,
            &self.employers,
            &self.vacancies_metro_stations,
        ]
    }
}

/// Query parameters of the vacancy search.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VacancyFilters {
    /// Area ids; empty means no area filter.
    pub area: Vec<String>,
    pub per_page: u32,
    /// Days back from now. Ignored when a date bound is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_from: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Any other API filter, passed through as is.
    #[serde(flatten)]
    pub extra: BTreeMap<String, String>,
}

impl Default for VacancyFilters {
    fn default() -> Self {
        Self {
            area: Vec::new(),
            per_page: PER_PAGE,
            period: Some(DEFAULT_PERIOD_DAYS),
            date_from: None,
            date_to: None,
            text: None,
            extra: BTreeMap::new(),
        }
    }
}

impl VacancyFilters {
    pub fn has_date_bound(&self) -> bool {
        self.date_from.is_some() || self.date_to.is_some()
    }

    /// Query pairs for one result page.
    pub fn to_params(&self, page: u32) -> Vec<(String, String)> {
        let mut out: Vec<(String, String)> = Vec::new();
        let mut push = |k: &str, v: String| out.push((k.to_string(), v));

        for id in self.area.iter().filter(|a| !a.trim().is_empty()) {
            push("area", id.trim().to_string());
        }
        push("per_page", self.per_page.to_string());
        push("page", page.to_string());
        if let Some(from) = &self.date_from {
            push("date_from", from.clone());
        }
        if let Some(to) = &self.date_to {
            push("date_to", to.clone());
        }
        if let (Some(days), false) = (self.period, self.has_date_bound()) {
            push("period", days.to_string());
        }
        if let Some(text) = &self.text {
            push("text", text.clone());
        }
        for (k, v) in &self.extra {
            push(k, v.clone());
        }
        out
    }
}
