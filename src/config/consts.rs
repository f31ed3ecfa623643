// src/config/consts.rs

// Remote API
pub const API_URL: &str = "https://api.hh.ru/";
pub const AREAS_ENDPOINT: &str = "areas";
pub const VACANCIES_ENDPOINT: &str = "vacancies";
pub const USER_AGENT: &str = "hh_ingest/0.4 (areas+vacancies loader)";
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

// Local files
pub const STORE_DIR: &str = ".store";
pub const LOG_FILE: &str = "debug.log";
pub const DEFAULT_CONFIG: &str = "config.yaml";
pub const DEFAULT_DATABASE: &str = "./data/hh.db";

// Tables
pub const AREAS_TABLE: &str = "areas";
pub const VACANCIES_TABLE: &str = "vacancies";
pub const STREETS_TABLE: &str = "streets";
pub const METRO_STATIONS_TABLE: &str = "metro_stations";
pub const EMPLOYERS_TABLE: &str = "employers";
pub const VACANCIES_METRO_STATIONS_TABLE: &str = "vacancies_metro_stations";

// Vacancy search
pub const PER_PAGE: u32 = 100; // API maximum
pub const DEFAULT_PERIOD_DAYS: u32 = 1;
