// src/specs/vacancies.rs
//! Spec for vacancy search results (`GET /vacancies`, the `items` array).
//!
//! Keys are flattened with their parent path (`employer_name`,
//! `address_metro_stations_station_id`). Besides the main `vacancies` row a
//! vacancy yields:
//! - an `employers` row (the `employer_*` fields, id kept in the main row),
//! - a `streets` row keyed by (area, city, street),
//! - one `metro_stations` row and one join row per entry of
//!   `address.metro_stations`.
//!
//! `area_id` must exist in the areas table; a miss triggers one areas refresh.

use crate::config::options::Tables;
use crate::engine::flatten::KeyStyle;
use crate::engine::pipeline::Layout;
use crate::engine::route::{RouteTable, SatelliteRoute};
use crate::engine::types::Scalar;
use crate::specs::areas;
use crate::store::TableDef;

pub const IDENTITY: &str = "id";

/// Duplicates of data kept elsewhere: `area_*` lives in the areas table,
/// `address_metro_*` repeats the first entry of `address_metro_stations`.
const SKIPPED: &[&str] = &[
    "area_name",
    "area_url",
    "address_metro_station_name",
    "address_metro_line_name",
    "address_metro_station_id",
    "address_metro_line_id",
    "address_metro_lat",
    "address_metro_lng",
    "address_metro_stations_line_id",
];

pub fn layout(t: &Tables) -> Layout {
    Layout {
        main: TableDef::new(&t.vacancies, &[
            "id INTEGER NOT NULL PRIMARY KEY",
            "name TEXT",
            "area_id INTEGER",
            "address_city TEXT",
            "address_street TEXT",
            "employer_id INTEGER",
            "alternate_url TEXT",
            "salary_from INTEGER",
            "salary_to INTEGER",
            "salary_currency TEXT",
            "salary_gross INTEGER",
            "snippet_responsibility TEXT",
            "snippet_requirement TEXT",
            "schedule_name TEXT",
            "working_time_intervals_name TEXT",
            "working_time_modes_name TEXT",
            "is_sent INTEGER NOT NULL DEFAULT 0",
        ]),
        identity: IDENTITY.to_string(),
        keys: KeyStyle::Qualified,
        tables: vec![
            areas::table_def(&t.areas),
            // NOT NULL DEFAULT: a vacancy without area or street still maps
            // onto one stable key instead of a fresh NULL-keyed row.
            TableDef::new(&t.streets, &[
                "area_id INTEGER NOT NULL DEFAULT 0",
                "city_name TEXT NOT NULL DEFAULT ''",
                "street_name TEXT NOT NULL DEFAULT ''",
                "PRIMARY KEY (area_id, city_name, street_name)",
            ]),
            TableDef::new(&t.metro_stations, &[
                "station_id TEXT NOT NULL PRIMARY KEY",
                "station_name TEXT",
                "line_name TEXT",
                "station_lat TEXT",
                "station_lng TEXT",
            ]),
            TableDef::new(&t.employers, &[
                "id INTEGER NOT NULL PRIMARY KEY",
                "name TEXT",
                "url TEXT",
                "alternate_url TEXT",
                "logo_url_original TEXT",
                "logo_url_240 TEXT",
                "logo_url_90 TEXT",
                "vacancies_url TEXT",
                "is_trusted INTEGER",
            ]),
            TableDef::new(&t.vacancies_metro_stations, &[
                "vacancy_id INTEGER NOT NULL",
                "metro_station_id TEXT NOT NULL",
                "PRIMARY KEY (vacancy_id, metro_station_id)",
            ]),
        ],
        routes: routes(t),
        defaults: vec![("is_sent".to_string(), Scalar::Int(0))],
    }
}

fn routes(t: &Tables) -> RouteTable {
    RouteTable::new()
        .route(
            SatelliteRoute::new("area")
                .copy("area_id", "id")
                .required(&["id"])
                .references("id", &t.areas, "id"),
        )
        .route(
            SatelliteRoute::new("street")
                .into_table(&t.streets)
                .copy("area_id", "area_id")
                .copy("address_city", "city_name")
                .copy("address_street", "street_name")
                .required(&["city_name", "street_name"]),
        )
        .route(
            SatelliteRoute::new("metro")
                .into_table(&t.metro_stations)
                .take("address_metro_stations_station_id", "station_id")
                .take("address_metro_stations_station_name", "station_name")
                .take("address_metro_stations_line_name", "line_name")
                .take("address_metro_stations_lat", "station_lat")
                .take("address_metro_stations_lng", "station_lng")
                .required(&["station_id"])
                .join(&t.vacancies_metro_stations, "vacancy_id", "metro_station_id", "station_id"),
        )
        .route(
            SatelliteRoute::new("employer")
                .into_table(&t.employers)
                .copy("employer_id", "id")
                .take("employer_name", "name")
                .take("employer_url", "url")
                .take("employer_alternate_url", "alternate_url")
                .take("employer_logo_urls_original", "logo_url_original")
                .take("employer_logo_urls_240", "logo_url_240")
                .take("employer_logo_urls_90", "logo_url_90")
                .take("employer_vacancies_url", "vacancies_url")
                .take("employer_trusted", "is_trusted")
                .required(&["id"]),
        )
        .skip(SKIPPED)
}
