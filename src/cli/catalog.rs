//! CLI dispatch for the `rvl catalog` command.

use std::path::Path;
use std::process::ExitCode;

use serde::Serialize;

use crate::models::{Collection, SilhouetteStyle};

use super::{load_config_or_report, print_json, EXIT_SUCCESS};

#[derive(Debug, Serialize)]
struct CollectionRow<'a> {
    id: &'a str,
    title: &'a str,
    ribbon: &'a str,
    included: bool,
    silhouette: SilhouetteStyle,
    items: usize,
    first: Option<&'a str>,
}

impl<'a> From<&'a Collection> for CollectionRow<'a> {
    fn from(c: &'a Collection) -> Self {
        Self {
            id: &c.id,
            title: &c.title,
            ribbon: &c.ribbon_text,
            included: c.is_included_by_default,
            silhouette: c.silhouette_style,
            items: c.items.len(),
            first: c.items.first().map(|i| i.image_source.as_str()),
        }
    }
}

/// Execute the catalog command.
pub fn run_catalog(config_path: Option<&Path>, json: bool) -> ExitCode {
    let loaded = match load_config_or_report(config_path) {
        Ok(l) => l,
        Err(code) => return code,
    };
    let catalog = loaded.config.catalog();
    let rows: Vec<CollectionRow> = catalog.collections().iter().map(CollectionRow::from).collect();

    if json {
        return print_json(&rows);
    }

    for row in &rows {
        let included = if row.included { " (included)" } else { "" };
        println!("{:<20} {:>4} items  {}{}", row.id, row.items, row.ribbon, included);
    }
    ExitCode::from(EXIT_SUCCESS)
}
