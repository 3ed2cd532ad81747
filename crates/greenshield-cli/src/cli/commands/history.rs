//! `history` and `treatments` listings.

use anyhow::{Context, Result};
use greenshield_core::api::Prediction;
use greenshield_core::history::{self, ScanRow};
use greenshield_core::navigation::{Route, Tab};

use crate::cli::app::App;

async fn fetch(app: &mut App, limit: Option<u32>) -> Result<Vec<Prediction>> {
    let limit = limit.unwrap_or(app.config.history_limit);
    let result = app.gateway.history(limit).await;
    result.map_err(|e| app.api_error(e))
}

pub async fn list(app: &mut App, limit: Option<u32>, json: bool) -> Result<()> {
    app.require_session(Route::Tabs(Tab::Scans))?;
    let predictions = fetch(app, limit).await?;
    let rows: Vec<ScanRow> = predictions.iter().map(ScanRow::from_prediction).collect();

    if json {
        let out = serde_json::to_string_pretty(&rows).context("serialize history")?;
        println!("{out}");
        return Ok(());
    }
    if rows.is_empty() {
        println!("No scans yet.");
        return Ok(());
    }

    let summary = history::summary(&predictions);
    println!(
        "{} scans: {} healthy, {} need attention",
        summary.total, summary.healthy, summary.needs_attention
    );
    for row in rows {
        println!(
            "{}  {:<24} {:<8} {:>5}",
            row.date, row.disease, row.severity, row.confidence
        );
    }
    Ok(())
}

pub async fn treatments(app: &mut App, limit: Option<u32>) -> Result<()> {
    app.require_session(Route::Tabs(Tab::Treatment))?;
    let predictions = fetch(app, limit).await?;
    let needing = history::treatments(&predictions);

    if needing.is_empty() {
        println!("No treatments needed.");
        return Ok(());
    }
    for prediction in needing {
        let row = ScanRow::from_prediction(prediction);
        println!("{}  {} ({})", row.date, row.disease, row.severity);
        let treatments = prediction
            .disease
            .as_ref()
            .map(|d| d.treatments.as_slice())
            .unwrap_or_default();
        for treatment in treatments {
            if let Some(title) = treatment.title_en.as_deref() {
                println!("    - {title}");
            }
        }
    }
    Ok(())
}
