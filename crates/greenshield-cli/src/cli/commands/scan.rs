//! `scan`: drives one capture screen through a single upload.

use std::sync::Arc;

use anyhow::Result;
use greenshield_core::api::{Prediction, ScanReceipt, UNKNOWN};
use greenshield_core::capture::{CaptureController, Platform, UploadOutcome};
use greenshield_core::history::ScanRow;
use greenshield_core::navigation::{Route, Tab};

use crate::cli::app::App;

pub async fn run(app: &mut App, image: &str, platform: Option<Platform>) -> Result<()> {
    app.require_session(Route::Tabs(Tab::Camera))?;

    let platform = platform.unwrap_or(app.config.platform);
    let screen = CaptureController::new(Arc::clone(&app.gateway), platform);

    let picked = image.to_string();
    if !screen.capture(async move { Some(picked) }).await {
        anyhow::bail!("No image selected");
    }

    match screen.use_photo().await? {
        UploadOutcome::Uploaded(receipt) => {
            print_receipt(&receipt);
            Ok(())
        }
        UploadOutcome::Failed(failure) => {
            if failure.is_session_expired() {
                app.settle();
            }
            Err(anyhow::Error::new(failure).context("Scan failed"))
        }
        UploadOutcome::Discarded => anyhow::bail!("Upload was discarded"),
    }
}

fn print_receipt(receipt: &ScanReceipt) {
    println!("{}", receipt.message.as_deref().unwrap_or("Scan uploaded"));
    let Some(prediction) = &receipt.prediction else {
        return;
    };
    print_prediction(prediction);
}

fn print_prediction(prediction: &Prediction) {
    let row = ScanRow::from_prediction(prediction);
    println!("Disease:    {}", row.disease);
    println!("Severity:   {}", row.severity);
    println!("Confidence: {}", row.confidence);

    let Some(disease) = &prediction.disease else {
        return;
    };
    if let Some(description) = disease.description_en.as_deref() {
        println!("\n{description}");
    }
    if !disease.treatments.is_empty() {
        println!("\nTreatments:");
        for treatment in &disease.treatments {
            let title = treatment.title_en.as_deref().unwrap_or(UNKNOWN);
            let kind = if treatment.is_chemical { "chemical" } else { "organic" };
            println!("  - {title} ({kind})");
        }
    }
}
