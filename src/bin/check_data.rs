//! Data-quality report for the datasets and model artifact.
//!
//! Loads everything the server loads at startup, runs the same consistency
//! checks, and additionally lists irregular catalog spellings and coverage
//! gaps that the server tolerates.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin check_data -- [--datasets-dir datasets] [--models-dir models] [--model-sha256 <hex>]
//! ```
//!
//! Exits non-zero when the server would refuse to start.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use symptomcheck::adapters::csv_tables;
use symptomcheck::adapters::linear_svc::{LinearSvcAdapter, ModelLoadError};
use symptomcheck::application::check_model;
use symptomcheck::domain::{
    disease_name_defects, symptom_name_defects, DiseaseCatalog, SymptomCatalog, TableKind,
};

#[derive(Parser)]
#[command(name = "check_data", about = "Report data-quality defects in datasets and model")]
struct Cli {
    /// Directory holding the reference CSV tables
    #[arg(long, env = "SYMPTOMCHECK_DATASETS_DIR", default_value = "datasets")]
    datasets_dir: PathBuf,

    /// Directory holding the model artifact
    #[arg(long, env = "SYMPTOMCHECK_MODELS_DIR", default_value = "models")]
    models_dir: PathBuf,

    /// Expected SHA-256 of the model artifact
    #[arg(long, env = "SYMPTOMCHECK_MODEL_SHA256")]
    model_sha256: Option<String>,
}

fn report_catalogs(symptoms: &SymptomCatalog, diseases: &DiseaseCatalog) {
    println!("== Catalog spellings ==");
    let mut clean = true;

    for (slot, name) in symptoms.names().iter().enumerate() {
        let defects = symptom_name_defects(name);
        if !defects.is_empty() {
            clean = false;
            let list: Vec<String> = defects.iter().map(ToString::to_string).collect();
            println!("  symptom slot {slot:>3} {name:?}: {}", list.join(", "));
        }
    }

    for label in diseases.labels() {
        let Some(name) = diseases.name(label) else {
            continue;
        };
        let defects = disease_name_defects(name);
        if !defects.is_empty() {
            clean = false;
            let list: Vec<String> = defects.iter().map(ToString::to_string).collect();
            println!("  disease label {label:>2} {name:?}: {}", list.join(", "));
        }
    }

    if clean {
        println!("  no irregular spellings");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let symptoms = SymptomCatalog::builtin();
    let diseases = DiseaseCatalog::builtin();
    let mut fatal = 0usize;

    report_catalogs(&symptoms, &diseases);

    println!("\n== Reference tables ({}) ==", cli.datasets_dir.display());
    match csv_tables::load_reference_tables(&cli.datasets_dir) {
        Ok(tables) => {
            for kind in TableKind::ALL {
                let name = kind.to_string();
                println!("  {name:<12} {:>5} rows  ({})", tables.row_count(kind), kind.file_name());
            }

            let coverage = tables.coverage(&diseases);
            for unknown in &coverage.unknown {
                fatal += 1;
                println!("  FATAL unknown disease in {unknown}");
            }
            for (kind, name) in &coverage.missing {
                println!("  missing: {kind} has no rows for {name:?}");
            }
        }
        Err(e) => {
            fatal += 1;
            println!("  FATAL {e}");
        }
    }

    println!("\n== Model ({}) ==", cli.models_dir.display());
    let pin = cli.model_sha256.as_deref().map(str::trim).filter(|s| !s.is_empty());
    match LinearSvcAdapter::load(&cli.models_dir, pin) {
        Ok(model) => {
            println!("  sha256={}", model.digest());
            match check_model(&model, &symptoms, &diseases) {
                Ok(()) => println!("  features and labels match the catalogs"),
                Err(e) => {
                    fatal += 1;
                    println!("  FATAL {e}");
                }
            }
        }
        Err(ModelLoadError::NotFound(path)) => {
            println!("  not found at {path:?}; the server would run with predictions disabled");
        }
        Err(e) => {
            println!("  unusable: {e}; the server would run with predictions disabled");
        }
    }

    if fatal > 0 {
        bail!("{fatal} fatal defect(s) found");
    }
    println!("\nOK");
    Ok(())
}
