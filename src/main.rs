use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use anyhow::{Context, Result};
use rio_plot::data::loader::load_file;
use rio_plot::state::AppState;
use rio_plot::{plot, NativeViewer, Outcome, PlotOptions};

const USAGE: &str = "usage: rio-plot [records.json|records.csv] [options.json]";

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let records_path = args.next();
    let options_path = args.next();
    if args.next().is_some() {
        anyhow::bail!(USAGE);
    }

    let Some(records_path) = records_path else {
        // No records given: open an empty viewer and let the user pick a file.
        rio_plot::app::run(AppState::default())
            .map_err(|e| anyhow::anyhow!("viewer failed: {e}"))?;
        return Ok(());
    };

    let batches = load_file(&records_path)?;
    log::info!(
        "Loaded {} batches from {}",
        batches.len(),
        records_path.display()
    );

    let options = match options_path {
        Some(path) => {
            let file =
                File::open(&path).with_context(|| format!("opening {}", path.display()))?;
            serde_json::from_reader(BufReader::new(file))
                .with_context(|| format!("parsing plot options from {}", path.display()))?
        }
        None => PlotOptions::default(),
    };

    let mut viewer = NativeViewer::with_records(batches.clone(), options.clone());
    let rendered = plot(&batches, &options, &mut viewer)?;

    for w in &rendered.warnings {
        eprintln!("warning: {w}");
    }
    match rendered.outcome {
        Outcome::Displayed => log::info!("Viewer closed"),
        Outcome::Saved(path) => println!("Saved figure to {}", path.display()),
        Outcome::Returned(figure) => println!(
            "Composed figure with {} axes and {} lines",
            figure.axes.len(),
            figure.line_count()
        ),
    }
    Ok(())
}
