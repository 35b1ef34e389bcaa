use email_finder_lib::{input_loader, logger, report};
use email_finder_lib::{PageFetcher, Pipeline, SearchConfig, SearchEngine, DEFAULT_PACING};

use log::{error, info};
use std::error::Error;
use std::fs::File;

const DEFAULT_INPUT: &str = "investors.xlsx";
const OUTPUT_CSV: &str = "investor_emails.csv";

fn main() -> Result<(), Box<dyn Error>> {
    logger::init();
    info!("Starting investor email finder...");

    // Provider credentials come from the environment, never from input data.
    let config = match SearchConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            return Err(e.into());
        }
    };

    let input_file = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_INPUT.to_string());
    let records = match input_loader::load_records(&input_file) {
        Ok(r) => r,
        Err(e) => {
            error!("Cannot load input from {}: {}", input_file, e);
            return Err(e.into());
        }
    };
    if records.is_empty() {
        error!(
            "No usable rows in {}. The file needs a 'Name' column (optionally with 'Registration No.' and 'Address').",
            input_file
        );
        return Ok(());
    }

    let pipeline = Pipeline::new(SearchEngine::new(config), PageFetcher::new(), DEFAULT_PACING);
    let results = pipeline.run(&records);

    let output = File::create(OUTPUT_CSV)?;
    report::write_csv(&results, output)?;
    info!("Results written to {}", OUTPUT_CSV);

    let summary = report::summarize(&results);
    info!(
        "Found email addresses for {} of {} investors.",
        summary.resolved, summary.total
    );

    let mut domains: Vec<(String, usize)> = report::domain_tally(&results).into_iter().collect();
    domains.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    for (domain, count) in domains {
        info!("  {} x {}", count, domain);
    }

    Ok(())
}
