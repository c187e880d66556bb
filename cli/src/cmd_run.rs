//! `volley run`: run one batch from the terminal and print the report.

use anyhow::{anyhow, Result};

use volley_core::{BatchCoordinator, BatchParams, BatchReport, DispatchError};

pub struct RunArgs {
    pub id: u64,
    pub region: Option<String>,
    pub target: Option<u64>,
    pub concurrency: Option<u64>,
    pub json: bool,
}

impl RunArgs {
    fn params(&self) -> BatchParams {
        BatchParams {
            id: Some(self.id.to_string()),
            region: self.region.clone(),
            target: self.target.map(|t| t.to_string()),
            concurrency: self.concurrency.map(|c| c.to_string()),
        }
    }
}

// ─── Entry point ─────────────────────────────────────────────────────────────

pub async fn run(coordinator: &BatchCoordinator, args: RunArgs) -> Result<()> {
    match coordinator.dispatch(&args.params()).await {
        Ok(report) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
            Ok(())
        }
        Err(DispatchError::Undecoded {
            success,
            attempts,
            elapsed_seconds,
        }) => {
            if args.json {
                let body = serde_json::json!({
                    "error": "could not decode response",
                    "success": success,
                    "total_attempts": attempts,
                    "elapsed_seconds": elapsed_seconds,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                println!("Success:        {success}");
                println!("Total attempts: {attempts}");
                println!("Elapsed:        {elapsed_seconds}s");
            }
            Err(anyhow!("could not decode response"))
        }
        Err(e) => Err(e.into()),
    }
}

fn print_report(report: &BatchReport) {
    let p = &report.profile;
    println!("Profile");
    println!("  ID:           {}", p.id);
    println!("  Name:         {}", p.display_name);
    println!("  Popularity:   {}", p.popularity);
    println!("  Region:       {}", p.region);
    println!("  Level:        {}", p.level);
    println!();
    println!("Batch");
    println!("  Success:        {}", report.success);
    println!("  Remaining:      {}", report.remaining);
    println!("  Total attempts: {}", report.total_attempts);
    println!("  Elapsed:        {}s", report.elapsed_seconds);
}
