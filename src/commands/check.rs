use anyhow::Result;

use slotwatch::config::Config;
use slotwatch::error::SlotwatchErrorTrait;
use slotwatch::models::CycleOutcome;

use super::bootstrap::build_poller;

/// Run exactly one cycle and print the outcome
///
/// Returns `true` when slots were found.
pub async fn check(config: Config) -> Result<bool> {
    let (poller, _config) = build_poller(config).await?;

    let report = poller.check().await;

    println!("Outcome: {}", report.outcome);
    if let CycleOutcome::Found(result) = &report.outcome {
        for slot in result.slots() {
            match &slot.location_label {
                Some(location) => println!("  - {slot} ({location})"),
                None => println!("  - {slot}"),
            }
        }
    }
    if let CycleOutcome::Error(e) = &report.outcome {
        println!("Category: {}", e.category());
    }
    if report.relogin_attempted {
        println!("Session was renewed during this check");
    }
    println!("Elapsed: {} ms", report.elapsed.as_millis());

    Ok(report.outcome.is_found())
}
