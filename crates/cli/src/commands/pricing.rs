//! `hindsight pricing` — show the model pricing table.

use hindsight_telemetry::PricingTable;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let table = PricingTable::with_defaults();
    let models = table.models();

    println!("Model pricing (USD per 1M tokens)");
    println!("{:<30} {:>10} {:>10}", "Model", "Input", "Output");
    for name in &models {
        if let Some(p) = table.get(name) {
            println!("{:<30} ${:>8.3} ${:>8.3}", name, p.input_per_m, p.output_per_m);
        }
    }

    println!();
    println!("  {} models with pricing data", models.len());
    println!("  Unlisted models are estimated at zero cost and flagged in reports.");

    Ok(())
}
