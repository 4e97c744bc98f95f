use ro_models::problems::blending::BlendingProblem;
use ro_models::{init_tracing, OptimizationService, SolveWorker, SolverConfig};
use std::path::PathBuf;

const USAGE: &str = "usage: ro-solve <blending-problem.json> [solver.toml]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut args = std::env::args_os().skip(1).map(PathBuf::from);
    let problem_path = args.next().ok_or(USAGE)?;
    let config = match args.next() {
        Some(path) => SolverConfig::load(path)?,
        None => SolverConfig::load_or_default("solver.toml")?,
    };

    let problem = BlendingProblem::load_from_json(&problem_path)?;
    let worker = SolveWorker::new(OptimizationService::from_config(&config));
    let outcome = worker
        .spawn(move |service| service.solve_blending(&problem))
        .join()
        .await?;

    let solution = &outcome.solution;
    println!("Status:     {}", solution.status());
    println!("Solve time: {:.3} s", solution.solve_time().as_secs_f64());
    if let Some(objective) = solution.objective_value() {
        println!("Total cost: {:.2}", objective);
    }
    if !solution.has_solution() {
        println!("Reason:     {}", solution.message());
        return Ok(());
    }

    if let Some(metrics) = &outcome.metrics {
        println!("\nMaterial quantities (kg):");
        for (material, quantity) in &metrics.quantities {
            println!("  {:<20} {:>12.3}", material, quantity);
        }
        println!("  {:<20} {:>12.3}", "total", metrics.total_weight);

        println!("\nComposition (%):");
        for (symbol, percent) in &metrics.element_percentages {
            println!("  {:<20} {:>12.3}", symbol, percent);
        }
        println!("  {:<20} {:>12.3}", "impurities", metrics.impurity_percent);

        println!("\nEstimated properties:");
        for (property, value) in [
            ("density (g/cm3)", metrics.estimated_density),
            ("hardness (HRC)", metrics.estimated_hardness),
            ("melting point (C)", metrics.estimated_melting_point),
        ] {
            match value {
                Some(value) => println!("  {:<20} {:>12.3}", property, value),
                None => println!("  {:<20} {:>12}", property, "n/a"),
            }
        }

        println!("\nChecks:");
        for (check, ok) in &metrics.constraints_satisfied {
            println!("  {:<20} {}", check, if *ok { "ok" } else { "VIOLATED" });
        }
    }

    if let Some(sensitivity) = solution.sensitivity() {
        println!("\nShadow prices:");
        for (constraint, price) in &sensitivity.shadow_prices {
            println!("  {:<20} {:>12.4}", constraint, price);
        }
    }

    Ok(())
}
