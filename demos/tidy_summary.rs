use rand::rngs::StdRng;
use rand::{RngExt, SeedableRng};
use tidy_draws::{
    ParamSpec, ParseOptions, RawDraws, SummaryOptions, Target, render_table, spread_draws,
    summarize,
};

fn main() {
    let draws = 2000;
    let mut rng = StdRng::seed_from_u64(42);
    let mut noise = |center: f64| -> Vec<f64> {
        (0..draws)
            .map(|_| center + rng.random_range(-1.0..1.0) + rng.random_range(-1.0..1.0))
            .collect()
    };

    let mut raw = RawDraws::new();
    for (condition, shift) in [("A", 0.0), ("B", 0.8), ("C", 1.5)] {
        raw.push(format!("r_condition[{condition},Intercept]"), noise(shift));
        raw.push(format!("r_condition[{condition},slope]"), noise(shift / 2.0));
    }
    raw.push("sigma", noise(3.0));
    let raw = raw.with_chains(4);

    let specs = ParamSpec::parse_all(&["r_condition[condition,term]", "sigma"]).expect("specs");
    let table = spread_draws(&raw, &specs, &ParseOptions::default()).expect("tidy draws");
    println!("{}", render_table(&table, Some(5)));

    let intercepts = table.filter(|row| row.key("term") == Some("Intercept"));
    let summary = summarize(
        &intercepts,
        &[Target::column("r_condition")],
        &["condition"],
        &SummaryOptions::mean_qi().with_levels(vec![0.66, 0.95]),
    )
    .expect("summary");
    println!("{}", summary.render());

    let shifted = Target::expression("intercept_plus_sigma", |row| {
        row.value("r_condition").unwrap_or(f64::NAN) + row.value("sigma").unwrap_or(f64::NAN)
    });
    let summary = summarize(&intercepts, &[shifted], &["condition"], &SummaryOptions::mode_hdi())
        .expect("expression summary");
    println!("{}", summary.render());
}
