use tidy_draws::{
    CompareOptions, Comparison, NewData, PairGenerator, ParamSpec, ParseOptions, RawDraws,
    SummaryOptions, add_predictive_draws, compare_levels, spread_draws, summarize,
};

fn main() {
    let draws = 500;
    let mut raw = RawDraws::new();
    for (level, center) in [("ctrl", 1.0), ("low", 1.4), ("high", 2.2)] {
        raw.push(
            format!("mu[{level}]"),
            (0..draws)
                .map(|idx| center + 0.2 * (idx_to_f64(idx) * 0.61).sin())
                .collect(),
        );
    }
    let table = spread_draws(
        &raw,
        &[ParamSpec::parse("mu[dose]").expect("spec")],
        &ParseOptions::default(),
    )
    .expect("tidy draws");

    let pairwise = compare_levels(&table, "mu", "dose", &CompareOptions::default()).expect("pairs");
    let summary =
        summarize(&pairwise, &[], &["dose"], &SummaryOptions::median_qi()).expect("summary");
    println!("{}", summary.render());

    let ratios = CompareOptions::default()
        .with_comparison(Comparison::Ratio)
        .with_pairs(PairGenerator::Control("ctrl".to_string()));
    let vs_control = compare_levels(&table, "mu", "dose", &ratios).expect("ratios");
    let summary =
        summarize(&vs_control, &[], &["dose"], &SummaryOptions::mean_hdi()).expect("summary");
    println!("{}", summary.render());

    let new_data = NewData::new().with_column("x", &[0.0, 0.5, 1.0]);
    let predictions = add_predictive_draws(
        &new_data,
        &|data: &NewData, _ndraws: Option<usize>| -> Result<RawDraws, String> {
            let mut out = RawDraws::new();
            for (row, x) in data.get("x").unwrap_or_default().iter().enumerate() {
                let x: f64 = x.parse().map_err(|_| format!("non-numeric x `{x}`"))?;
                out.push(
                    format!("epred[{}]", row + 1),
                    (0..draws)
                        .map(|idx| 1.0 + x * (1.0 + 0.1 * (idx_to_f64(idx) * 0.29).cos()))
                        .collect(),
                );
            }
            Ok(out)
        },
        "epred",
        None,
        &ParseOptions::default(),
    )
    .expect("predictions");
    let summary =
        summarize(&predictions, &[], &["x"], &SummaryOptions::mean_qi()).expect("summary");
    println!("{}", summary.render());
}

fn idx_to_f64(idx: usize) -> f64 {
    f64::from(u32::try_from(idx).unwrap_or(u32::MAX))
}
