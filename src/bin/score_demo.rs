//! Demo that runs a few sample patients through both scoring pipelines.

use referral_suitability_analyzer::{assess, CriterionScores, DEFAULT_WEIGHTS};

fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let samples = [
        ("urgent, covered, willing", CriterionScores::new(85.0, 75.0, 80.0)),
        ("average across the board", CriterionScores::new(50.0, 50.0, 50.0)),
        ("mild and reluctant", CriterionScores::new(15.0, 40.0, 10.0)),
        ("urgent but uninsured", CriterionScores::new(90.0, 10.0, 60.0)),
    ];

    for (label, scores) in samples {
        let a = assess(&scores, &DEFAULT_WEIGHTS);
        println!(
            "{label}: ahp {} (recommended: {}), fuzzy {} ({:?})",
            a.ahp.score, a.ahp.recommended, a.fuzzy.score, a.fuzzy.level
        );
    }

    println!("score-demo done");
}
