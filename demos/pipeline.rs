//! End-to-end clustering of synthetic pulse traces.
//!
//! Builds three noisy archetypes (sine, square-ish, ramp), harmonizes them,
//! partitions with the metric named on the command line, then prints leaf
//! sizes, each leaf's closest pair, and a few activity intervals.
//!
//! Run with: cargo run --release --example pipeline -- [correlation|dtw]

use pulse_cluster::{ClusterConfig, ClusterEngine, MetricKind, Series, SeriesSet};

fn main() {
    let metric = match std::env::args().nth(1).as_deref() {
        Some("dtw") => MetricKind::Dtw,
        _ => MetricKind::Correlation,
    };

    let n = 300;
    let len = 256;
    let mut state = 7_u64;
    let mut noise = move || {
        state = state.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        ((state >> 11) as f64 / (1u64 << 53) as f64 - 0.5) * 0.3
    };

    let raw = SeriesSet::from_series((0..n).map(|k| {
        let values = (0..len)
            .map(|i| {
                let t = i as f64 / len as f64 * std::f64::consts::TAU;
                let base = match k % 3 {
                    0 => t.sin(),
                    1 => (3.0 * t).sin().signum() * 0.5 + 0.2 * (7.0 * t).sin(),
                    _ => i as f64 / len as f64 * 2.0 - 1.0 + 0.1 * (5.0 * t).sin(),
                };
                base + noise()
            })
            .collect();
        Series::new(format!("synth_{k:04}"), values)
    }))
    .expect("unique ids");
    let set = raw.harmonized(Some(len)).expect("finite input");

    let config = ClusterConfig::new(metric)
        .with_min_cluster_size(20)
        .with_max_depth(6);
    let engine = ClusterEngine::from_config(config).expect("valid config");
    let analysis = engine.analyze(&set).expect("analysis");

    println!("Divide-and-conquer clustering ({metric:?})");
    println!("=========================================");
    println!("Series: {}, length {len}", set.len());
    println!("Leaves: {}", analysis.leaves.len());
    println!("Fallback pairs: {}\n", analysis.fallback_count());

    for (summary, pair) in analysis.summaries.iter().zip(&analysis.closest_pairs) {
        let closest = match &pair.pair {
            Some(p) => format!("{} ~ {} (d = {:.4})", p.id_a, p.id_b, p.distance),
            None => "-".to_string(),
        };
        println!(
            "  {:>4}  size {:>3}  depth {}  stop {:?}  closest {closest}",
            summary.cluster_id, summary.size, summary.depth, summary.stop
        );
    }

    println!("\nMost active intervals (first 5):");
    for a in analysis.activity.iter().take(5) {
        println!(
            "  {}  [{}, {})  score {:.3}",
            a.series_id, a.start, a.end, a.score
        );
    }
}
