use rayon::ThreadPoolBuilder;
use std::sync::Once;
use tracing::{info, warn};

struct ThreadConfig {
    count: usize,
    source: String,
}

const ENV_HINTS: [&str; 6] = [
    "GRIDTALLY_THREADS",
    "RAYON_NUM_THREADS",
    "SLURM_CPUS_PER_TASK",
    "SLURM_CPUS_ON_NODE",
    "PBS_NP",
    "OMP_NUM_THREADS",
];

fn first_positive<'a>(
    keys: &[&'a str],
    lookup: impl Fn(&str) -> Option<String>,
) -> Option<(usize, &'a str)> {
    keys.iter().find_map(|&key| {
        lookup(key)
            .and_then(|v| v.trim().parse::<usize>().ok())
            .filter(|&n| n > 0)
            .map(|n| (n, key))
    })
}

fn detect_thread_config() -> ThreadConfig {
    if let Some((count, key)) = first_positive(&ENV_HINTS, |k| std::env::var(k).ok()) {
        return ThreadConfig {
            count,
            source: key.to_string(),
        };
    }

    let fallback = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .max(1);

    ThreadConfig {
        count: fallback,
        source: "available_parallelism".to_string(),
    }
}

/// Size the global rayon pool once from scheduler/env hints.
/// Returns the number of threads actually available.
pub fn configure_thread_pool() -> usize {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let cfg = detect_thread_config();
        match ThreadPoolBuilder::new()
            .num_threads(cfg.count)
            .thread_name(|i| format!("gridtally-worker-{i}"))
            .build_global()
        {
            Ok(_) => {
                info!(threads = cfg.count, hint = %cfg.source, "rayon pool configured");
            }
            Err(err) => {
                warn!("failed to configure rayon pool ({err}); continuing with default");
            }
        }
    });
    rayon::current_num_threads()
}
