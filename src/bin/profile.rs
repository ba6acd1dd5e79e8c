use std::time::{Duration, Instant};

use mazecarve::generators::{Generator, GeneratorOptions, generate_maze};

/// Average run time, zero when nothing ran
fn mean_duration(total: Duration, runs: usize) -> Duration {
    if runs == 0 {
        return Duration::ZERO;
    }
    total.div_f64(runs as f64)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = std::env::args();
    args.next(); // Skip executable name
    let num_iters = args
        .next()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10);
    let size = args.next().and_then(|s| s.parse::<u16>().ok()).unwrap_or(250);

    let options = GeneratorOptions::default();
    for generator in Generator::ALL {
        let mut total = Duration::ZERO;
        let mut imperfect = 0;
        for seed in 0..num_iters as u64 {
            let started = Instant::now();
            let maze = generate_maze(generator, size, size, &options, Some(seed))?;
            total += started.elapsed();
            if !maze.is_perfect() {
                tracing::warn!("[profile] {} seed {} is not a perfect maze", generator, seed);
                imperfect += 1;
            }
        }
        tracing::info!(
            "[profile] {}: {} runs on {}x{}, mean {:?}, {} imperfect",
            generator,
            num_iters,
            size,
            size,
            mean_duration(total, num_iters),
            imperfect
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_duration() {
        assert_eq!(mean_duration(Duration::from_secs(3), 0), Duration::ZERO);
        assert_eq!(
            mean_duration(Duration::from_millis(750), 3),
            Duration::from_millis(250)
        );
        // Run counts beyond u32 are not truncated
        let runs = u32::MAX as usize + 1;
        let total = Duration::from_secs(runs as u64);
        assert_eq!(mean_duration(total, runs), Duration::from_secs(1));
    }
}
