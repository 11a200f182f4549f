use clap::Parser;
use gapmend_application::benchmarking::{run_bench, FillPolicy};
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gapmend-bench")]
#[command(about = "Synthetic gap-repair benchmark tool for Gapmend (dev)")]
struct Args {
    /// Number of synthetic records to generate (default: 100_000).
    #[arg(long, default_value_t = 100_000)]
    records: usize,

    /// Number of monitored channels per record (default: 4).
    #[arg(long, default_value_t = 4)]
    channels: usize,

    /// Change columns per row (each paired with a cumulative column).
    #[arg(long, default_value_t = 3)]
    change_columns: usize,

    /// Whole-row gap rate in basis points (per ten thousand records).
    #[arg(long, default_value_t = 200)]
    gap_rate_bps: u32,

    /// Fill policy: weighted (position interpolation) or midpoint.
    #[arg(long, default_value = "weighted")]
    policy: String,

    /// Fan value columns out across worker threads.
    #[arg(long, default_value_t = false)]
    parallel: bool,

    /// Print a single JSON line instead of human output.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Prometheus metrics listen addr (e.g. 127.0.0.1:9898). Optional.
    #[arg(long)]
    metrics_addr: Option<String>,

    /// Write a CPU profile as an SVG flamegraph to this path (requires feature `pprof`).
    #[arg(long)]
    profile_svg: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    if let Err(err) = init_tracing() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
    if let Err(err) = init_metrics(args.metrics_addr.as_deref()) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }

    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() -> Result<(), String> {
    let filter = std::env::var("GAPMEND_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_new(filter)
        .map_err(|err| format!("invalid log filter: {err}"))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    Ok(())
}

#[cfg(feature = "prometheus")]
fn init_metrics(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = metrics_addr else {
        return Ok(None);
    };
    let addr: SocketAddr = raw
        .parse()
        .map_err(|err| format!("invalid --metrics-addr (expected host:port): {err}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to install prometheus exporter: {err}"))?;

    tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
fn init_metrics(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    if metrics_addr.is_some() {
        return Err("metrics exporter requires gapmend-bench feature `prometheus`".to_string());
    }
    Ok(None)
}

fn run(args: Args) -> Result<(), String> {
    let policy_arg = args.policy.trim().to_lowercase();

    #[cfg(feature = "pprof")]
    let guard = if let Some(path) = &args.profile_svg {
        let _ = fs::create_dir_all(
            path.parent()
                .ok_or_else(|| "profile_svg path has no parent".to_string())?,
        );
        Some(
            pprof::ProfilerGuard::new(100)
                .map_err(|err| format!("failed to start profiler: {err}"))?,
        )
    } else {
        None
    };

    #[cfg(not(feature = "pprof"))]
    if args.profile_svg.is_some() {
        return Err("profiling requires gapmend-bench feature `pprof`".to_string());
    }

    let bench = run_bench(
        args.records,
        args.channels,
        args.change_columns,
        args.gap_rate_bps,
        &policy_arg,
        args.parallel,
    )?;
    let policy = match bench.policy {
        FillPolicy::Weighted => "weighted",
        FillPolicy::Midpoint => "midpoint",
    };

    metrics::histogram!("gapmend.bench.elapsed_ms", "policy" => policy)
        .record(bench.elapsed_ms as f64);
    metrics::gauge!("gapmend.bench.records_per_sec", "policy" => policy)
        .set(bench.records_per_sec);
    metrics::gauge!("gapmend.bench.fills_per_sec", "policy" => policy).set(bench.fills_per_sec);

    #[cfg(feature = "pprof")]
    if let (Some(guard), Some(path)) = (guard, &args.profile_svg) {
        let report = guard
            .report()
            .build()
            .map_err(|err| format!("failed to build profile report: {err}"))?;
        let file = std::fs::File::create(path)
            .map_err(|err| format!("failed to create {}: {err}", path.display()))?;
        report
            .flamegraph(file)
            .map_err(|err| format!("failed to write flamegraph: {err}"))?;
        tracing::info!(profile_svg = %path.display(), "wrote cpu profile flamegraph");
    }

    if args.json {
        let line = serde_json::json!({
            "policy": policy,
            "parallel": bench.parallel,
            "records_requested": bench.records_requested,
            "channels": bench.channels,
            "change_columns": bench.change_columns,
            "missing_cells": bench.missing_cells,
            "fills": bench.stats.fills,
            "cache_hits": bench.stats.cache_hits,
            "cache_misses": bench.stats.cache_misses,
            "elapsed_ms": bench.elapsed_ms,
            "records_per_sec": bench.records_per_sec,
            "fills_per_sec": bench.fills_per_sec,
        });
        println!("{}", line);
    } else {
        println!(
            "bench: policy={} parallel={} records={} channels={} change_columns={}",
            policy, bench.parallel, bench.records_requested, bench.channels, bench.change_columns
        );
        println!(
            "bench: missing_cells={} fills={} cache_hits={} cache_misses={}",
            bench.missing_cells, bench.stats.fills, bench.stats.cache_hits, bench.stats.cache_misses
        );
        println!(
            "bench: elapsed_ms={} records_per_sec={:.2} fills_per_sec={:.2}",
            bench.elapsed_ms, bench.records_per_sec, bench.fills_per_sec
        );
    }

    Ok(())
}
