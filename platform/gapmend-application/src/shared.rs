use crate::config::Config;
use gapmend_domain::entities::stats::MissingProcessingStats;
use gapmend_domain::repositories::dataset::DatasetProfile;
use gapmend_domain::services::fill::{EngineOptions, FillPolicy};
use std::time::Duration;

pub fn parse_fill_policy(label: &str) -> Result<FillPolicy, String> {
    match label.trim().to_lowercase().as_str() {
        "weighted" | "interpolated" => Ok(FillPolicy::Weighted),
        "midpoint" | "average" => Ok(FillPolicy::Midpoint),
        _ => Err("fill.policy must be: weighted | midpoint".to_string()),
    }
}

pub fn resolve_fill_policy(config: &Config) -> Result<FillPolicy, String> {
    parse_fill_policy(
        config
            .fill
            .as_ref()
            .and_then(|fill| fill.policy.as_deref())
            .unwrap_or("weighted"),
    )
}

pub fn resolve_round_decimals(config: &Config) -> Option<u32> {
    config.fill.as_ref().and_then(|fill| fill.round_decimals)
}

pub fn resolve_engine_options(config: &Config) -> Result<EngineOptions, String> {
    let mut options = EngineOptions {
        policy: resolve_fill_policy(config)?,
        ..EngineOptions::default()
    };

    if let Some(columns) = config.columns.as_ref() {
        if let Some(count) = columns.change_columns_per_row {
            if count == 0 {
                return Err("columns.change_columns_per_row must be > 0".to_string());
            }
            options.change_columns_per_row = Some(count);
        }
    }

    if let Some(cache) = config.cache.as_ref() {
        if let Some(capacity) = cache.capacity {
            if capacity == 0 {
                return Err("cache.capacity must be > 0".to_string());
            }
            options.cache_capacity = capacity;
        }
        options.cache_ttl = cache.ttl_seconds.map(Duration::from_secs);
    }

    if let Some(parallel) = config.parallel.as_ref() {
        options.parallel_value_columns = parallel.value_columns;
        if let Some(workers) = parallel.workers {
            if workers == 0 {
                return Err("parallel.workers must be > 0".to_string());
            }
            options.workers = Some(workers);
        }
    }

    Ok(options)
}

pub fn parse_timestamp_seconds(raw: &str) -> Result<i64, String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("timestamp cannot be empty".to_string());
    }
    if let Ok(v) = trimmed.parse::<i64>() {
        return Ok(v);
    }
    let dt = chrono::DateTime::parse_from_rfc3339(trimmed)
        .map_err(|err| format!("invalid timestamp (expected epoch seconds or RFC3339): {err}"))?;
    Ok(dt.timestamp())
}

pub fn resolve_window(config: &Config) -> Result<(Option<i64>, Option<i64>), String> {
    let start = config
        .run
        .start
        .as_deref()
        .map(parse_timestamp_seconds)
        .transpose()?;
    let end = config
        .run
        .end
        .as_deref()
        .map(parse_timestamp_seconds)
        .transpose()?;
    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err("run.start must not be after run.end".to_string());
        }
    }
    Ok((start, end))
}

pub fn summary_json(
    config: &Config,
    profile: &DatasetProfile,
    stats: &MissingProcessingStats,
    periods: usize,
    engine_ms: u64,
) -> serde_json::Value {
    serde_json::json!({
        "run_id": config.run.run_id,
        "dataset": config.run.dataset,
        "profile": profile,
        "periods": periods,
        "stats": stats,
        "engine_ms": engine_ms,
        "fill": {
            "policy": config.fill.as_ref().and_then(|f| f.policy.as_deref()).unwrap_or("weighted"),
            "round_decimals": config.fill.as_ref().and_then(|f| f.round_decimals),
        },
        "parallel": {
            "value_columns": config.parallel.as_ref().map(|p| p.value_columns).unwrap_or(false),
            "workers": config.parallel.as_ref().and_then(|p| p.workers),
        },
    })
}
