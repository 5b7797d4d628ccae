//! Seasonally adjusted simple-moving-average demand forecast.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use uuid::Uuid;

use crate::config::GeneratorConfig;
use crate::errors::ServiceError;
use crate::models::{ForecastPoint, MonthlyTotal};
use crate::services::calendar::{months_after, seasonal_multiplier};

/// Mean of the trailing `window` months, or of all months when fewer exist.
///
/// The mean is left unrounded; rounding happens after damping, not before.
///
/// `None` when there is no history.
pub fn base_demand(history: &[MonthlyTotal], window: usize) -> Option<f64> {
    if history.is_empty() {
        return None;
    }
    let window = window.max(1);
    let recent = if history.len() >= window {
        &history[history.len() - window..]
    } else {
        history
    };
    let total: i64 = recent.iter().map(|m| m.total_quantity).sum();
    Some(total as f64 / recent.len() as f64)
}

/// Forecasts the next `forecast_horizon` calendar months for one product.
///
/// Products without sales history get no points. Otherwise the base demand is
/// scaled by a damping factor drawn from `damp_min..=damp_max`, rounded and
/// floored at 1, then each target month applies its seasonal multiplier.
pub fn forecast_demand<R: Rng + ?Sized>(
    product_id: Uuid,
    history: &[MonthlyTotal],
    config: &GeneratorConfig,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<Vec<ForecastPoint>, ServiceError> {
    check_draw_ranges(config)?;
    let Some(base) = base_demand(history, config.forecast_window) else {
        return Ok(Vec::new());
    };

    let damp = rng.gen_range(config.damp_min..=config.damp_max);
    let damped = ((base * damp).round() as i64).max(1);

    let mut points = Vec::with_capacity(config.forecast_horizon as usize);
    for offset in 1..=config.forecast_horizon {
        let target = months_after(now, offset)?;
        let multiplier = seasonal_multiplier(&config.seasonal_multipliers, target.month0());
        let predicted_demand = ((damped as f64 * multiplier).round() as i64).max(1);
        let confidence_score = rng.gen_range(config.confidence_min..=config.confidence_max);

        points.push(ForecastPoint {
            product_id,
            date: target.date_naive(),
            predicted_demand,
            confidence_score,
            model_type: config.model_type.clone(),
        });
    }

    Ok(points)
}

fn check_draw_ranges(config: &GeneratorConfig) -> Result<(), ServiceError> {
    if !config.damp_min.is_finite()
        || !config.damp_max.is_finite()
        || config.damp_min > config.damp_max
    {
        return Err(ServiceError::ValidationError(format!(
            "damp range {}..={} is empty",
            config.damp_min, config.damp_max
        )));
    }
    if config.confidence_min > config.confidence_max || config.confidence_max > 100 {
        return Err(ServiceError::ValidationError(format!(
            "confidence range {}..={} is outside 0..=100 or empty",
            config.confidence_min, config.confidence_max
        )));
    }
    Ok(())
}
