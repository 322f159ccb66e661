//! Configuration validation.
//!
//! Reads the `[indicators]`, `[signals]` and `[backtest]` sections into a typed
//! `EngineConfig` and rejects anything the engine cannot run with. Validation
//! happens before any data is read.

use crate::domain::backtest::BacktestConfig;
use crate::domain::error::SignaldeskError;
use crate::domain::indicator::IndicatorParams;
use crate::domain::pipeline::EngineConfig;
use crate::domain::signal::SignalParams;
use crate::ports::config_port::ConfigPort;

pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, SignaldeskError> {
    let ind = IndicatorParams::default();
    let indicators = IndicatorParams {
        ema_fast: read_period(config, "indicators", "ema_fast", ind.ema_fast)?,
        ema_slow: read_period(config, "indicators", "ema_slow", ind.ema_slow)?,
        sma_fast: read_period(config, "indicators", "sma_fast", ind.sma_fast)?,
        sma_slow: read_period(config, "indicators", "sma_slow", ind.sma_slow)?,
        rsi_period: read_period(config, "indicators", "rsi_period", ind.rsi_period)?,
        atr_period: read_period(config, "indicators", "atr_period", ind.atr_period)?,
        bb_period: read_period(config, "indicators", "bb_period", ind.bb_period)?,
        bb_mult: read_double(config, "indicators", "bb_mult", ind.bb_mult)?,
    };

    let sig = SignalParams::default();
    let signals = SignalParams {
        rsi_overbought: read_double(config, "signals", "rsi_overbought", sig.rsi_overbought)?,
        rsi_oversold: read_double(config, "signals", "rsi_oversold", sig.rsi_oversold)?,
        ma_kind: match config.get_string("signals", "ma_kind") {
            None => sig.ma_kind,
            Some(raw) => raw.parse()?,
        },
    };

    let bt = BacktestConfig::default();
    let backtest = BacktestConfig {
        take_profit: read_double(config, "backtest", "take_profit", bt.take_profit)?,
        stop_loss: read_double(config, "backtest", "stop_loss", bt.stop_loss)?,
    };

    let engine = EngineConfig {
        indicators,
        signals,
        backtest,
    };
    engine.validate()?;
    Ok(engine)
}

fn read_period(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: usize,
) -> Result<usize, SignaldeskError> {
    let value = match config.get_string(section, key) {
        None => return Ok(default),
        Some(raw) => raw.trim().parse::<i64>().map_err(|_| {
            SignaldeskError::invalid(section, key, format!("{} must be an integer", key))
        })?,
    };
    if value <= 0 {
        return Err(SignaldeskError::invalid(
            section,
            key,
            format!("{} must be positive", key),
        ));
    }
    Ok(value as usize)
}

fn read_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<f64, SignaldeskError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(SignaldeskError::invalid(
                section,
                key,
                format!("{} must be a number", key),
            )),
        },
    }
}

pub fn require_min_period(
    section: &str,
    key: &str,
    value: usize,
    min: usize,
) -> Result<(), SignaldeskError> {
    if value < min {
        return Err(SignaldeskError::invalid(
            section,
            key,
            format!("{} must be at least {}", key, min),
        ));
    }
    Ok(())
}

pub fn require_positive(section: &str, key: &str, value: f64) -> Result<(), SignaldeskError> {
    if !(value.is_finite() && value > 0.0) {
        return Err(SignaldeskError::invalid(
            section,
            key,
            format!("{} must be positive", key),
        ));
    }
    Ok(())
}

pub fn require_negative(section: &str, key: &str, value: f64) -> Result<(), SignaldeskError> {
    if !(value.is_finite() && value < 0.0) {
        return Err(SignaldeskError::invalid(
            section,
            key,
            format!("{} must be negative", key),
        ));
    }
    Ok(())
}

pub fn require_percentage(section: &str, key: &str, value: f64) -> Result<(), SignaldeskError> {
    if !(0.0..=100.0).contains(&value) {
        return Err(SignaldeskError::invalid(
            section,
            key,
            format!("{} must be between 0 and 100", key),
        ));
    }
    Ok(())
}
