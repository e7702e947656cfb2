//! Schemas for the common transform types, so graphs can be compiled
//! without an external metadata file.

use super::metadata::{IoDataType, IoMetadata, MetadataRegistry, TransformCategory, TransformMetadata};

pub const SLOT: &str = "SLOT";
pub const SLOT0: &str = "SLOT0";
pub const SLOT1: &str = "SLOT1";

pub const MARKET_DATA_SOURCE_ID: &str = "market_data_source";
pub const TRADE_SIGNAL_EXECUTOR_ID: &str = "trade_signal_executor";

fn decimal_input(slot: &str) -> IoMetadata {
    IoMetadata::new(slot, IoDataType::Decimal)
}

fn boolean_input(slot: &str) -> IoMetadata {
    IoMetadata::new(slot, IoDataType::Boolean)
}

/// Single-input indicator publishing `result`.
fn single_series(id: &str, category: TransformCategory, period: f64) -> TransformMetadata {
    TransformMetadata::new(id, category)
        .input(decimal_input(SLOT))
        .optional_option("period", period)
        .output("result", IoDataType::Decimal)
}

fn comparison(id: &str) -> TransformMetadata {
    TransformMetadata::new(id, TransformCategory::Math)
        .input(decimal_input(SLOT0))
        .input(decimal_input(SLOT1))
        .output("result", IoDataType::Boolean)
}

fn logical(id: &str) -> TransformMetadata {
    TransformMetadata::new(id, TransformCategory::Math)
        .input(boolean_input(SLOT0))
        .input(boolean_input(SLOT1))
        .at_least_one_input()
        .output("result", IoDataType::Boolean)
}

pub fn builtin_metadata() -> Vec<TransformMetadata> {
    vec![
        TransformMetadata::new(MARKET_DATA_SOURCE_ID, TransformCategory::DataSource)
            .named("Market Data")
            .output("o", IoDataType::Decimal)
            .output("h", IoDataType::Decimal)
            .output("l", IoDataType::Decimal)
            .output("c", IoDataType::Decimal)
            .output("v", IoDataType::Decimal),
        TransformMetadata::new("number", TransformCategory::Scalar)
            .required_option("value")
            .output("result", IoDataType::Decimal),
        TransformMetadata::new("bool_true", TransformCategory::Scalar).output("result", IoDataType::Boolean),
        TransformMetadata::new("bool_false", TransformCategory::Scalar).output("result", IoDataType::Boolean),
        single_series("sma", TransformCategory::Trend, 20.0),
        single_series("ema", TransformCategory::Trend, 20.0),
        single_series("wma", TransformCategory::Trend, 20.0),
        single_series("rsi", TransformCategory::Momentum, 14.0),
        TransformMetadata::new("macd", TransformCategory::Momentum)
            .input(decimal_input(SLOT))
            .optional_option("short_period", 12.0)
            .optional_option("long_period", 26.0)
            .optional_option("signal_period", 9.0)
            .output("macd", IoDataType::Decimal)
            .output("macd_signal", IoDataType::Decimal)
            .output("macd_histogram", IoDataType::Decimal),
        TransformMetadata::new("bbands", TransformCategory::Volatility)
            .input(decimal_input(SLOT))
            .optional_option("period", 20.0)
            .optional_option("stddev", 2.0)
            .output("bbands_upper", IoDataType::Decimal)
            .output("bbands_middle", IoDataType::Decimal)
            .output("bbands_lower", IoDataType::Decimal),
        TransformMetadata::new("stoch", TransformCategory::Momentum)
            .optional_option("k_period", 14.0)
            .optional_option("d_period", 3.0)
            .output("stoch_k", IoDataType::Decimal)
            .output("stoch_d", IoDataType::Decimal),
        TransformMetadata::new("atr", TransformCategory::Volatility)
            .optional_option("period", 14.0)
            .output("result", IoDataType::Decimal),
        TransformMetadata::new("adx", TransformCategory::Trend)
            .optional_option("period", 14.0)
            .output("result", IoDataType::Decimal),
        TransformMetadata::new("obv", TransformCategory::Volume).output("result", IoDataType::Decimal),
        comparison("gt"),
        comparison("gte"),
        comparison("lt"),
        comparison("lte"),
        comparison("eq"),
        comparison("crossover"),
        comparison("crossunder"),
        logical("logical_and"),
        logical("logical_or"),
        TransformMetadata::new(TRADE_SIGNAL_EXECUTOR_ID, TransformCategory::Executor)
            .named("Trade Signal Executor")
            .input(boolean_input("enter_long"))
            .input(boolean_input("enter_short"))
            .input(boolean_input("exit_long"))
            .input(boolean_input("exit_short"))
            .at_least_one_input()
            .output("enter_long", IoDataType::Boolean)
            .output("enter_short", IoDataType::Boolean)
            .output("exit_long", IoDataType::Boolean)
            .output("exit_short", IoDataType::Boolean),
    ]
}

impl MetadataRegistry {
    pub fn with_builtins() -> Self {
        builtin_metadata().into_iter().collect()
    }
}
