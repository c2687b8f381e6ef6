//! Finance quote extraction and terminal charting.

use crate::error::{FinnError, Result};
use chrono::NaiveTime;
use serde::Serialize;
use serde_json::Value;

/// Graph timestamps look like `Mar 29 2024, 02:15 PM UTC-04:00`; the clock
/// time sits at this fixed character range.
const TIME_RANGE: std::ops::Range<usize> = 13..21;

const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One point of the intraday price graph.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: String,
    pub price: f64,
}

/// Latest quote and intraday graph for a symbol.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FinanceQuote {
    pub price: String,
    pub movement: String,
    pub movement_value: String,
    pub graph: Vec<PricePoint>,
}

impl FinanceQuote {
    /// Read the quote summary and graph from a google_finance response.
    pub fn from_response(body: &Value) -> Result<Self> {
        let price = field(body, "/summary/price", "summary.price")?;
        let movement = field(body, "/summary/price_movement/movement", "summary.price_movement.movement")?;
        let movement_value = field(body, "/summary/price_movement/value", "summary.price_movement.value")?;

        let graph = body
            .get("graph")
            .and_then(|g| g.as_array())
            .ok_or_else(|| FinnError::MissingResult("graph".to_string()))?
            .iter()
            .filter_map(|point| {
                let date = point.get("date")?.as_str()?.to_string();
                let price = point.get("price")?.as_f64()?;
                Some(PricePoint { date, price })
            })
            .collect();

        Ok(Self {
            price,
            movement,
            movement_value,
            graph,
        })
    }

    /// One-line summary of the quote.
    pub fn describe(&self) -> String {
        format!(
            "The last or closing price is {} which is {} by {}.",
            self.price, self.movement, self.movement_value
        )
    }
}

fn field(body: &Value, pointer: &str, name: &str) -> Result<String> {
    match body.pointer(pointer) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Null) | None => Err(FinnError::MissingResult(name.to_string())),
        Some(other) => Ok(other.to_string()),
    }
}

/// Convert a graph timestamp to a 24-hour `HH:MM` clock time.
///
/// ```
/// assert_eq!(finn::search::extract_time("Mar 29 2024, 02:15 PM UTC-04:00").unwrap(), "14:15");
/// ```
pub fn extract_time(date: &str) -> Result<String> {
    let slice = date
        .get(TIME_RANGE)
        .ok_or_else(|| FinnError::TimeParse(date.to_string()))?;

    let time = NaiveTime::parse_from_str(slice, "%I:%M %p")
        .map_err(|_| FinnError::TimeParse(date.to_string()))?;

    Ok(time.format("%H:%M").to_string())
}

/// Render prices as a sparkline at most `width` characters wide, with the
/// first and last clock times underneath.
pub fn price_chart(points: &[PricePoint], width: usize) -> Result<String> {
    if points.is_empty() || width == 0 {
        return Ok(String::new());
    }

    let bucket = points.len().div_ceil(width);
    let values: Vec<f64> = points
        .chunks(bucket)
        .map(|c| c.iter().map(|p| p.price).sum::<f64>() / c.len() as f64)
        .collect();

    let low = values.iter().copied().fold(f64::INFINITY, f64::min);
    let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = high - low;

    let spark: String = values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                LEVELS[LEVELS.len() / 2]
            } else {
                let idx = ((v - low) / span * (LEVELS.len() - 1) as f64).round() as usize;
                LEVELS[idx.min(LEVELS.len() - 1)]
            }
        })
        .collect();

    let start = extract_time(&points[0].date)?;
    let end = extract_time(&points[points.len() - 1].date)?;
    let gap = values.len().saturating_sub(start.len() + end.len()).max(1);

    Ok(format!(
        "{}\n{}{}{}\nlow {:.2}  high {:.2}",
        spark,
        start,
        " ".repeat(gap),
        end,
        low,
        high
    ))
}
