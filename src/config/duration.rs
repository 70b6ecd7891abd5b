// src/config/duration.rs

use std::time::Duration;

/// Parse durations like `"250ms"`, `"3s"`, `"2h"` or compound `"1m30s"`.
///
/// Every number needs a unit (`ms`, `s`, `m`, `h`).
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let mut total = Duration::ZERO;
    let mut rest = s;
    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(format!("invalid duration '{s}': expected a number at '{rest}'"));
        }
        let (number, tail) = rest.split_at(digits);
        let value: u64 = number
            .parse()
            .map_err(|e| format!("invalid duration number '{number}': {e}"))?;

        let unit_len = tail.find(|c: char| c.is_ascii_digit()).unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let overflow = || format!("duration '{s}' overflows");
        let secs = |factor: u64| value.checked_mul(factor).map(Duration::from_secs);
        let part = match unit.trim().to_lowercase().as_str() {
            "ms" => Some(Duration::from_millis(value)),
            "s" => Some(Duration::from_secs(value)),
            "m" => secs(60),
            "h" => secs(3600),
            "" => return Err(format!("duration '{s}' is missing a unit suffix")),
            other => {
                return Err(format!(
                    "unsupported duration unit '{other}'; expected ms, s, m, or h"
                ));
            }
        }
        .ok_or_else(overflow)?;

        total = total.checked_add(part).ok_or_else(overflow)?;
        rest = tail;
    }

    Ok(total)
}
