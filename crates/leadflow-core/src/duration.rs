// Leadflow Core - Duration string parsing
//
// Delay, retry and timeout fields in workflow documents are human-readable
// strings ("500ms", "30s", "5m", "1h", "3d"). A bare number parses as
// seconds.

use std::time::Duration;

use crate::error::{LeadflowError, LeadflowResult};

/// Parse a duration string (e.g. "30s", "5m", "1h")
pub fn parse_duration(s: &str) -> LeadflowResult<Duration> {
    let s = s.trim();

    if s.is_empty() {
        return Err(LeadflowError::config("empty duration string"));
    }

    if let Some(num) = s.strip_suffix("ms") {
        let num: u64 = num
            .parse()
            .map_err(|_| LeadflowError::config(format!("invalid duration: {}", s)))?;
        return Ok(Duration::from_millis(num));
    }

    if let Some(num) = s.strip_suffix('s') {
        let num: u64 = num
            .parse()
            .map_err(|_| LeadflowError::config(format!("invalid duration: {}", s)))?;
        return Ok(Duration::from_secs(num));
    }

    if let Some(num) = s.strip_suffix('m') {
        let num: u64 = num
            .parse()
            .map_err(|_| LeadflowError::config(format!("invalid duration: {}", s)))?;
        return scaled_secs(num, 60, s);
    }

    if let Some(num) = s.strip_suffix('h') {
        let num: u64 = num
            .parse()
            .map_err(|_| LeadflowError::config(format!("invalid duration: {}", s)))?;
        return scaled_secs(num, 3600, s);
    }

    if let Some(num) = s.strip_suffix('d') {
        let num: u64 = num
            .parse()
            .map_err(|_| LeadflowError::config(format!("invalid duration: {}", s)))?;
        return scaled_secs(num, 86400, s);
    }

    let num: u64 = s
        .parse()
        .map_err(|_| LeadflowError::config(format!("invalid duration: {}", s)))?;
    Ok(Duration::from_secs(num))
}

fn scaled_secs(num: u64, unit_secs: u64, original: &str) -> LeadflowResult<Duration> {
    num.checked_mul(unit_secs)
        .map(Duration::from_secs)
        .ok_or_else(|| LeadflowError::config(format!("duration out of range: {}", original)))
}
