// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 assetflow contributors

//! Small shared helpers

pub mod fs;
pub mod spinner;

use std::time::Duration;

/// Compact human duration, `340ms` below a second and `1.2s` above.
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis >= 1000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else {
        format!("{millis}ms")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::from_millis(340)), "340ms");
        assert_eq!(format_duration(Duration::from_millis(1240)), "1.2s");
        assert_eq!(format_duration(Duration::from_secs(61)), "61.0s");
    }
}
