//! Rolling ledgers kept for every player

use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One independent aggregate ledger with its own reset policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Timeframe {
    /// Current wipe; cleared per server on wipe and globally on monthly reset
    Wipe,
    /// Current month; cleared globally on monthly reset
    Monthly,
    /// All-time; never cleared
    Overall,
}

impl Timeframe {
    pub const ALL: [Timeframe; 3] = [Timeframe::Wipe, Timeframe::Monthly, Timeframe::Overall];

    pub fn as_str(&self) -> &'static str {
        match self {
            Timeframe::Wipe => "wipe",
            Timeframe::Monthly => "monthly",
            Timeframe::Overall => "overall",
        }
    }

    /// Backing table name
    pub fn table_name(&self) -> &'static str {
        match self {
            Timeframe::Wipe => "stats_wipe",
            Timeframe::Monthly => "stats_monthly",
            Timeframe::Overall => "stats_overall",
        }
    }
}

impl std::fmt::Display for Timeframe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wipe" => Ok(Timeframe::Wipe),
            "monthly" => Ok(Timeframe::Monthly),
            "overall" => Ok(Timeframe::Overall),
            other => Err(format!("unknown timeframe '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_timeframe() {
        assert_eq!("wipe".parse::<Timeframe>(), Ok(Timeframe::Wipe));
        assert_eq!("Monthly".parse::<Timeframe>(), Ok(Timeframe::Monthly));
        assert_eq!(" overall ".parse::<Timeframe>(), Ok(Timeframe::Overall));
        assert!("weekly".parse::<Timeframe>().is_err());
    }
}
