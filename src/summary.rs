//! Travelogue overview.
//!
//! Gives a quick summary of what was assembled: overall date range, per-day
//! artifact counts, and one line per artifact. Used by `travelog summary`
//! and logged after `travelog build`.

use serde::Serialize;
use std::fmt;

use crate::models::local_datetime;
use crate::travelogue::Travelogue;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub days: Vec<DaySummary>,
    pub artifacts: Vec<String>,
    pub undated: Vec<String>,
}

pub fn summarize(travelogue: &Travelogue) -> Summary {
    let offset = travelogue.offset();
    let iso = |ts: Option<i64>| {
        ts.and_then(|ts| local_datetime(ts, offset))
            .map(|dt| dt.to_rfc3339())
    };

    let days = travelogue
        .days()
        .map(|day| DaySummary {
            date: day.key(),
            count: day.len(),
        })
        .collect();
    let artifacts = travelogue
        .days()
        .flat_map(|day| day.sorted())
        .map(|a| a.describe(offset))
        .collect();
    let undated = travelogue
        .undated()
        .iter()
        .map(|a| a.describe(offset))
        .collect();

    Summary {
        start_date: iso(travelogue.start_date()),
        end_date: iso(travelogue.end_date()),
        days,
        artifacts,
        undated,
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Travelogue")?;
        writeln!(f, "==========")?;
        writeln!(f)?;
        writeln!(
            f,
            "  Start:    {}",
            self.start_date.as_deref().unwrap_or("-")
        )?;
        writeln!(f, "  End:      {}", self.end_date.as_deref().unwrap_or("-"))?;
        writeln!(f, "  Days:     {}", self.days.len())?;
        writeln!(f, "  Undated:  {}", self.undated.len())?;

        if !self.days.is_empty() {
            writeln!(f)?;
            for day in &self.days {
                writeln!(f, "  {}  {:>5} artifacts", day.date, day.count)?;
            }
        }

        if !self.artifacts.is_empty() || !self.undated.is_empty() {
            writeln!(f)?;
            for line in self.artifacts.iter().chain(self.undated.iter()) {
                writeln!(f, "  {}", line)?;
            }
        }
        Ok(())
    }
}
