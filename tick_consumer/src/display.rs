//! Consumer-local display state.
//!
//! Previous-value, previous-average and direction indicators live here, in
//! this process only — none of it is shared. The render layout imposes no
//! synchronization requirements; it just reads the last recomputed state.

use std::io::{self, Write};
use tick::series::Commodity;

/// Direction of a value between two successive renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Trend {
    /// No previous value, or unchanged.
    #[default]
    Flat,
    /// Higher than the previous render.
    Up,
    /// Lower than the previous render.
    Down,
}

impl Trend {
    fn between(prev: f64, next: f64) -> Self {
        if next > prev {
            Self::Up
        } else if next < prev {
            Self::Down
        } else {
            Self::Flat
        }
    }

    fn arrow(self) -> &'static str {
        match self {
            Self::Up => "↑",
            Self::Down => "↓",
            Self::Flat => " ",
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct Row {
    price: Option<f64>,
    price_trend: Trend,
    average: Option<f64>,
    average_trend: Trend,
}

/// Last-known dashboard state, one row per series.
#[derive(Debug, Default)]
pub struct DisplayState {
    rows: [Row; Commodity::COUNT],
}

impl DisplayState {
    /// Fresh state with no rows populated.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a recomputed (latest, average) pair for one series into the
    /// state, updating the direction indicators against the previous render.
    ///
    /// `average` is `None` until the series' ring has wrapped once; the
    /// average column stays blank for that warm-up period.
    pub fn apply(&mut self, series: Commodity, price: f64, average: Option<f64>) {
        let row = &mut self.rows[series.index()];

        row.price_trend = match row.price {
            Some(prev) => Trend::between(prev, price),
            None => Trend::Flat,
        };
        row.price = Some(price);

        if let Some(avg) = average {
            row.average_trend = match row.average {
                Some(prev) => Trend::between(prev, avg),
                None => Trend::Flat,
            };
            row.average = Some(avg);
        }
    }

    /// Render the full board: clear screen, then one line per series.
    pub fn render(&self, out: &mut impl Write) -> io::Result<()> {
        let border = format!("+{}+", "-".repeat(45));
        write!(out, "\x1b[1;1H\x1b[2J")?;
        writeln!(out, "{border}")?;
        writeln!(out, "| {:<13} | {:>12} | {:>12} |", "COMMODITY", "PRICE", "AVG PRICE")?;
        writeln!(out, "{border}")?;
        for (i, row) in self.rows.iter().enumerate() {
            // Index always valid: rows is sized from the series set.
            let Some(series) = Commodity::from_u8(i as u8) else {
                continue;
            };
            let price = match row.price {
                Some(p) => format!("{:>10.2} {}", p, row.price_trend.arrow()),
                None => format!("{:>12}", "--"),
            };
            let average = match row.average {
                Some(a) => format!("{:>10.2} {}", a, row.average_trend.arrow()),
                None => format!("{:>12}", "--"),
            };
            writeln!(out, "| {:<13} | {} | {} |", series.as_str(), price, average)?;
        }
        writeln!(out, "{border}")?;
        out.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sample_has_flat_trend() {
        let mut state = DisplayState::new();
        state.apply(Commodity::Gold, 1800.0, None);
        assert_eq!(state.rows[Commodity::Gold.index()].price_trend, Trend::Flat);
    }

    #[test]
    fn trends_follow_successive_prices() {
        let mut state = DisplayState::new();
        state.apply(Commodity::Gold, 1800.0, None);
        state.apply(Commodity::Gold, 1810.0, None);
        assert_eq!(state.rows[Commodity::Gold.index()].price_trend, Trend::Up);

        state.apply(Commodity::Gold, 1805.0, None);
        assert_eq!(state.rows[Commodity::Gold.index()].price_trend, Trend::Down);

        state.apply(Commodity::Gold, 1805.0, None);
        assert_eq!(state.rows[Commodity::Gold.index()].price_trend, Trend::Flat);
    }

    #[test]
    fn average_stays_blank_during_warmup() {
        let mut state = DisplayState::new();
        state.apply(Commodity::Silver, 23.5, None);
        assert!(state.rows[Commodity::Silver.index()].average.is_none());

        state.apply(Commodity::Silver, 23.7, Some(23.6));
        let row = &state.rows[Commodity::Silver.index()];
        assert_eq!(row.average, Some(23.6));
        assert_eq!(row.average_trend, Trend::Flat);
    }

    #[test]
    fn series_rows_are_independent() {
        let mut state = DisplayState::new();
        state.apply(Commodity::Gold, 1800.0, None);
        state.apply(Commodity::Zinc, 3.2, None);
        state.apply(Commodity::Gold, 1790.0, None);

        assert_eq!(state.rows[Commodity::Gold.index()].price_trend, Trend::Down);
        assert_eq!(state.rows[Commodity::Zinc.index()].price_trend, Trend::Flat);
    }

    #[test]
    fn render_lists_every_series() {
        let mut state = DisplayState::new();
        state.apply(Commodity::Gold, 1800.0, Some(1795.0));

        let mut out = Vec::new();
        state.render(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        for series in Commodity::ALL {
            assert!(text.contains(series.as_str()));
        }
        assert!(text.contains("1800.00"));
        assert!(text.contains("1795.00"));
        // Unpopulated rows show the placeholder.
        assert!(text.contains("--"));
    }
}
