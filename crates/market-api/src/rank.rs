use crate::krx::MarketQuote;
use std::cmp::Ordering;

/// A row selected for the daily ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct TopMover {
    pub ticker: String,
    pub change_rate: f64,
}

/// Picks the `n` rows with the largest change rate.
///
/// Rows whose change rate did not parse are dropped. The sort is stable, so
/// equal rates keep the provider's row order. Fewer than `n` survivors yield
/// fewer results.
pub fn top_movers(quotes: &[MarketQuote], n: usize) -> Vec<TopMover> {
    let mut movers: Vec<TopMover> = quotes
        .iter()
        .filter_map(|q| {
            q.change_rate.map(|change_rate| TopMover {
                ticker: q.ticker.clone(),
                change_rate,
            })
        })
        .collect();

    movers.sort_by(|a, b| {
        b.change_rate
            .partial_cmp(&a.change_rate)
            .unwrap_or(Ordering::Equal)
    });
    movers.truncate(n);
    movers
}
