use rust_decimal::{Decimal, MathematicalOps};
use rust_decimal_macros::dec;

use crate::types::{CompStats, SaleRecord};

pub fn compute_stats(sales: &[SaleRecord]) -> CompStats {
    if sales.is_empty() {
        return CompStats::default();
    }

    let mut prices: Vec<Decimal> = sales.iter().map(|s| s.sale_price).collect();
    prices.sort();

    let n = prices.len();

    CompStats {
        count: n,
        median: Some(median_sorted(&prices)),
        mean: Some(mean_of(&prices)),
        min: prices.first().copied(),
        max: prices.last().copied(),
    }
}

// Prices near the top of the Decimal range overflow a plain sum; scale each term first
// and fall back to the largest price if even that leaves the range.
fn mean_of(prices: &[Decimal]) -> Decimal {
    let n = Decimal::from(prices.len());
    match prices.iter().try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p)) {
        Some(sum) => sum / n,
        None => prices
            .iter()
            .try_fold(Decimal::ZERO, |acc, p| acc.checked_add(*p / n))
            .or_else(|| prices.iter().copied().max())
            .unwrap_or(Decimal::ZERO),
    }
}

fn median_sorted(prices: &[Decimal]) -> Decimal {
    let n = prices.len();
    if n % 2 == 1 {
        return prices[n / 2];
    }
    let (lo, hi) = (prices[n / 2 - 1], prices[n / 2]);
    match lo.checked_add(hi) {
        Some(s) => s / dec!(2),
        None => (lo / dec!(2)).checked_add(hi / dec!(2)).unwrap_or(hi),
    }
}

/// Sample standard deviation (n - 1 denominator). Zero for fewer than two points,
/// and zero when the squared deviations leave the Decimal range.
pub fn sample_stddev(sales: &[SaleRecord]) -> Decimal {
    let n = sales.len();
    if n < 2 {
        return Decimal::ZERO;
    }

    let prices: Vec<Decimal> = sales.iter().map(|s| s.sale_price).collect();
    let mean = mean_of(&prices);
    let sq = prices.iter().try_fold(Decimal::ZERO, |acc, p| {
        let d = p.checked_sub(mean)?;
        acc.checked_add(d.checked_mul(d)?)
    });

    match sq {
        Some(sq) => (sq / Decimal::from(n - 1)).sqrt().unwrap_or(Decimal::ZERO),
        None => {
            tracing::debug!(count = n, "price dispersion out of range, ignoring");
            Decimal::ZERO
        }
    }
}

#[cfg(test)]
pub(crate) fn sales_at(prices: &[Decimal]) -> Vec<SaleRecord> {
    let now = chrono::Utc::now();
    prices
        .iter()
        .enumerate()
        .map(|(i, p)| SaleRecord {
            sale_price: *p,
            sold_at: now - chrono::Duration::days(i as i64 + 1),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_history_has_no_stats() {
        let s = compute_stats(&[]);
        assert_eq!(s.count, 0);
        assert_eq!(s.median, None);
        assert_eq!(s.mean, None);
        assert_eq!(s.min, None);
        assert_eq!(s.max, None);
    }

    #[test]
    fn odd_count() {
        let s = compute_stats(&sales_at(&[dec!(300), dec!(100), dec!(200)]));
        assert_eq!(s.count, 3);
        assert_eq!(s.median, Some(dec!(200)));
        assert_eq!(s.mean, Some(dec!(200)));
        assert_eq!(s.min, Some(dec!(100)));
        assert_eq!(s.max, Some(dec!(300)));
    }

    #[test]
    fn even_count_averages_middle_pair() {
        let s = compute_stats(&sales_at(&[dec!(1500), dec!(1600), dec!(1550), dec!(1620)]));
        assert_eq!(s.count, 4);
        assert_eq!(s.median, Some(dec!(1575)));
        assert_eq!(s.mean, Some(dec!(1567.5)));
        assert_eq!(s.min, Some(dec!(1500)));
        assert_eq!(s.max, Some(dec!(1620)));
    }

    #[test]
    fn single_sale() {
        let s = compute_stats(&sales_at(&[dec!(150)]));
        assert_eq!(s.count, 1);
        assert_eq!(s.median, Some(dec!(150)));
        assert_eq!(s.min, s.max);
    }

    #[test]
    fn median_within_range() {
        let lists: [&[Decimal]; 4] = [
            &[dec!(5)],
            &[dec!(9.99), dec!(1)],
            &[dec!(40), dec!(12), dec!(12), dec!(700), dec!(33)],
            &[dec!(0.5), dec!(0.5), dec!(0.5)],
        ];
        for prices in lists {
            let s = compute_stats(&sales_at(prices));
            let (min, med, max) = (s.min.unwrap(), s.median.unwrap(), s.max.unwrap());
            assert!(min <= med && med <= max, "{min} <= {med} <= {max}");
            assert_eq!(s.count, prices.len());
        }
    }

    #[test]
    fn stddev() {
        assert_eq!(sample_stddev(&sales_at(&[dec!(50)])), Decimal::ZERO);
        assert_eq!(sample_stddev(&sales_at(&[dec!(10), dec!(10), dec!(10)])), Decimal::ZERO);

        // variance of [2, 4, 4, 4, 5, 5, 7, 9] with n-1 is 32/7
        let sd = sample_stddev(&sales_at(&[
            dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9),
        ]));
        assert!((sd - dec!(2.138)).abs() < dec!(0.001), "{sd}");
    }

    #[test]
    fn huge_spread_gives_no_dispersion() {
        let sd = sample_stddev(&sales_at(&[dec!(1), dec!(1000000000000000), dec!(2000000000000000)]));
        assert_eq!(sd, Decimal::ZERO);
    }

    #[test]
    fn stats_at_top_of_range() {
        let s = compute_stats(&sales_at(&[Decimal::MAX, Decimal::MAX]));
        assert_eq!(s.count, 2);
        assert!(Decimal::MAX - s.median.unwrap() <= Decimal::ONE);
        let mean = s.mean.unwrap();
        assert!(mean > Decimal::ZERO && mean <= Decimal::MAX);

        let s = compute_stats(&sales_at(&[Decimal::MAX, dec!(1), Decimal::MAX]));
        assert_eq!(s.median, Some(Decimal::MAX));
        assert!(s.mean.unwrap() <= Decimal::MAX);
    }
}
