use rand::seq::index;
use rand::Rng;
use tracing::info;

/// Sample `count` items: as many distinct ones as there are, then the
/// remainder with replacement.
///
/// Returns an empty list when `items` is empty.
pub fn sample_with_padding<T: Clone, R: Rng + ?Sized>(
    items: &[T],
    count: usize,
    rng: &mut R,
) -> Vec<T> {
    if items.is_empty() {
        return Vec::new();
    }

    let distinct = count.min(items.len());
    let mut chosen: Vec<T> = index::sample(rng, items.len(), distinct)
        .into_iter()
        .map(|i| items[i].clone())
        .collect();

    if count > items.len() {
        let extra = count - items.len();
        info!("Requested {} but only {} available - re-using {}", count, items.len(), extra);
        chosen.extend((0..extra).map(|_| items[rng.gen_range(0..items.len())].clone()));
    }

    chosen
}

/// Uniform value in `[lo, hi]`; an empty or inverted range yields `lo`
pub fn draw_between<R: Rng + ?Sized>(lo: f64, hi: f64, rng: &mut R) -> f64 {
    if hi > lo {
        rng.gen_range(lo..=hi)
    } else {
        lo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_sample_is_distinct_when_enough() {
        let items: Vec<u32> = (0..10).collect();
        let mut rng = StdRng::seed_from_u64(42);

        let chosen = sample_with_padding(&items, 7, &mut rng);

        assert_eq!(chosen.len(), 7);
        let unique: HashSet<_> = chosen.iter().collect();
        assert_eq!(unique.len(), 7);
    }

    #[test]
    fn test_sample_pads_with_replacement() {
        let items = vec!["a", "b", "c"];
        let mut rng = StdRng::seed_from_u64(42);

        let chosen = sample_with_padding(&items, 5, &mut rng);

        assert_eq!(chosen.len(), 5);
        let head: HashSet<_> = chosen[..3].iter().collect();
        assert_eq!(head.len(), 3);
        assert!(chosen[3..].iter().all(|c| items.contains(c)));
    }

    #[test]
    fn test_sample_edge_cases() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(sample_with_padding::<u8, _>(&[], 4, &mut rng).is_empty());
        assert!(sample_with_padding(&[1, 2], 0, &mut rng).is_empty());
    }

    #[test]
    fn test_draw_between_inverted_range() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(draw_between(3.0, 1.0, &mut rng), 3.0);
        let x = draw_between(1.0, 2.0, &mut rng);
        assert!((1.0..=2.0).contains(&x));
    }
}
