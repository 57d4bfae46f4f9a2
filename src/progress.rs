//! Text progress bars for per-clip logging

const FILLED: char = '█';

/// `|█████     | 50.0%` style bar for `current` out of `total` steps
pub fn progress_bar(current: usize, total: usize, width: usize) -> String {
    let fraction = if total == 0 {
        1.0
    } else {
        (current as f64 / total as f64).clamp(0.0, 1.0)
    };
    let filled = (fraction * width as f64) as usize;

    format!(
        "|{}{}| {:.1}%",
        FILLED.to_string().repeat(filled),
        " ".repeat(width - filled),
        fraction * 100.0
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0, 4, 4), "|    | 0.0%");
        assert_eq!(progress_bar(2, 4, 4), "|██  | 50.0%");
        assert_eq!(progress_bar(4, 4, 4), "|████| 100.0%");
        assert_eq!(progress_bar(1, 3, 10), "|███       | 33.3%");
    }

    #[test]
    fn test_progress_bar_degenerate_total() {
        assert_eq!(progress_bar(0, 0, 2), "|██| 100.0%");
        assert_eq!(progress_bar(9, 3, 2), "|██| 100.0%");
    }
}
