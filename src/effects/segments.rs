use rand::Rng;

use crate::media::Clip;

/// Segments shorter than this are dropped when a clip is cut apart (seconds)
pub const MIN_SEGMENT: f64 = 0.001;

/// `count` uniform points in `[0, duration]`, ascending
pub fn split_points<R: Rng + ?Sized>(count: u32, duration: f64, rng: &mut R) -> Vec<f64> {
    let mut points: Vec<f64> = (0..count)
        .map(|_| rng.gen_range(0.0..=duration))
        .collect();
    points.sort_by(f64::total_cmp);
    points
}

/// Cut `clip` at every point, keeping the pieces in order.
///
/// `n` points yield up to `n + 1` segments that cover the whole clip; pieces
/// shorter than [`MIN_SEGMENT`] are discarded.
pub fn split_at(clip: &Clip, points: &[f64]) -> Vec<Clip> {
    let duration = clip.duration();
    let mut bounds = Vec::with_capacity(points.len() + 2);
    bounds.push(0.0);
    bounds.extend(points.iter().map(|p| p.clamp(0.0, duration)));
    bounds.push(duration);

    bounds
        .windows(2)
        .filter(|pair| pair[1] - pair[0] >= MIN_SEGMENT)
        .map(|pair| clip.clone().subclip(pair[0], pair[1]))
        .collect()
}

/// A random window of `length` seconds, clamped to the clip
pub fn random_window<R: Rng + ?Sized>(clip: &Clip, length: f64, rng: &mut R) -> Clip {
    let duration = clip.duration();
    let length = length.clamp(0.0, duration);
    let slack = duration - length;
    let start = if slack > 0.0 { rng.gen_range(0.0..=slack) } else { 0.0 };
    clip.clone().subclip(start, start + length)
}
