//! # Effects
//!
//! The fixed set of randomized edits a video clip may receive.
//!
//! An effect is picked in two steps: [`choose_effect`] picks a kind from the
//! enabled set and draws its parameters, then [`apply`] rewrites the clip's
//! edit tree. Both steps consume the same generator so a seed always yields
//! the same edit.

pub mod segments;

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::EffectsConfig;
use crate::media::Clip;

use segments::{random_window, split_at, split_points};

/// Names of the available effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EffectKind {
    SpeedScale,
    MirrorX,
    TimeReverse,
    SymmetrizeSpeed,
    Repeat,
    Shuffle,
    ContinuousFlip,
    FlipRotation,
    Contrast,
}

impl EffectKind {
    pub const ALL: [EffectKind; 9] = [
        EffectKind::SpeedScale,
        EffectKind::MirrorX,
        EffectKind::TimeReverse,
        EffectKind::SymmetrizeSpeed,
        EffectKind::Repeat,
        EffectKind::Shuffle,
        EffectKind::ContinuousFlip,
        EffectKind::FlipRotation,
        EffectKind::Contrast,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::SpeedScale => "speed-scale",
            Self::MirrorX => "mirror-x",
            Self::TimeReverse => "time-reverse",
            Self::SymmetrizeSpeed => "symmetrize-speed",
            Self::Repeat => "repeat",
            Self::Shuffle => "shuffle",
            Self::ContinuousFlip => "continuous-flip",
            Self::FlipRotation => "flip-rotation",
            Self::Contrast => "contrast",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::SpeedScale => "Speed the clip up or slow it down",
            Self::MirrorX => "Mirror horizontally",
            Self::TimeReverse => "Play backwards",
            Self::SymmetrizeSpeed => "Forward then backward, sped up",
            Self::Repeat => "Stutter a tiny window of the clip",
            Self::Shuffle => "Cut into many pieces and shuffle them",
            Self::ContinuousFlip => "Flip pieces of the clip on random axes",
            Self::FlipRotation => "Fake rotation by flipping and reversing a short window",
            Self::Contrast => "Change contrast",
        }
    }

    /// Draw this effect's parameters from the configured ranges
    pub fn draw<R: Rng + ?Sized>(&self, config: &EffectsConfig, rng: &mut R) -> Effect {
        match self {
            Self::SpeedScale => Effect::SpeedScale { factor: config.speed.draw(rng) },
            Self::MirrorX => Effect::MirrorX,
            Self::TimeReverse => Effect::TimeReverse,
            Self::SymmetrizeSpeed => Effect::SymmetrizeSpeed {
                factor: config.symmetrize_speed.draw(rng),
            },
            Self::Repeat => Effect::Repeat { window: config.repeat_window.draw(rng) },
            Self::Shuffle => Effect::Shuffle { splits: config.shuffle_splits.draw(rng) },
            Self::ContinuousFlip => Effect::ContinuousFlip { splits: config.flip_splits.draw(rng) },
            Self::FlipRotation => Effect::FlipRotation {
                window: config.flip_rotation_window.draw(rng),
                repeats: config.flip_rotation_repeats.draw(rng),
                speed: config.flip_rotation_speed,
            },
            Self::Contrast => Effect::Contrast { contrast: config.contrast.draw(rng) },
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An effect with its parameters already drawn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "kebab-case")]
pub enum Effect {
    SpeedScale { factor: f64 },
    MirrorX,
    TimeReverse,
    SymmetrizeSpeed { factor: f64 },
    /// Length of the repeated window (seconds)
    Repeat { window: f64 },
    Shuffle { splits: u32 },
    ContinuousFlip { splits: u32 },
    FlipRotation { window: f64, repeats: u32, speed: f64 },
    Contrast { contrast: f64 },
}

impl Effect {
    pub fn kind(&self) -> EffectKind {
        match self {
            Self::SpeedScale { .. } => EffectKind::SpeedScale,
            Self::MirrorX => EffectKind::MirrorX,
            Self::TimeReverse => EffectKind::TimeReverse,
            Self::SymmetrizeSpeed { .. } => EffectKind::SymmetrizeSpeed,
            Self::Repeat { .. } => EffectKind::Repeat,
            Self::Shuffle { .. } => EffectKind::Shuffle,
            Self::ContinuousFlip { .. } => EffectKind::ContinuousFlip,
            Self::FlipRotation { .. } => EffectKind::FlipRotation,
            Self::Contrast { .. } => EffectKind::Contrast,
        }
    }
}

/// Pick one enabled effect uniformly and draw its parameters.
///
/// Returns `None` when no effect is enabled.
pub fn choose_effect<R: Rng + ?Sized>(config: &EffectsConfig, rng: &mut R) -> Option<Effect> {
    let kind = config.enabled.choose(rng)?;
    Some(kind.draw(config, rng))
}

/// Rewrite `clip` with `effect`. A zero-length clip is returned as is.
pub fn apply<R: Rng + ?Sized>(effect: &Effect, clip: Clip, rng: &mut R) -> Clip {
    let duration = clip.duration();
    if duration <= 0.0 {
        return clip;
    }

    match *effect {
        Effect::SpeedScale { factor } => clip.speed(factor),
        Effect::MirrorX => clip.mirror_x(),
        Effect::TimeReverse => clip.reversed(),
        Effect::SymmetrizeSpeed { factor } => clip.symmetrized().speed(factor),
        Effect::Repeat { window } => repeat(&clip, window, rng),
        Effect::Shuffle { splits } => shuffle(&clip, splits, rng),
        Effect::ContinuousFlip { splits } => continuous_flip(&clip, splits, rng),
        Effect::FlipRotation { window, repeats, speed } => {
            flip_rotation(&clip, window, repeats, speed, rng)
        }
        Effect::Contrast { contrast } => clip.contrast(contrast, 0.0),
    }
}

fn repeat<R: Rng + ?Sized>(clip: &Clip, window: f64, rng: &mut R) -> Clip {
    let duration = clip.duration();
    let length = window.min(duration);
    if length <= 0.0 {
        return clip.clone();
    }
    let piece = random_window(clip, length, rng);
    let copies = ((duration / length) * 0.5).floor().max(1.0) as usize;
    Clip::concat(vec![piece; copies])
}

fn shuffle<R: Rng + ?Sized>(clip: &Clip, splits: u32, rng: &mut R) -> Clip {
    let points = split_points(splits, clip.duration(), rng);
    let mut pieces = split_at(clip, &points);
    pieces.shuffle(rng);
    Clip::concat(pieces)
}

fn continuous_flip<R: Rng + ?Sized>(clip: &Clip, splits: u32, rng: &mut R) -> Clip {
    let points = split_points(splits, clip.duration(), rng);
    let pieces = split_at(clip, &points)
        .into_iter()
        .map(|piece| match rng.gen_range(0..3) {
            0 => piece.mirror_x(),
            1 => piece.mirror_y(),
            _ => piece,
        })
        .collect();
    Clip::concat(pieces)
}

fn flip_rotation<R: Rng + ?Sized>(
    clip: &Clip,
    window: f64,
    repeats: u32,
    speed: f64,
    rng: &mut R,
) -> Clip {
    let first = random_window(clip, window, rng);
    let second = first.clone().mirror_x().reversed();
    let pair = [first.speed(speed), second.speed(speed)];

    let pieces = (0..repeats.max(1))
        .flat_map(|_| pair.iter().cloned())
        .collect();
    Clip::concat(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::SourceId;
    use rand::rngs::mock::StepRng;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn clip(duration: f64) -> Clip {
        Clip::source(SourceId(0), duration).subclip(0.0, duration)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_kind_names_match_serde() {
        for kind in EffectKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.name()));
        }
    }

    #[test]
    fn test_choose_respects_enabled_set() {
        let config = EffectsConfig {
            enabled: vec![EffectKind::Contrast],
            ..EffectsConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..20 {
            let effect = choose_effect(&config, &mut rng).unwrap();
            match effect {
                Effect::Contrast { contrast } => assert!((0.3..=2.0).contains(&contrast)),
                other => panic!("unexpected effect {:?}", other),
            }
        }

        let none = EffectsConfig { enabled: vec![], ..EffectsConfig::default() };
        assert!(choose_effect(&none, &mut rng).is_none());
    }

    #[test]
    fn test_lowest_draw_picks_first_kind() {
        let mut rng = StepRng::new(0, 0);
        let effect = choose_effect(&EffectsConfig::default(), &mut rng).unwrap();
        assert_eq!(effect, Effect::SpeedScale { factor: 0.7 });
    }

    #[test]
    fn test_simple_effects_durations() {
        let mut rng = StdRng::seed_from_u64(0);
        let base = clip(3.0);

        let sped = apply(&Effect::SpeedScale { factor: 2.0 }, base.clone(), &mut rng);
        assert!(approx(sped.duration(), 1.5));

        let mirrored = apply(&Effect::MirrorX, base.clone(), &mut rng);
        assert!(approx(mirrored.duration(), 3.0));

        let reversed = apply(&Effect::TimeReverse, base.clone(), &mut rng);
        assert!(matches!(reversed, Clip::Reverse { .. }));

        let symmetric = apply(&Effect::SymmetrizeSpeed { factor: 2.0 }, base.clone(), &mut rng);
        assert!(approx(symmetric.duration(), 3.0));

        let contrast = apply(&Effect::Contrast { contrast: 1.5 }, base, &mut rng);
        assert!(matches!(contrast, Clip::Contrast { luminance, .. } if luminance == 0.0));
    }

    #[test]
    fn test_repeat_count() {
        let mut rng = StdRng::seed_from_u64(11);
        let repeated = apply(&Effect::Repeat { window: 0.1 }, clip(2.0), &mut rng);

        match repeated {
            Clip::Concat { clips } => {
                assert_eq!(clips.len(), 10);
                assert!(clips.iter().all(|c| approx(c.duration(), 0.1)));
            }
            other => panic!("expected concat, got {:?}", other),
        }
    }

    #[test]
    fn test_repeat_on_short_clip_keeps_one_copy() {
        let mut rng = StdRng::seed_from_u64(11);
        let repeated = apply(&Effect::Repeat { window: 0.2 }, clip(0.05), &mut rng);

        assert_eq!(repeated.leaf_count(), 1);
        assert!(approx(repeated.duration(), 0.05));
    }

    #[test]
    fn test_shuffle_keeps_total_duration() {
        let mut rng = StdRng::seed_from_u64(21);
        let shuffled = apply(&Effect::Shuffle { splits: 30 }, clip(3.0), &mut rng);

        assert!((shuffled.duration() - 3.0).abs() < 0.05);
        assert!(shuffled.leaf_count() <= 31);
    }

    #[test]
    fn test_continuous_flip_keeps_duration() {
        let mut rng = StdRng::seed_from_u64(8);
        let flipped = apply(&Effect::ContinuousFlip { splits: 7 }, clip(2.0), &mut rng);

        assert!((flipped.duration() - 2.0).abs() < 0.01);
        assert!(matches!(flipped, Clip::Concat { .. }));
    }

    #[test]
    fn test_flip_rotation_pairs() {
        let mut rng = StdRng::seed_from_u64(2);
        let effect = Effect::FlipRotation { window: 0.3, repeats: 3, speed: 1.5 };
        let rotated = apply(&effect, clip(2.0), &mut rng);

        match rotated {
            Clip::Concat { clips } => {
                assert_eq!(clips.len(), 6);
                assert!(matches!(&clips[1], Clip::Speed { clip, .. } if matches!(**clip, Clip::Reverse { .. })));
            }
            other => panic!("expected concat, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_length_clip_unchanged() {
        let mut rng = StdRng::seed_from_u64(0);
        let empty = clip(0.0);
        for kind in EffectKind::ALL {
            let effect = kind.draw(&EffectsConfig::default(), &mut rng);
            assert_eq!(apply(&effect, empty.clone(), &mut rng), empty);
        }
    }

    #[test]
    fn test_same_seed_same_edit() {
        let config = EffectsConfig::default();
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let effect = EffectKind::Shuffle.draw(&config, &mut rng);
            apply(&effect, clip(3.0), &mut rng)
        };
        assert_eq!(run(9), run(9));
    }
}
