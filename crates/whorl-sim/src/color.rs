use std::{fmt, str::FromStr};

use glam::Vec3;
use rand::Rng;
use thiserror::Error;

pub const BLUE: Vec3 = Vec3::new(0.2, 0.3, 0.9);
pub const RED: Vec3 = Vec3::new(0.9, 0.2, 0.2);

/// How splats pick their dye color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorMode {
    Blue,
    Red,
    /// Uniform random per splat.
    Random,
    /// Cycles through hues with elapsed time.
    #[default]
    Rainbow,
}

impl ColorMode {
    /// Color for a splat emitted `t` seconds into the session.
    pub fn pick<R: Rng>(self, t: f32, rng: &mut R) -> Vec3 {
        match self {
            ColorMode::Blue => BLUE,
            ColorMode::Red => RED,
            ColorMode::Random => Vec3::new(rng.gen(), rng.gen(), rng.gen()),
            ColorMode::Rainbow => rainbow(t),
        }
    }
}

/// `0.5 + 0.5 sin(t + phase)` per channel, phases 0, 2 and 4 radians.
#[inline]
pub fn rainbow(t: f32) -> Vec3 {
    Vec3::new(
        0.5 + 0.5 * t.sin(),
        0.5 + 0.5 * (t + 2.0).sin(),
        0.5 + 0.5 * (t + 4.0).sin(),
    )
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown color mode `{0}`, expected blue, red, random or rainbow")]
pub struct ParseColorModeError(String);

impl FromStr for ColorMode {
    type Err = ParseColorModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blue" => Ok(ColorMode::Blue),
            "red" => Ok(ColorMode::Red),
            "random" => Ok(ColorMode::Random),
            "rainbow" => Ok(ColorMode::Rainbow),
            _ => Err(ParseColorModeError(s.to_owned())),
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColorMode::Blue => "blue",
            ColorMode::Red => "red",
            ColorMode::Random => "random",
            ColorMode::Rainbow => "rainbow",
        };

        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn rainbow_phases() {
        let c = rainbow(0.0);
        assert!((c.x - 0.5).abs() < 1e-6);
        assert!((c.y - (0.5 + 0.5 * 2.0_f32.sin())).abs() < 1e-6);
        assert!((c.z - (0.5 + 0.5 * 4.0_f32.sin())).abs() < 1e-6);

        let quarter = rainbow(std::f32::consts::FRAC_PI_2);
        assert!((quarter.x - 1.0).abs() < 1e-6);
    }

    #[test]
    fn random_stays_in_unit_cube() {
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let c = ColorMode::Random.pick(0.0, &mut rng);
            assert!(c.cmpge(Vec3::ZERO).all() && c.cmplt(Vec3::ONE).all());
        }
    }

    #[test]
    fn parses_names() {
        assert_eq!("Rainbow".parse::<ColorMode>(), Ok(ColorMode::Rainbow));
        assert_eq!("blue".parse::<ColorMode>(), Ok(ColorMode::Blue));
        assert!("green".parse::<ColorMode>().is_err());
        assert_eq!(ColorMode::Red.to_string(), "red");
    }
}
