//! Drive script interpreter
//!
//! A drive script is a TOML file of timed operator keyframes used to replay
//! a drive without an input device attached. Between keyframes the operator
//! vector and braking factor are linearly interpolated; beyond the ends the
//! first/last keyframe holds.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::Deserialize;
use std::fs::read_to_string;
use std::path::Path;
use thiserror::Error;

// Internal
use util::maths::lin_map;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A scripted drive: operator keyframes in ascending time order.
#[derive(Debug, Deserialize, Clone)]
pub struct DriveScript {
    /// The keyframes, strictly ascending in time.
    pub keyframes: Vec<Keyframe>,
}

/// One scripted operator state.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct Keyframe {
    /// Script time of this keyframe.
    ///
    /// Units: seconds
    pub time_s: f64,

    /// Turn axis deflection, -1 to +1 (positive right).
    pub x: f64,

    /// Speed lever deflection, -1 to +1 (positive forward).
    pub y: f64,

    /// External braking factor, 0 to 1.
    #[serde(default)]
    pub braking_factor: f64,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors raised when loading a drive script.
#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Cannot load the script file: {0}")]
    FileLoadError(std::io::Error),

    #[error("Cannot read the script file: {0}")]
    DeserialiseError(toml::de::Error),

    #[error("Script contains no keyframes")]
    Empty,

    #[error("Script keyframes are not in ascending time order (index {0})")]
    NotAscending(usize),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl DriveScript {
    /// Load and validate a script from the given file path.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ScriptError> {
        let script_str = read_to_string(path).map_err(ScriptError::FileLoadError)?;

        let script: DriveScript =
            toml::from_str(&script_str).map_err(ScriptError::DeserialiseError)?;

        script.validate()?;

        Ok(script)
    }

    /// Check that the script is non-empty and ascending in time.
    pub fn validate(&self) -> Result<(), ScriptError> {
        if self.keyframes.is_empty() {
            return Err(ScriptError::Empty);
        }

        for i in 1..self.keyframes.len() {
            if self.keyframes[i].time_s <= self.keyframes[i - 1].time_s {
                return Err(ScriptError::NotAscending(i));
            }
        }

        Ok(())
    }

    /// Total duration of the script.
    ///
    /// Units: seconds
    pub fn duration_s(&self) -> f64 {
        match self.keyframes.last() {
            Some(k) => k.time_s,
            None => 0.0,
        }
    }

    /// Sample the operator state at the given script time.
    pub fn sample(&self, time_s: f64) -> Keyframe {
        // Hold the ends
        let first = self.keyframes[0];
        if time_s <= first.time_s {
            return Keyframe {
                time_s,
                ..first
            };
        }
        let last = self.keyframes[self.keyframes.len() - 1];
        if time_s >= last.time_s {
            return Keyframe {
                time_s,
                ..last
            };
        }

        // Find the bracketing pair and interpolate
        let mut k0 = first;
        for &k1 in self.keyframes.iter().skip(1) {
            if time_s < k1.time_s {
                let range = (k0.time_s, k1.time_s);
                return Keyframe {
                    time_s,
                    x: lin_map(range, (k0.x, k1.x), time_s),
                    y: lin_map(range, (k0.y, k1.y), time_s),
                    braking_factor: lin_map(
                        range,
                        (k0.braking_factor, k1.braking_factor),
                        time_s,
                    ),
                };
            }
            k0 = k1;
        }

        // Unreachable: the end-hold above covers time_s >= last
        Keyframe { time_s, ..last }
    }
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;

    fn script() -> DriveScript {
        DriveScript {
            keyframes: vec![
                Keyframe {
                    time_s: 0.0,
                    x: 0.0,
                    y: 0.0,
                    braking_factor: 0.0,
                },
                Keyframe {
                    time_s: 2.0,
                    x: 1.0,
                    y: 0.5,
                    braking_factor: 0.0,
                },
                Keyframe {
                    time_s: 4.0,
                    x: 0.0,
                    y: 0.5,
                    braking_factor: 1.0,
                },
            ],
        }
    }

    #[test]
    fn test_interpolation_between_keyframes() {
        let s = script();
        let k = s.sample(1.0);
        assert!((k.x - 0.5).abs() < 1e-12);
        assert!((k.y - 0.25).abs() < 1e-12);
        assert_eq!(k.braking_factor, 0.0);

        let k = s.sample(3.0);
        assert!((k.x - 0.5).abs() < 1e-12);
        assert!((k.y - 0.5).abs() < 1e-12);
        assert!((k.braking_factor - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_ends_hold() {
        let s = script();
        let k = s.sample(-1.0);
        assert_eq!(k.x, 0.0);
        let k = s.sample(100.0);
        assert_eq!(k.x, 0.0);
        assert_eq!(k.braking_factor, 1.0);
    }

    #[test]
    fn test_duration() {
        assert_eq!(script().duration_s(), 4.0);
    }

    #[test]
    fn test_unordered_script_rejected() {
        let mut s = script();
        s.keyframes[2].time_s = 1.0;
        assert!(matches!(s.validate(), Err(ScriptError::NotAscending(2))));
    }

    #[test]
    fn test_empty_script_rejected() {
        let s = DriveScript { keyframes: vec![] };
        assert!(matches!(s.validate(), Err(ScriptError::Empty)));
    }
}
