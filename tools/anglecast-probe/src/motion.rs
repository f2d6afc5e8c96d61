// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Synthetic inclinometer samples.

use anglecast::AngleSample;
use rand::Rng;
use std::f64::consts::PI;
use std::time::Duration;

/// 10-bit ADC reading at zero degrees.
const RAW_CENTER: f64 = 512.0;
const RAW_PER_DEGREE: f64 = 2.8;
const RAW_MAX: i64 = 1023;

/// ADC reading a device would report for `angle` degrees.
pub fn raw_from_angle(angle: f64) -> i64 {
    ((RAW_CENTER + angle * RAW_PER_DEGREE) as i64).clamp(0, RAW_MAX)
}

/// Sample with raw values derived from the angles.
pub fn sample(theta: f64, psi: f64, phi: f64) -> AngleSample {
    AngleSample {
        theta,
        psi,
        phi,
        axraw: raw_from_angle(theta),
        ayraw: raw_from_angle(psi),
        azraw: raw_from_angle(phi),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Slow sweep: theta and psi trace a circle, phi nods at half rate.
///
/// One full turn takes `duration` when a sample is sent every `interval`.
#[derive(Debug, Clone)]
pub struct Circular {
    angle: f64,
    step: f64,
}

impl Circular {
    pub fn new(duration: Duration, interval: Duration) -> Self {
        let duration = duration.as_secs_f64().max(f64::EPSILON);
        Self {
            angle: 0.0,
            step: interval.as_secs_f64() * 2.0 * PI / duration,
        }
    }
}

impl Iterator for Circular {
    type Item = AngleSample;

    fn next(&mut self) -> Option<AngleSample> {
        let a = self.angle;
        self.angle += self.step;

        Some(sample(
            round2(45.0 * a.sin()),
            round2(45.0 * a.cos()),
            round2(30.0 * (a * 0.5).sin()),
        ))
    }
}

/// Uniform noise within `±max_angle` on every axis.
pub fn random_sample<R: Rng>(rng: &mut R, max_angle: f64) -> AngleSample {
    let mut axis = || round2(rng.gen_range(-max_angle..=max_angle));
    let (theta, psi, phi) = (axis(), axis(), axis());
    sample(theta, psi, phi)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn raw_values_follow_adc_scale() {
        assert_eq!(raw_from_angle(0.0), 512);
        assert_eq!(raw_from_angle(15.5), 555);
        assert_eq!(raw_from_angle(-22.3), 449);
        assert_eq!(raw_from_angle(500.0), 1023);
        assert_eq!(raw_from_angle(-500.0), 0);
    }

    #[test]
    fn circular_starts_at_top_of_circle() {
        let first = Circular::new(Duration::from_secs(10), Duration::from_millis(200))
            .next()
            .unwrap();
        assert_eq!((first.theta, first.psi, first.phi), (0.0, 45.0, 0.0));
        assert_eq!(first.ayraw, 638);
    }

    #[test]
    fn circular_completes_a_turn_per_duration() {
        // 10 s at 2.5 s per step: a quarter turn each step
        let samples: Vec<_> =
            Circular::new(Duration::from_secs(10), Duration::from_millis(2500))
                .take(5)
                .collect();

        assert_eq!(samples[1].theta, 45.0);
        assert_eq!(samples[1].psi, 0.0);
        assert_eq!(samples[2].psi, -45.0);
        assert_eq!(samples[4].theta, 0.0);
        assert_eq!(samples[4].psi, 45.0);
    }

    #[test]
    fn random_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let s = random_sample(&mut rng, 30.0);
            for angle in [s.theta, s.psi, s.phi] {
                assert!((-30.0..=30.0).contains(&angle), "{}", angle);
            }
            assert!((428..=596).contains(&s.axraw));
        }
    }
}
