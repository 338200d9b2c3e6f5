//! Random band-limited periodic function over `[0, 1]`, used as a diurnal demand curve.

use crate::rng::SimRng;

const HARMONICS: usize = 24;

pub struct Fourier {
    amplitudes: [f64; HARMONICS],
    phases: [f64; HARMONICS],
}

impl Fourier {
    /// Draws random amplitudes/phases from `rng`. The DC term's phase is halved,
    /// which breaks the symmetry that would otherwise make `Compute(0)` and
    /// `Compute(0.5)` trivially related for the fundamental harmonic.
    pub fn random(rng: &mut SimRng) -> Self {
        let mut amplitudes = [0.0; HARMONICS];
        let mut phases = [0.0; HARMONICS];
        for i in 0..HARMONICS {
            amplitudes[i] = rng.uniform_f64();
            phases[i] = rng.uniform_f64();
        }
        phases[0] /= 2.0;
        Fourier { amplitudes, phases }
    }

    pub fn compute(&self, x: f64) -> f64 {
        let mut result = 0.0;
        let mut max = 0.0;
        for i in 0..HARMONICS {
            let n = (1 + i) as f64;
            max += 1.0 / n;
            result += self.amplitudes[i] * (n * 2.0 * std::f64::consts::PI * (x + self.phases[i])).sin() / n;
        }
        result = result / max + 0.5;
        result.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stays_within_unit_interval() {
        let mut rng = SimRng::seeded(0);
        let fourier = Fourier::random(&mut rng);
        for i in 0..200 {
            let x = i as f64 / 200.0;
            let y = fourier.compute(x);
            assert!((0.0..=1.0).contains(&y), "compute({x}) = {y}");
        }
    }

    #[test]
    fn deterministic_given_seed() {
        let mut a = SimRng::seeded(0);
        let mut b = SimRng::seeded(0);
        let fa = Fourier::random(&mut a);
        let fb = Fourier::random(&mut b);
        assert_eq!(fa.compute(0.33), fb.compute(0.33));
    }
}
