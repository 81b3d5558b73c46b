#![allow(dead_code)]

use pulse_cluster::{Series, SeriesSet};

/// Xorshift64* noise source so fixtures are identical on every run.
pub struct Noise(u64);

impl Noise {
    pub fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    /// Uniform sample in [-1, 1).
    pub fn next(&mut self) -> f64 {
        self.0 ^= self.0 >> 12;
        self.0 ^= self.0 << 25;
        self.0 ^= self.0 >> 27;
        let bits = self.0.wrapping_mul(0x2545_F491_4F6C_DD1D) >> 11;
        (bits as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    }
}

/// Pulse-like archetypes: ECG-, PPG- and ABP-shaped beats plus a ramp.
pub fn archetype(kind: usize, len: usize, rate: f64) -> Vec<f64> {
    (0..len)
        .map(|i| {
            let t = i as f64 / len as f64 * 10.0;
            let period = 60.0 / rate;
            let phase = t % period;
            let bump = |center: f64, width: f64| (-(phase - center).powi(2) / width).exp();
            match kind % 4 {
                0 => 0.3 * bump(0.1, 0.01) + bump(0.2, 0.005) + 0.4 * bump(0.4, 0.02),
                1 => 0.8 * bump(0.1, 0.01) + 0.4 * bump(0.3, 0.05) + 0.2 * bump(0.4, 0.01),
                2 => bump(0.1, 0.008) + 0.3 * bump(0.5, 0.1) + 0.4 * bump(0.2, 0.005),
                _ => i as f64 / len as f64 * 2.0 - 1.0 + 0.1 * (t * 5.0).sin(),
            }
        })
        .collect()
}

/// `n` noisy series of length `len`, cycling through the archetypes.
pub fn synthetic_set(n: usize, len: usize, seed: u64) -> SeriesSet {
    let mut noise = Noise::new(seed);
    SeriesSet::from_series((0..n).map(|k| {
        let rate = 60.0 + (k % 7) as f64 * 5.0;
        let values = archetype(k, len, rate)
            .into_iter()
            .map(|v| v + 0.1 * noise.next())
            .collect();
        let label = ["ecg", "ppg", "abp", "ramp"][k % 4];
        Series::new(format!("series_{k:04}"), values).with_label(label)
    }))
    .expect("synthetic ids are unique")
}
