use rand::Rng;
use rand_distr::{Distribution, Normal, NormalError};
use serde::{Deserialize, Serialize};
use shpb_common::Real;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "noise-type")]
pub(crate) enum NoiseAttributes {
    Uniform { min: Real, max: Real },
    Gaussian { mean: Real, sd: Real },
}

/// Gauge noise added to every simulated sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct NoiseSource {
    attributes: NoiseAttributes,
    /// Weight given to the previous noise value, zero for white noise.
    #[serde(default)]
    smoothing_factor: Real,
}

impl NoiseSource {
    pub(crate) fn gaussian(sd: Real) -> Self {
        Self {
            attributes: NoiseAttributes::Gaussian { mean: 0.0, sd },
            smoothing_factor: 0.0,
        }
    }

    fn smooth(&self, new_value: Real, old_value: Real) -> Real {
        new_value * (1.0 - self.smoothing_factor) + old_value * self.smoothing_factor
    }
}

enum Sampler {
    Uniform { min: Real, max: Real },
    Gaussian(Normal<Real>),
}

pub(crate) struct Noise<'a> {
    source: &'a NoiseSource,
    sampler: Sampler,
    prev: Real,
}

impl<'a> Noise<'a> {
    pub(crate) fn new(source: &'a NoiseSource) -> Result<Self, NormalError> {
        let sampler = match source.attributes {
            NoiseAttributes::Uniform { min, max } => Sampler::Uniform { min, max },
            NoiseAttributes::Gaussian { mean, sd } => Sampler::Gaussian(Normal::new(mean, sd)?),
        };
        Ok(Self {
            source,
            sampler,
            prev: Real::default(),
        })
    }

    fn sample<R: Rng>(&self, rng: &mut R) -> Real {
        match &self.sampler {
            Sampler::Uniform { min, max } => (max - min) * rng.random::<Real>() + min,
            Sampler::Gaussian(normal) => normal.sample(rng),
        }
    }

    pub(crate) fn noisify<R: Rng>(&mut self, value: Real, rng: &mut R) -> Real {
        self.prev = self.source.smooth(self.sample(rng), self.prev);
        value + self.prev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;
    use rand::{SeedableRng, rngs::StdRng};

    #[test]
    fn uniform_noise_stays_in_range() {
        let source = NoiseSource {
            attributes: NoiseAttributes::Uniform { min: -0.5, max: 0.5 },
            smoothing_factor: 0.0,
        };
        let mut noise = Noise::new(&source).expect("noise should build");
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..1000 {
            let value = noise.noisify(10.0, &mut rng);
            assert!((9.5..=10.5).contains(&value));
        }
    }

    #[test]
    fn smoothing_holds_previous_value() {
        let source = NoiseSource {
            attributes: NoiseAttributes::Uniform { min: 1.0, max: 1.0 },
            smoothing_factor: 0.5,
        };
        let mut noise = Noise::new(&source).expect("noise should build");
        let mut rng = StdRng::seed_from_u64(1);
        assert_approx_eq!(noise.noisify(0.0, &mut rng), 0.5);
        assert_approx_eq!(noise.noisify(0.0, &mut rng), 0.75);
    }

    #[test]
    fn invalid_gaussian() {
        assert!(Noise::new(&NoiseSource::gaussian(-1.0)).is_err());
    }

    #[test]
    fn parse_tagged_source() {
        let source: NoiseSource = serde_json::from_str(
            r#"{"attributes": {"noise-type": "gaussian", "mean": 0.0, "sd": 0.01}}"#,
        )
        .expect("source should parse");
        assert_eq!(source, NoiseSource::gaussian(0.01));
    }
}
