use super::method::AnalysisMethod;
use serde::Serialize;
use shpb_common::Real;
use std::collections::BTreeMap;

/// Equal-length series produced by one [`AnalysisMethod`].
///
/// All series are magnitudes. The true variants assume a compressive test:
/// `true_strain = -ln(1 - strain)` and `true_stress = stress · (1 - strain)`,
/// with the true strain reported as NaN where the engineering strain reaches one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct StressStrainCurve {
    pub method: AnalysisMethod,
    pub time: Vec<Real>,
    pub stress: Vec<Real>,
    pub strain: Vec<Real>,
    pub strain_rate: Vec<Real>,
    pub true_stress: Vec<Real>,
    pub true_strain: Vec<Real>,
}

impl StressStrainCurve {
    pub(crate) fn new(
        method: AnalysisMethod,
        time: Vec<Real>,
        stress: Vec<Real>,
        strain: Vec<Real>,
        strain_rate: Vec<Real>,
    ) -> Self {
        let true_strain = strain
            .iter()
            .map(|&e| if e < 1.0 { -(1.0 - e).ln() } else { Real::NAN })
            .collect();
        let true_stress = stress
            .iter()
            .zip(&strain)
            .map(|(s, e)| s * (1.0 - e))
            .collect();
        Self {
            method,
            time,
            stress,
            strain,
            strain_rate,
            true_stress,
            true_strain,
        }
    }

    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// The series keyed `"<method>/<series>"`, e.g. `"1-wave/strain_rate"`.
    pub fn named_series(&self) -> BTreeMap<String, Vec<Real>> {
        [
            ("time", &self.time),
            ("stress", &self.stress),
            ("strain", &self.strain),
            ("strain_rate", &self.strain_rate),
            ("true_stress", &self.true_stress),
            ("true_strain", &self.true_strain),
        ]
        .into_iter()
        .map(|(name, series)| (format!("{}/{name}", self.method), series.clone()))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn true_variants() {
        let curve = StressStrainCurve::new(
            AnalysisMethod::ThreeWave,
            vec![0.0, 1.0, 2.0],
            vec![100.0, 200.0, 300.0],
            vec![0.0, 0.5, 1.0],
            vec![1.0, 1.0, 1.0],
        );
        assert_approx_eq!(curve.true_strain[0], 0.0);
        assert_approx_eq!(curve.true_strain[1], 2.0_f64.ln());
        assert!(curve.true_strain[2].is_nan());
        assert_approx_eq!(curve.true_stress[1], 100.0);
        assert_approx_eq!(curve.true_stress[2], 0.0);
    }

    #[test]
    fn series_names() {
        let curve = StressStrainCurve::new(
            AnalysisMethod::OneWave,
            vec![0.0],
            vec![1.0],
            vec![0.1],
            vec![2.0],
        );
        let named = curve.named_series();
        assert_eq!(named.len(), 6);
        assert_eq!(named["1-wave/strain_rate"], vec![2.0]);
        assert!(named.contains_key("1-wave/true_stress"));
    }
}
