pub struct StatsHelper;

impl StatsHelper {
    pub fn non_finite_count(samples: &[f64]) -> usize {
        samples.iter().filter(|v| !v.is_finite()).count()
    }
}
