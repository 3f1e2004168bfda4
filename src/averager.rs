/// Running mean and (population) dispersion of signal levels
#[derive(Debug, Clone, Default)]
pub struct Averager {
    pub mean: f64,
    pub count: u64,
    m2: f64,
}

impl Averager {
    /// Builds new Averager
    pub fn new() -> Self {
        Self::default()
    }

    /// Push new value into [Averager]
    pub fn add(&mut self, x: f64) {
        self.count += 1;
        let k = self.count as f64;
        let delta = x - self.mean;
        self.mean = x / k + self.mean * (k - 1.0) / k;
        self.m2 += delta * (x - self.mean);
    }

    /// Population variance
    pub fn variance(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.m2 / self.count as f64
        }
    }

    /// Population standard deviation
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }
}

impl FromIterator<f64> for Averager {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut avg = Self::new();
        for x in iter {
            avg.add(x);
        }
        avg
    }
}
