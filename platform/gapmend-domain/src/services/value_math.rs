/// Safe-math collaborator used by the fill path for averaging, rounding and
/// clamping. Injected at engine construction so tests can instrument it and
/// alternative precision policies can be swapped in.
pub trait ValueMath: Sync {
    fn average(&self, a: f64, b: f64) -> f64;
    fn round(&self, value: f64) -> f64;
    fn clamp(&self, value: f64, low: f64, high: f64) -> f64;
}

/// Default implementation: plain f64 arithmetic with optional fixed-decimal
/// rounding.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardValueMath {
    decimals: Option<u32>,
}

impl StandardValueMath {
    pub fn new(decimals: Option<u32>) -> Self {
        Self { decimals }
    }
}

impl ValueMath for StandardValueMath {
    fn average(&self, a: f64, b: f64) -> f64 {
        a + (b - a) / 2.0
    }

    fn round(&self, value: f64) -> f64 {
        match self.decimals {
            Some(decimals) => {
                let factor = 10f64.powi(decimals as i32);
                (value * factor).round() / factor
            }
            None => value,
        }
    }

    fn clamp(&self, value: f64, low: f64, high: f64) -> f64 {
        value.clamp(low.min(high), low.max(high))
    }
}
