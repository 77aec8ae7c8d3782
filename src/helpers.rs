/// Numerically stable `log(e^x + e^y)`.
///
/// A `-inf` argument contributes nothing, so the other argument comes back
/// unchanged. Feeding two same-signed infinities or a NaN is a caller bug;
/// the call is reported and `x + y` propagates the poison (`-inf` for the
/// `-inf`/`-inf` pair, NaN otherwise).
pub fn logaddexp(x: f64, y: f64) -> f64 {
    let diff = x - y;
    if diff > 0.0 {
        x + (-diff).exp().ln_1p()
    } else if diff <= 0.0 {
        y + diff.exp().ln_1p()
    } else {
        log::warn!("logaddexp({x}, {y})");
        x + y
    }
}

#[cfg(test)]
mod tests {
    use super::logaddexp;

    #[test]
    fn sums_in_log_domain() {
        let x = 0.7f64.ln();
        let y = 0.2f64.ln();
        assert!((logaddexp(x, y) - 0.9f64.ln()).abs() < 1e-15);
        assert!((logaddexp(0.0, 0.0) - 2.0f64.ln()).abs() < 1e-15);
    }

    #[test]
    fn symmetric() {
        assert_eq!(logaddexp(-3.0, -11.0), logaddexp(-11.0, -3.0));
    }

    #[test]
    fn stable_far_from_zero() {
        // naive exp() underflows at -1000
        let got = logaddexp(-1000.0, -1000.0);
        assert!((got - (-1000.0 + 2.0f64.ln())).abs() < 1e-12);
    }

    #[test]
    fn neg_infinity_is_identity() {
        assert_eq!(logaddexp(f64::NEG_INFINITY, -0.5), -0.5);
        assert_eq!(logaddexp(-0.5, f64::NEG_INFINITY), -0.5);
        assert_eq!(
            logaddexp(f64::NEG_INFINITY, f64::NEG_INFINITY),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn nan_propagates() {
        assert!(logaddexp(f64::NAN, 0.0).is_nan());
    }
}
