//! 輸出捨入規則：面積與金額取 2 位小數，比例取 4 位小數，皆為四捨五入（遠離零）。
//! 內部計算一律保留完整 f64 精度，只在組裝回應時捨入。

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    let rounded = (value * factor).round() / factor;
    // 避免輸出 -0.0
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

pub fn money(value: f64) -> f64 {
    round_to(value, 2)
}

pub fn area(value: f64) -> f64 {
    round_to(value, 2)
}

pub fn ratio(value: f64) -> f64 {
    round_to(value, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_half_away_from_zero() {
        assert_eq!(round_to(2.5, 0), 3.0);
        assert_eq!(round_to(-2.5, 0), -3.0);
        assert_eq!(money(159_375.004), 159_375.0);
        assert_eq!(ratio(0.123_456), 0.1235);
    }

    #[test]
    fn test_no_negative_zero() {
        assert!(money(-0.001).is_sign_positive());
    }
}
