//! Conversions from raw product values to model inputs.

use log::warn;

use crate::grid::Field;

/// Bleaching-alert codes that carry no temperature information.
const NO_DATA_CODES: [f64; 2] = [0.0, 251.0];

/// Raw SSHA values outside this range (cm) are treated as fill values.
pub const SSHA_RAW_LIMIT_CM: f64 = 500.0;

/// SST proxy (°C) from a bleaching alert area code.
///
/// Codes 0 and 251 are missing; everything else maps linearly to
/// `26 + code/7*6`, clipped to [18, 32].
pub fn sst_from_bleaching_alert(code: f64) -> Option<f64> {
    if !code.is_finite() || NO_DATA_CODES.contains(&code) {
        return None;
    }
    Some((26.0 + code / 7.0 * 6.0).clamp(18.0, 32.0))
}

/// Applies [`sst_from_bleaching_alert`] to every cell.
pub fn sst_proxy_field(codes: &Field) -> Field {
    codes.map(|c| c.and_then(sst_from_bleaching_alert))
}

/// Rescales raw SSHA (cm) to mean 50 and standard deviation 50.
///
/// Values outside ±[`SSHA_RAW_LIMIT_CM`] become missing first. The mean and
/// population standard deviation are taken over the remaining values. A
/// field with zero spread maps every present cell to 50. Returns `None` if
/// no value survives the range filter.
pub fn normalize_ssha(raw: &Field) -> Option<Field> {
    let filtered = raw.map(|v| v.filter(|x| x.is_finite() && x.abs() <= SSHA_RAW_LIMIT_CM));
    let dropped = raw.present_count() - filtered.present_count();
    if dropped > 0 {
        warn!("discarded {} SSHA values outside ±{} cm", dropped, SSHA_RAW_LIMIT_CM);
    }

    let n = filtered.present_count();
    if n == 0 {
        return None;
    }
    let mean = filtered.present().sum::<f64>() / n as f64;
    let var = filtered.present().map(|x| (x - mean).powi(2)).sum::<f64>() / n as f64;
    let std = var.sqrt();

    Some(filtered.map(|v| {
        v.map(|x| if std > 0.0 { (x - mean) / std * 50.0 + 50.0 } else { 50.0 })
    }))
}
