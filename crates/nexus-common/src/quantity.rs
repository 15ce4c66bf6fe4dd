//! Kubernetes resource quantity parsing
//!
//! Only the subset the operator needs: quantities are converted to plain
//! numbers (bytes for memory, cores for cpu) for JVM sizing and for
//! comparing values the API server may have rewritten into canonical form.

const BINARY_SUFFIXES: &[(&str, f64)] = &[
    ("Ki", 1024.0),
    ("Mi", 1024.0 * 1024.0),
    ("Gi", 1024.0 * 1024.0 * 1024.0),
    ("Ti", 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Pi", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
    ("Ei", 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0 * 1024.0),
];

const DECIMAL_SUFFIXES: &[(&str, f64)] = &[
    ("m", 1e-3),
    ("k", 1e3),
    ("M", 1e6),
    ("G", 1e9),
    ("T", 1e12),
    ("P", 1e15),
    ("E", 1e18),
];

/// Parse a quantity ("2Gi", "512M", "500m", "1073741824") into its plain value.
pub fn parse_quantity(qty: &str) -> Result<f64, String> {
    let qty = qty.trim();
    let invalid = || format!("invalid quantity '{qty}' (expected e.g. '512Mi', '2Gi', '500m')");

    // Binary suffixes first so "Mi" is not mistaken for "M".
    let (number, multiplier) = BINARY_SUFFIXES
        .iter()
        .chain(DECIMAL_SUFFIXES)
        .find_map(|(suffix, mult)| qty.strip_suffix(suffix).map(|n| (n, *mult)))
        .unwrap_or((qty, 1.0));

    let value: f64 = number.parse().map_err(|_| invalid())?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid());
    }
    Ok(value * multiplier)
}

/// Validate a memory quantity string.
pub fn validate_memory_quantity(qty: &str) -> Result<(), String> {
    parse_quantity(qty).map(|_| ())
}

/// True when two quantities denote the same amount ("1024Mi" == "1Gi").
///
/// Falls back to string equality when either side does not parse.
pub fn quantities_equal(a: &str, b: &str) -> bool {
    match (parse_quantity(a), parse_quantity(b)) {
        (Ok(x), Ok(y)) => (x - y).abs() <= f64::EPSILON * x.abs().max(y.abs()).max(1.0),
        _ => a == b,
    }
}

/// Validate a cpu quantity string ("100m", "1", "0.5").
pub fn validate_cpu_quantity(qty: &str) -> Result<(), String> {
    let is_valid = if let Some(stripped) = qty.strip_suffix('m') {
        stripped.parse::<u64>().is_ok()
    } else {
        qty.parse::<f64>().map(|v| v >= 0.0).unwrap_or(false)
    };

    if is_valid {
        Ok(())
    } else {
        Err(format!(
            "invalid cpu quantity '{qty}' (expected e.g. '100m', '1', '0.5')"
        ))
    }
}
