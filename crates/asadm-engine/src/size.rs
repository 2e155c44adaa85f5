//! Human readable byte sizes, truncated to whole units.

const BYTE_UNITS: &[(i64, &str)] = &[
    (1 << 50, " PB"),
    (1 << 40, " TB"),
    (1 << 30, " GB"),
    (1 << 20, " MB"),
    (1 << 10, " KB"),
    (1, " B"),
];

/// `1536` becomes `1 KB`. Values below one byte (including negatives) use
/// the byte unit.
pub fn byte_size(bytes: i64) -> String {
    let (factor, suffix) = BYTE_UNITS
        .iter()
        .find(|(factor, _)| bytes >= *factor)
        .unwrap_or(&BYTE_UNITS[BYTE_UNITS.len() - 1]);

    format!("{}{}", bytes / factor, suffix)
}

/// Inverse of the compact labels used for histogram ranges: `16K` is
/// `16 * 1024`. Returns `None` for anything that is not a whole number with
/// an optional binary suffix, or that does not fit in a `u64`.
pub fn label_to_bytes(label: &str) -> Option<u64> {
    const SUFFIXES: &[(char, u64)] = &[
        ('K', 1 << 10),
        ('M', 1 << 20),
        ('G', 1 << 30),
        ('T', 1 << 40),
        ('P', 1 << 50),
        ('E', 1 << 60),
    ];

    let label = label.trim();
    for (suffix, factor) in SUFFIXES {
        if let Some(number) = label.strip_suffix(*suffix) {
            return number.parse::<u64>().ok().and_then(|n| n.checked_mul(*factor));
        }
    }

    label.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_size_truncates() {
        assert_eq!(byte_size(0), "0 B");
        assert_eq!(byte_size(1023), "1023 B");
        assert_eq!(byte_size(1024), "1 KB");
        assert_eq!(byte_size(1535), "1 KB");
        assert_eq!(byte_size(128 * 1024 * 1024), "128 MB");
        assert_eq!(byte_size(-128), "-128 B");
    }

    #[test]
    fn test_label_to_bytes() {
        assert_eq!(label_to_bytes("0"), Some(0));
        assert_eq!(label_to_bytes("64"), Some(64));
        assert_eq!(label_to_bytes("16K"), Some(16 * 1024));
        assert_eq!(label_to_bytes("2M"), Some(2 * 1024 * 1024));
        assert_eq!(label_to_bytes("abc"), None);
    }

    #[test]
    fn test_label_to_bytes_overflow_is_none() {
        assert_eq!(label_to_bytes("8E"), Some(8 << 60));
        assert_eq!(label_to_bytes("16E"), None);
        assert_eq!(label_to_bytes("99999999999P"), None);
    }
}
