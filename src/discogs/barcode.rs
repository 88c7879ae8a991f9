use thiserror::Error;

/// UPC-E is the shortest barcode we accept, GTIN-14 the longest
pub const MIN_BARCODE_DIGITS: usize = 8;
pub const MAX_BARCODE_DIGITS: usize = 14;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BarcodeError {
    #[error("Barcode is required")]
    Empty,
    #[error("Barcode should be 8-14 digits (UPC/EAN format)")]
    InvalidLength(usize),
}

/// Strip everything that is not an ASCII digit
pub fn normalize_barcode(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normalize and validate a scanned or typed barcode.
///
/// Returns the digits-only barcode ready to send to Discogs.
pub fn validate_barcode(raw: &str) -> Result<String, BarcodeError> {
    if raw.trim().is_empty() {
        return Err(BarcodeError::Empty);
    }

    let digits = normalize_barcode(raw);
    if (MIN_BARCODE_DIGITS..=MAX_BARCODE_DIGITS).contains(&digits.len()) {
        Ok(digits)
    } else {
        Err(BarcodeError::InvalidLength(digits.len()))
    }
}
