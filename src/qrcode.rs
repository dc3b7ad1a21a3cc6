#![forbid(unsafe_code)]
//! QR code parameter selection.
//!
//! This module decides, for a piece of text, which data mode a QR Code Model 2 symbol should use
//! (numeric, alphanumeric or byte) and the smallest version (1–40) whose character capacity can
//! hold it. Capacities are those of error correction level L (Low) and are held in a single
//! process-wide capacity table that is only reachable through [`select_version`] and
//! [`capacity`].
use std::fmt;
use std::sync::OnceLock;

use thiserror::Error;
use tracing::{debug, trace};

/// Data mode of a QR code segment.
///
/// Each mode has its own capacity curve; no mode is assumed to be a subset of another when
/// looking up capacities.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Mode {
    /// Decimal digits `0`–`9`.
    Numeric,
    /// Digits, uppercase `A`–`Z`, space and `$ % * + - . / :`.
    Alphanumeric,
    /// Arbitrary bytes; the UTF-8 encoding of the text.
    Byte,
}

impl Mode {
    /// Every mode, in classification priority order.
    pub const ALL: [Mode; 3] = [Mode::Numeric, Mode::Alphanumeric, Mode::Byte];

    fn ordinal(self) -> usize {
        use Mode::*;
        match self {
            Numeric => 0,
            Alphanumeric => 1,
            Byte => 2,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Mode::*;
        f.write_str(match self {
            Numeric => "numeric",
            Alphanumeric => "alphanumeric",
            Byte => "byte",
        })
    }
}

/// Picks the data mode for `input`.
///
/// Numeric wins over alphanumeric, which wins over byte. The empty string and anything outside
/// the alphanumeric set (lowercase letters, other punctuation, non-Latin text) fall back to
/// [`Mode::Byte`].
///
/// # Example
///
/// ```rust
/// use qrsize::qrcode::{classify, Mode};
///
/// assert_eq!(classify("12345"), Mode::Numeric);
/// assert_eq!(classify("HELLO WORLD"), Mode::Alphanumeric);
/// assert_eq!(classify("Hello, World!"), Mode::Byte);
/// ```
pub fn classify(input: &str) -> Mode {
    let mode = if is_numeric(input) {
        Mode::Numeric
    } else if is_alphanumeric(input) {
        Mode::Alphanumeric
    } else {
        Mode::Byte
    };
    trace!(len = input.len(), %mode, "classified input");
    mode
}

/// Returns `true` if `text` is non-empty and made only of the digits `0`–`9`.
///
/// Signs, whitespace and decimal points are rejected.
pub fn is_numeric(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit())
}

/// Returns `true` if `text` is non-empty and every character is in the alphanumeric mode set.
pub fn is_alphanumeric(text: &str) -> bool {
    !text.is_empty() && text.bytes().all(|b| ALPHANUMERIC_TABLE[usize::from(b)])
}

const ALPHANUMERIC_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ $%*+-./:";

// Built at compile time. Bytes of multi-byte UTF-8 sequences are all >= 0x80 and map to false.
static ALPHANUMERIC_TABLE: [bool; 256] = alphanumeric_table();

const fn alphanumeric_table() -> [bool; 256] {
    let mut table = [false; 256];
    let mut i = 0;
    while i < ALPHANUMERIC_CHARSET.len() {
        table[ALPHANUMERIC_CHARSET[i] as usize] = true;
        i += 1;
    }
    table
}

/// Errors raised while choosing QR code parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QrError {
    /// The text is longer than a version 40 symbol can hold in its mode.
    #[error("input too large for QR Code")]
    CapacityExceeded { mode: Mode, length: usize },

    /// A version number outside [1, 40] was supplied.
    #[error("version number {0} out of range [1, 40]")]
    InvalidVersion(u32),
}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Creates a version object from the given number.
    ///
    /// Use [`Version::try_from`] for numbers that are not known to be valid.
    ///
    /// # Panics
    ///
    /// Panics if the number is outside the range [1, 40].
    pub const fn new(ver: u8) -> Self {
        assert!(
            Version::MIN.value() <= ver && ver <= Version::MAX.value(),
            "Version number out of range"
        );
        Self(ver)
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Width and height of the symbol in modules: `4 * version + 17`, between 21 and 177.
    pub const fn pattern_size(self) -> u32 {
        (self.0 as u32) * 4 + 17
    }

    fn index(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl TryFrom<u8> for Version {
    type Error = QrError;

    fn try_from(ver: u8) -> Result<Self, Self::Error> {
        if (Version::MIN.value()..=Version::MAX.value()).contains(&ver) {
            Ok(Self(ver))
        } else {
            Err(QrError::InvalidVersion(u32::from(ver)))
        }
    }
}

impl TryFrom<u32> for Version {
    type Error = QrError;

    fn try_from(ver: u32) -> Result<Self, Self::Error> {
        u8::try_from(ver)
            .map_err(|_| QrError::InvalidVersion(ver))
            .and_then(Version::try_from)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Side length in modules for a raw version number.
///
/// Fails with [`QrError::InvalidVersion`] outside [1, 40] rather than extrapolating the formula.
///
/// ```rust
/// use qrsize::qrcode::pattern_size;
///
/// assert_eq!(pattern_size(1), Ok(21));
/// assert_eq!(pattern_size(40), Ok(177));
/// assert!(pattern_size(41).is_err());
/// ```
pub fn pattern_size(version: u32) -> Result<u32, QrError> {
    Version::try_from(version).map(Version::pattern_size)
}

/// Maximum character counts of one version, one column per mode.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) struct CapacityEntry {
    pub(crate) version: Version,
    pub(crate) numeric: u16,
    pub(crate) alphanumeric: u16,
    pub(crate) byte: u16,
}

impl CapacityEntry {
    /// Maximum number of characters (bytes in byte mode) this version holds in `mode`.
    pub(crate) fn max_length(&self, mode: Mode) -> usize {
        usize::from([self.numeric, self.alphanumeric, self.byte][mode.ordinal()])
    }
}

/// Character capacities of versions 1 to 40 at error correction level L.
pub(crate) struct CapacityTable {
    entries: Vec<CapacityEntry>,
}

static GLOBAL_CAPACITY_TABLE: OnceLock<CapacityTable> = OnceLock::new();

impl CapacityTable {
    /// The process-wide table, built on first use and read-only afterwards.
    pub(crate) fn global() -> &'static CapacityTable {
        GLOBAL_CAPACITY_TABLE.get_or_init(CapacityTable::build)
    }

    fn build() -> Self {
        let entries: Vec<CapacityEntry> = CHARACTER_CAPACITIES
            .iter()
            .zip(Version::MIN.value()..=Version::MAX.value())
            .map(|(&[numeric, alphanumeric, byte], ver)| CapacityEntry {
                version: Version::new(ver),
                numeric,
                alphanumeric,
                byte,
            })
            .collect();
        debug!(versions = entries.len(), "capacity table initialized");
        Self { entries }
    }

    /// All rows, ordered by version.
    #[cfg(test)]
    fn entries(&self) -> &[CapacityEntry] {
        &self.entries
    }

    fn capacity(&self, version: Version, mode: Mode) -> usize {
        self.entries[version.index()].max_length(mode)
    }

    /// Smallest version holding `length` characters in `mode`, if any.
    ///
    /// Binary search; relies on every column being non-decreasing.
    fn smallest_version(&self, mode: Mode, length: usize) -> Option<Version> {
        let idx = self.entries.partition_point(|e| e.max_length(mode) < length);
        self.entries.get(idx).map(|e| e.version)
    }

    #[cfg(test)]
    fn smallest_version_linear(&self, mode: Mode, length: usize) -> Option<Version> {
        self.entries
            .iter()
            .find(|e| e.max_length(mode) >= length)
            .map(|e| e.version)
    }
}

/// Maximum number of characters (bytes in byte mode) that `version` holds in `mode`.
///
/// ```rust
/// use qrsize::qrcode::{capacity, Mode, Version};
///
/// assert_eq!(capacity(Version::new(1), Mode::Alphanumeric), 25);
/// assert_eq!(capacity(Version::MAX, Mode::Byte), 2953);
/// ```
pub fn capacity(version: Version, mode: Mode) -> usize {
    CapacityTable::global().capacity(version, mode)
}

/// Returns the smallest version that holds `length` characters in `mode`.
///
/// # Errors
///
/// [`QrError::CapacityExceeded`] if even version 40 is too small.
///
/// # Example
///
/// ```rust
/// use qrsize::qrcode::{select_version, Mode, Version};
///
/// assert_eq!(select_version(Mode::Alphanumeric, 154), Ok(Version::new(5)));
/// assert!(select_version(Mode::Alphanumeric, 10_000).is_err());
/// ```
pub fn select_version(mode: Mode, length: usize) -> Result<Version, QrError> {
    let version = CapacityTable::global()
        .smallest_version(mode, length)
        .ok_or(QrError::CapacityExceeded { mode, length })?;
    debug!(%mode, length, %version, "selected version");
    Ok(version)
}

/// Parameters chosen for a piece of text.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Analysis {
    pub mode: Mode,
    pub version: Version,
    /// Length in bytes; equal to the character count in numeric and alphanumeric mode.
    pub length: usize,
}

impl Analysis {
    pub fn pattern_size(&self) -> u32 {
        self.version.pattern_size()
    }
}

/// Classifies `text` and selects the smallest version for it.
pub fn analyze(text: &str) -> Result<Analysis, QrError> {
    let mode = classify(text);
    let length = text.len();
    let version = select_version(mode, length)?;
    Ok(Analysis { mode, version, length })
}

// [numeric, alphanumeric, byte] per version, error correction level L.
const CHARACTER_CAPACITIES: [[u16; 3]; 40] = [
    [41, 25, 17],
    [77, 47, 32],
    [127, 77, 53],
    [187, 114, 78],
    [255, 154, 106],
    [322, 195, 134],
    [370, 224, 154],
    [461, 279, 192],
    [552, 335, 230],
    [652, 395, 271],
    [772, 468, 321],
    [883, 535, 367],
    [1022, 619, 425],
    [1101, 667, 458],
    [1250, 758, 520],
    [1408, 854, 586],
    [1548, 938, 644],
    [1725, 1046, 718],
    [1903, 1153, 792],
    [2061, 1249, 858],
    [2232, 1352, 929],
    [2409, 1460, 1003],
    [2620, 1588, 1091],
    [2812, 1704, 1171],
    [3057, 1853, 1273],
    [3283, 1990, 1367],
    [3517, 2132, 1465],
    [3669, 2223, 1528],
    [3909, 2369, 1628],
    [4158, 2520, 1732],
    [4417, 2677, 1840],
    [4686, 2840, 1952],
    [4965, 3009, 2068],
    [5253, 3183, 2188],
    [5529, 3351, 2303],
    [5836, 3537, 2431],
    [6153, 3729, 2563],
    [6479, 3927, 2699],
    [6743, 4087, 2809],
    [7089, 4296, 2953],
];

const _: () = assert!(
    columns_non_decreasing(&CHARACTER_CAPACITIES),
    "capacities must not decrease with version"
);

const fn columns_non_decreasing(rows: &[[u16; 3]]) -> bool {
    let mut row = 1;
    while row < rows.len() {
        let mut col = 0;
        while col < 3 {
            if rows[row - 1][col] > rows[row][col] {
                return false;
            }
            col += 1;
        }
        row += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("12345"), Mode::Numeric);
        assert_eq!(classify("%*ABC1 ./3123$+-:"), Mode::Alphanumeric);
        assert_eq!(classify("abcABC, 1234"), Mode::Byte);
        assert_eq!(classify(""), Mode::Byte);
        assert_eq!(classify("Привет мир"), Mode::Byte);
    }

    #[test]
    fn test_numeric_rejects_integer_syntax() {
        assert_eq!(classify("0007"), Mode::Numeric);
        assert_eq!(classify("-12"), Mode::Alphanumeric);
        assert_eq!(classify("+12"), Mode::Alphanumeric);
        assert_eq!(classify("1.5"), Mode::Alphanumeric);
        assert_eq!(classify(" 12"), Mode::Alphanumeric);
        assert_eq!(classify("12\n"), Mode::Byte);
        assert_eq!(classify("١٢٣"), Mode::Byte);
    }

    #[test]
    fn test_is_alphanumeric() {
        assert!(is_alphanumeric("HELLO WORLD"));
        assert!(!is_alphanumeric("Hello World"));
        assert!(!is_alphanumeric(""));
        assert!(!is_alphanumeric("É"));
    }

    #[test]
    fn test_select_version() {
        assert_eq!(select_version(Mode::Alphanumeric, 24), Ok(Version::new(1)));
        assert_eq!(select_version(Mode::Alphanumeric, 30), Ok(Version::new(2)));
        assert_eq!(select_version(Mode::Alphanumeric, 154), Ok(Version::new(5)));
        assert_eq!(select_version(Mode::Numeric, 2200), Ok(Version::new(21)));
        assert_eq!(select_version(Mode::Byte, 2200), Ok(Version::new(35)));
    }

    #[test]
    fn test_select_version_empty_input() {
        for mode in Mode::ALL {
            assert_eq!(select_version(mode, 0), Ok(Version::MIN));
        }
    }

    #[test]
    fn test_select_version_boundaries() {
        assert_eq!(select_version(Mode::Numeric, 7089), Ok(Version::MAX));
        assert_eq!(select_version(Mode::Byte, 2953), Ok(Version::MAX));
        assert_eq!(select_version(Mode::Byte, 17), Ok(Version::new(1)));
        assert_eq!(select_version(Mode::Byte, 18), Ok(Version::new(2)));
        assert_eq!(
            select_version(Mode::Numeric, 7090),
            Err(QrError::CapacityExceeded { mode: Mode::Numeric, length: 7090 })
        );
    }

    #[test]
    fn test_capacity_exceeded_message() {
        let err = select_version(Mode::Alphanumeric, 10_000).unwrap_err();
        assert_eq!(err, QrError::CapacityExceeded { mode: Mode::Alphanumeric, length: 10_000 });
        assert_eq!(err.to_string(), "input too large for QR Code");
    }

    #[test]
    fn test_pattern_size() {
        let table = [(1, 21), (2, 25), (6, 41), (7, 45), (14, 73), (40, 177)];
        for (version, size) in table {
            assert_eq!(pattern_size(version), Ok(size), "version {version}");
        }
        let sizes: Vec<u32> = (1..=40).map(|v| Version::new(v).pattern_size()).collect();
        assert!(sizes.windows(2).all(|w| w[1] - w[0] == 4));
    }

    #[test]
    fn test_invalid_version() {
        assert_eq!(pattern_size(0), Err(QrError::InvalidVersion(0)));
        assert_eq!(pattern_size(41), Err(QrError::InvalidVersion(41)));
        assert_eq!(pattern_size(300), Err(QrError::InvalidVersion(300)));
        assert_eq!(Version::try_from(0u8), Err(QrError::InvalidVersion(0)));
        assert!(QrError::InvalidVersion(41) != QrError::CapacityExceeded { mode: Mode::Byte, length: 0 });
    }

    #[test]
    #[should_panic(expected = "Version number out of range")]
    fn test_version_new_panics() {
        let _ = Version::new(41);
    }

    #[test]
    fn test_capacity_table() {
        let table = CapacityTable::global();
        assert_eq!(table.entries().len(), 40);
        assert_eq!(
            table.entries()[0],
            CapacityEntry { version: Version::MIN, numeric: 41, alphanumeric: 25, byte: 17 }
        );
        assert_eq!(capacity(Version::new(10), Mode::Alphanumeric), 395);
        assert_eq!(capacity(Version::MAX, Mode::Byte), 2953);
        assert!(std::ptr::eq(table, CapacityTable::global()));
    }

    #[test]
    fn test_column_order_check() {
        assert!(columns_non_decreasing(&CHARACTER_CAPACITIES));
        assert!(columns_non_decreasing(&[[1, 1, 1], [1, 2, 1]]));
        assert!(!columns_non_decreasing(&[[1, 5, 1], [2, 4, 3]]));
    }

    #[test]
    fn test_analyze() {
        let analysis = analyze("555-2368").unwrap();
        assert_eq!(analysis.mode, Mode::Alphanumeric);
        assert_eq!(analysis.version, Version::MIN);
        assert_eq!(analysis.pattern_size(), 21);

        let analysis = analyze(&"é".repeat(10)).unwrap();
        assert_eq!((analysis.mode, analysis.length), (Mode::Byte, 20));
        assert_eq!(analysis.version, Version::new(2));

        assert!(analyze(&"9".repeat(8000)).is_err());
    }

    fn any_mode() -> impl Strategy<Value = Mode> {
        prop_oneof![Just(Mode::Numeric), Just(Mode::Alphanumeric), Just(Mode::Byte)]
    }

    proptest! {
        #[test]
        fn selection_is_monotonic(mode in any_mode(), a in 0usize..8000, b in 0usize..8000) {
            let (lo, hi) = (a.min(b), a.max(b));
            if let Ok(hi_version) = select_version(mode, hi) {
                let lo_version = select_version(mode, lo).unwrap();
                prop_assert!(lo_version <= hi_version);
            }
        }

        #[test]
        fn selection_is_minimal(mode in any_mode(), length in 0usize..8000) {
            let table = CapacityTable::global();
            match select_version(mode, length) {
                Ok(version) => {
                    prop_assert!(table.capacity(version, mode) >= length);
                    for smaller in table.entries().iter().filter(|e| e.version < version) {
                        prop_assert!(smaller.max_length(mode) < length);
                    }
                }
                Err(_) => {
                    prop_assert!(table.capacity(Version::MAX, mode) < length);
                }
            }
        }

        #[test]
        fn binary_search_matches_linear_scan(mode in any_mode(), length in 0usize..8000) {
            let table = CapacityTable::global();
            prop_assert_eq!(
                table.smallest_version(mode, length),
                table.smallest_version_linear(mode, length)
            );
        }

        #[test]
        fn digit_strings_are_numeric(text in "[0-9]{1,64}") {
            prop_assert_eq!(classify(&text), Mode::Numeric);
        }

        #[test]
        fn lowercase_forces_byte(text in "[A-Z0-9 ]{0,16}[a-z][A-Z0-9 ]{0,16}") {
            prop_assert_eq!(classify(&text), Mode::Byte);
        }
    }
}
