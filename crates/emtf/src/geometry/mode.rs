//! Station-coverage bitmasks ("modes").
//!
//! Bit 3 is station 1, bit 0 is station 4.

/// Mode with all four stations present.
pub const MODE_ALL_STATIONS: u8 = 15;

/// Mode bit of a station number (1..4).
#[inline]
pub const fn station_bit(station: i32) -> u8 {
    1 << (4 - station)
}

/// Three or more stations including station 1.
pub fn is_singlemu(mode: u8) -> bool {
    matches!(mode, 11 | 13 | 14 | 15)
}

pub fn is_doublemu(mode: u8) -> bool {
    matches!(mode, 7 | 10 | 12) || is_singlemu(mode)
}

/// At least two stations.
pub fn is_muopen(mode: u8) -> bool {
    matches!(mode, 3 | 5 | 6 | 9) || is_doublemu(mode)
}

/// Station 1 present.
pub fn is_single(mode: u8) -> bool {
    mode & (1 << 3) != 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_sets_are_nested() {
        for mode in 0u8..16 {
            if is_singlemu(mode) {
                assert!(is_doublemu(mode));
                assert!(is_single(mode));
            }
            if is_doublemu(mode) {
                assert!(is_muopen(mode));
            }
            assert_eq!(is_muopen(mode), mode.count_ones() >= 2, "mode {mode}");
        }
    }

    #[test]
    fn station_bits() {
        assert_eq!(station_bit(1), 8);
        assert_eq!(station_bit(4), 1);
        assert!(!is_singlemu(station_bit(1) | station_bit(2)));
    }
}
