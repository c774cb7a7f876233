use ndarray::Array2;

/// Bit position of the 2-bit cloud field inside the QC word
pub const CLOUD_SHIFT: u16 = 4;
pub const CLOUD_BITS: u16 = 0b11;

/// Cloud state of one QC word: any non-zero value in bits 4-5
pub fn is_cloudy(qc: u16) -> bool {
    ((qc >> CLOUD_SHIFT) & CLOUD_BITS) > 0
}

pub fn cloud_mask(qc: &Array2<u16>) -> Array2<bool> {
    qc.mapv(is_cloudy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_known_qc_codes() {
        assert!(!is_cloudy(0));
        assert!(is_cloudy(16));
        assert!(is_cloudy(32));
        assert!(is_cloudy(48));
        assert!(!is_cloudy(3));
        assert!(!is_cloudy(0b1100_1111));
    }

    #[test]
    fn test_matches_bitfield_for_all_bytes() {
        for qc in 0u16..=255 {
            let field = (qc >> 4) & 3;
            assert_eq!(is_cloudy(qc), field > 0, "QC={}", qc);
        }
    }

    #[test]
    fn test_mask_shape() {
        let qc = array![[0u16, 16], [48, 3]];
        let mask = cloud_mask(&qc);
        assert_eq!(mask, array![[false, true], [true, false]]);
    }
}
