//! Envelope detection

/// Envelope-detect a block of interleaved IQ bytes
///
/// `iq` holds interleaved unsigned I/Q samples, biased around `0x80`
/// as delivered by RTL2832-style tuners. Each pair is re-centered with
/// an XOR and reduced to its squared magnitude, which is monotonic in
/// the true magnitude and avoids a square root per sample; the level
/// slicer downstream absorbs the non-linearity.
///
/// `decimation` drops all but the first pair of every `2^decimation`
/// pairs, nearest-neighbour style. The OOK envelope of a 433 MHz sensor
/// is slow relative to 48 kHz, so no anti-alias filter is needed ahead
/// of the decimator.
///
/// The result is written to `out`, replacing its previous contents.
/// Output length is `ceil(iq.len()/2 / 2^decimation)`.
///
/// Odd-length blocks are disallowed by the upstream driver contract.
pub(crate) fn envelope_detect(iq: &[u8], decimation: u32, out: &mut Vec<u16>) {
    assert_eq!(iq.len() % 2, 0, "IQ blocks are interleaved byte pairs");

    let stride = 1usize << decimation;
    out.clear();
    out.reserve(iq.len() / 2 / stride + 1);
    for pair in iq.chunks(2 * stride) {
        let re = (pair[0] ^ 0x80) as i8 as i32;
        let im = (pair[1] ^ 0x80) as i8 as i32;
        out.push((re * re + im * im) as u16);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detect(iq: &[u8], decimation: u32) -> Vec<u16> {
        let mut out = Vec::new();
        envelope_detect(iq, decimation, &mut out);
        out
    }

    #[test]
    fn test_dc_bias_is_zero() {
        // 0x80 is the zero point of the ADC
        assert_eq!(detect(&[0x80, 0x80], 0), &[0]);
        assert_eq!(detect(&[0x80u8; 64], 0), vec![0u16; 32]);
    }

    #[test]
    fn test_magnitude_squared() {
        // full positive swing: (0xff ^ 0x80) as i8 == 127
        assert_eq!(detect(&[0xff, 0xff], 0), &[127 * 127 * 2]);
        // full negative swing: (0x00 ^ 0x80) as i8 == -128
        assert_eq!(detect(&[0x00, 0x00], 0), &[32768]);
        // unit excursions on either rail
        assert_eq!(detect(&[0x81, 0x7f], 0), &[2]);
    }

    #[test]
    fn test_decimation_keeps_first_of_stride() {
        let iq = [0xff, 0xff, 0x80, 0x80, 0x81, 0x81, 0x80, 0x80];
        assert_eq!(detect(&iq, 0), &[32258, 0, 2, 0]);
        assert_eq!(detect(&iq, 1), &[32258, 2]);
        assert_eq!(detect(&iq, 2), &[32258]);
    }

    #[test]
    fn test_partial_stride_still_emits() {
        // three pairs at decimation 1: output is ceil(3/2) = 2
        let iq = [0xff, 0xff, 0x80, 0x80, 0x81, 0x81];
        assert_eq!(detect(&iq, 1), &[32258, 2]);
    }

    #[test]
    fn test_output_replaces_previous() {
        let mut out = vec![99u16; 8];
        envelope_detect(&[0x80, 0x80], 0, &mut out);
        assert_eq!(out, &[0]);
    }
}
