// Riffle
// Copyright (c) 2024 The Project Riffle Developers.
//
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The `conv` module provides the numeric conversions between linear PCM samples and normalized
//! floating point samples in the range [-1.0, 1.0].
//!
//! All functions are pure. Out-of-range floating point input is clamped, never wrapped.

use crate::errors::{unsupported_error, Result};

/// `PcmDepth` enumerates the bit depths that a signed integer sample may be normalized from.
///
/// Only 8, 16, and 32 bits per sample are supported. Every other depth must be added deliberately.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PcmDepth {
    /// 8-bit PCM. Follows the legacy convention where samples are stored unsigned and offset by
    /// 0x80.
    Pcm8,
    /// Signed 16-bit PCM.
    Pcm16,
    /// Signed 32-bit PCM.
    Pcm32,
}

impl PcmDepth {
    /// Get the `PcmDepth` for a stream with `bits_per_sample` bits per sample.
    pub fn try_from_bits(bits_per_sample: u32) -> Result<PcmDepth> {
        match bits_per_sample {
            8 => Ok(PcmDepth::Pcm8),
            16 => Ok(PcmDepth::Pcm16),
            32 => Ok(PcmDepth::Pcm32),
            _ => unsupported_error("pcm: cannot normalize samples of this bit depth"),
        }
    }

    /// The number of bits per sample.
    pub fn bits(self) -> u32 {
        match self {
            PcmDepth::Pcm8 => 8,
            PcmDepth::Pcm16 => 16,
            PcmDepth::Pcm32 => 32,
        }
    }

    /// Convert a signed sample at this bit depth to a normalized floating point sample.
    #[inline(always)]
    pub fn to_float(self, sample: i32) -> f64 {
        match self {
            PcmDepth::Pcm8 => u8_to_float(0x80i32.wrapping_add(sample) as u8),
            PcmDepth::Pcm16 => i16_to_float(sample as i16),
            PcmDepth::Pcm32 => i32_to_float(sample),
        }
    }
}

/// Convert a signed `bits_per_sample`-bit linear PCM sample to a normalized floating point sample.
///
/// Fails with `Unsupported` for any bit depth other than 8, 16, or 32.
pub fn int_to_float(sample: i32, bits_per_sample: u32) -> Result<f64> {
    Ok(PcmDepth::try_from_bits(bits_per_sample)?.to_float(sample))
}

/// Convert an unsigned (0x80 offset) 8-bit sample to a normalized floating point sample.
#[inline(always)]
pub fn u8_to_float(sample: u8) -> f64 {
    (f64::from(sample) - 128.0) / 128.0
}

/// Convert a signed 16-bit sample to a normalized floating point sample.
#[inline(always)]
pub fn i16_to_float(sample: i16) -> f64 {
    f64::from(sample) / 32768.0
}

/// Convert a signed 32-bit sample to a normalized floating point sample.
#[inline(always)]
pub fn i32_to_float(sample: i32) -> f64 {
    f64::from(sample) / 2147483648.0
}

/// Convert a normalized floating point sample to an unsigned (0x80 offset) 8-bit sample.
#[inline(always)]
pub fn float_to_u8(sample: f64) -> u8 {
    ((sample * 128.0).round().clamp(-128.0, 127.0) as i32 + 0x80) as u8
}

/// Convert a normalized floating point sample to a signed 16-bit PCM sample.
///
/// Rounds to the nearest integer and clamps to [-32768, 32767]. NaN converts to 0.
#[inline(always)]
pub fn float_to_pcm16(sample: f64) -> i16 {
    (sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16
}

/// Convert a normalized floating point sample to a signed 32-bit PCM sample.
#[inline(always)]
pub fn float_to_i32(sample: f64) -> i32 {
    (sample * 2147483648.0).round().clamp(-2147483648.0, 2147483647.0) as i32
}

/// Convert a normalized floating point sample to the little-endian byte layout of a 16-bit PCM
/// sample.
#[inline(always)]
pub fn float_to_pcm16_le(sample: f64) -> [u8; 2] {
    float_to_pcm16(sample).to_le_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    #[test]
    fn verify_int_to_float_full_scale() {
        assert_eq!(int_to_float(-128, 8).unwrap(), -1.0);
        assert_eq!(int_to_float(0, 8).unwrap(), 0.0);
        assert_eq!(int_to_float(127, 8).unwrap(), 127.0 / 128.0);

        assert_eq!(int_to_float(i32::from(i16::MIN), 16).unwrap(), -1.0);
        assert_eq!(int_to_float(0, 16).unwrap(), 0.0);
        assert_eq!(int_to_float(16384, 16).unwrap(), 0.5);
        assert_eq!(int_to_float(i32::from(i16::MAX), 16).unwrap(), 32767.0 / 32768.0);

        assert_eq!(int_to_float(i32::MIN, 32).unwrap(), -1.0);
        assert_eq!(int_to_float(0, 32).unwrap(), 0.0);
        assert_eq!(int_to_float(1 << 30, 32).unwrap(), 0.5);
    }

    #[test]
    fn verify_int_to_float_unsupported_depths() {
        for bps in [0, 4, 12, 20, 24, 33] {
            match int_to_float(0, bps) {
                Err(Error::Unsupported(_)) => (),
                res => panic!("expected unsupported for {} bits, got {:?}", bps, res),
            }
        }
    }

    #[test]
    fn verify_pcm_depth() {
        assert_eq!(PcmDepth::try_from_bits(8).unwrap(), PcmDepth::Pcm8);
        assert_eq!(PcmDepth::try_from_bits(16).unwrap(), PcmDepth::Pcm16);
        assert_eq!(PcmDepth::try_from_bits(32).unwrap(), PcmDepth::Pcm32);
        assert!(PcmDepth::try_from_bits(24).is_err());

        for depth in [PcmDepth::Pcm8, PcmDepth::Pcm16, PcmDepth::Pcm32] {
            assert_eq!(PcmDepth::try_from_bits(depth.bits()).unwrap(), depth);
        }
    }

    #[test]
    fn verify_float_to_pcm16() {
        assert_eq!(float_to_pcm16(0.0), 0);
        assert_eq!(float_to_pcm16(0.5), 16384);
        assert_eq!(float_to_pcm16(-0.5), -16384);
        assert_eq!(float_to_pcm16(-1.0), i16::MIN);
        assert_eq!(float_to_pcm16(1.0), i16::MAX);

        // Rounds to nearest.
        assert_eq!(float_to_pcm16(1.4 / 32768.0), 1);
        assert_eq!(float_to_pcm16(1.6 / 32768.0), 2);
        assert_eq!(float_to_pcm16(-1.6 / 32768.0), -2);

        // Clamps rather than wraps.
        assert_eq!(float_to_pcm16(1.5), i16::MAX);
        assert_eq!(float_to_pcm16(-7.0), i16::MIN);
        assert_eq!(float_to_pcm16(f64::INFINITY), i16::MAX);
        assert_eq!(float_to_pcm16(f64::NEG_INFINITY), i16::MIN);
        assert_eq!(float_to_pcm16(f64::NAN), 0);
    }

    #[test]
    fn verify_float_to_pcm16_le() {
        assert_eq!(float_to_pcm16_le(0.0), [0x00, 0x00]);
        assert_eq!(float_to_pcm16_le(1.0), [0xff, 0x7f]);
        assert_eq!(float_to_pcm16_le(-1.0), [0x00, 0x80]);
        assert_eq!(float_to_pcm16_le(-1.0 / 32768.0), [0xff, 0xff]);
        assert_eq!(float_to_pcm16_le(256.0 / 32768.0), [0x00, 0x01]);
    }

    #[test]
    fn verify_u8_and_i32_conversions() {
        assert_eq!(float_to_u8(-1.0), 0x00);
        assert_eq!(float_to_u8(0.0), 0x80);
        assert_eq!(float_to_u8(1.0), 0xff);
        assert_eq!(float_to_u8(2.0), 0xff);
        assert_eq!(u8_to_float(0x80), 0.0);

        assert_eq!(float_to_i32(-1.0), i32::MIN);
        assert_eq!(float_to_i32(1.0), i32::MAX);
        assert_eq!(float_to_i32(0.5), 1 << 30);
    }

    #[test]
    fn verify_pcm16_round_trip_is_exact() {
        for sample in (i16::MIN..=i16::MAX).step_by(97) {
            assert_eq!(float_to_pcm16(i16_to_float(sample)), sample);
        }
        assert_eq!(float_to_pcm16(i16_to_float(i16::MAX)), i16::MAX);
    }

    #[test]
    fn verify_float_round_trip_within_quantization_error() {
        let mut x = -1.0f64;
        while x <= 1.0 {
            let recovered = i16_to_float(float_to_pcm16(x));
            assert!((x - recovered).abs() <= 1.0 / 32768.0, "x={} recovered={}", x, recovered);
            x += 0.000731;
        }
    }
}
