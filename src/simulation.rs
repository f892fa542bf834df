//! Binary-symmetric-channel helpers for simulations and tests.

use rand::Rng;

/// Flips each bit independently with probability `p`.
pub fn flip_bits<R: Rng>(rng: &mut R, bits: &mut [u8], p: f64) {
    for bit in bits.iter_mut() {
        if rng.gen::<f64>() < p {
            *bit ^= 1;
        }
    }
}

/// Log-likelihood ratios for a string observed through a BSC with flip
/// probability `p`: `llr_j = ln((1−p)/p) · (1 − 2·y_j)`. Positive favors 0.
pub fn bsc_llrs(noisy_bits: &[u8], p: f64) -> Vec<f64> {
    let vlog = ((1.0 - p) / p).ln();
    noisy_bits
        .iter()
        .map(|&b| vlog * (1.0 - 2.0 * (b != 0) as u8 as f64))
        .collect()
}

/// Shannon binary entropy of `p`, in bits.
pub fn binary_entropy(p: f64) -> f64 {
    -p * p.log2() - (1.0 - p) * (1.0 - p).log2()
}

/// Deterministic test pattern: eight zeros, eight ones, repeating for the
/// first 128 positions; any remainder is zero-filled.
pub fn stripe_pattern(n: usize) -> Vec<u8> {
    let mut out = vec![0u8; n];
    for (i, bit) in out.iter_mut().enumerate().take(128) {
        *bit = ((i / 8) % 2) as u8;
    }
    out
}

/// Order-sensitive fingerprint of an integer sequence, for locking test
/// vectors across implementations.
pub fn hash_sequence<T: Copy + Into<u32>>(values: &[T]) -> u32 {
    let mut seed = values.len() as u32;
    for &v in values {
        let v: u32 = v.into();
        seed ^= v
            .wrapping_add(0x9e37_79b9)
            .wrapping_add(seed << 6)
            .wrapping_add(seed >> 2);
    }
    seed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_stripe_pattern() {
        let s = stripe_pattern(20);
        assert_eq!(&s[..8], &[0; 8]);
        assert_eq!(&s[8..16], &[1; 8]);
        assert_eq!(&s[16..20], &[0; 4]);
        let long = stripe_pattern(200);
        assert_eq!(&long[120..128], &[1; 8]);
        assert_eq!(&long[128..], &[0u8; 72][..]);
    }

    #[test]
    fn test_bsc_llrs_signs() {
        let llrs = bsc_llrs(&[0, 1], 0.1);
        assert!(llrs[0] > 0.0);
        assert!(llrs[1] < 0.0);
        assert!((llrs[0] + llrs[1]).abs() < 1e-12);
        assert!((llrs[0] - (9.0f64).ln()).abs() < 1e-12);
    }

    #[test]
    fn test_flip_bits_is_seeded() {
        let mut a = vec![0u8; 1000];
        let mut b = vec![0u8; 1000];
        flip_bits(&mut ChaCha8Rng::seed_from_u64(7), &mut a, 0.25);
        flip_bits(&mut ChaCha8Rng::seed_from_u64(7), &mut b, 0.25);
        assert_eq!(a, b);

        let flipped = a.iter().filter(|&&x| x == 1).count();
        assert!(flipped > 150 && flipped < 350);
    }

    #[test]
    fn test_hash_sequence_discriminates() {
        let a = hash_sequence::<u8>(&[0, 1, 1, 0]);
        let b = hash_sequence::<u8>(&[0, 1, 0, 1]);
        assert_ne!(a, b);
        assert_eq!(a, hash_sequence::<u8>(&[0, 1, 1, 0]));
    }

    #[test]
    fn test_binary_entropy() {
        assert!((binary_entropy(0.5) - 1.0).abs() < 1e-12);
        assert!(binary_entropy(0.04) < 0.25);
    }
}
