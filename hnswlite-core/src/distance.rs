//! SIMD-accelerated squared Euclidean distance for vector comparison.
//!
//! # Performance Strategy
//!
//! Uses 4-way accumulator unrolling to break FMA dependency chains:
//! - FMA latency: ~4 cycles
//! - FMA throughput: 0.5 cycles (2 ops/cycle)
//! - Single accumulator: Pipeline stalls, limited by latency
//! - Four accumulators: Pipeline stays full, limited by throughput
//!
//! Expected speedup: 4-6x on high-dimensional vectors (768-1536D).
//!
//! Only squared L2 is implemented here: the square root is never taken
//! because it does not change the ordering of distances, and skipping it
//! saves a transcendental call on every comparison.

/// Compute the squared L2 (Euclidean) distance between two vectors with
/// SIMD acceleration.
///
/// # Architecture Dispatch
///
/// - x86_64 + AVX2: Uses AVX2 intrinsics (runtime detection)
/// - aarch64: Uses NEON intrinsics (always available)
/// - Fallback: Portable scalar implementation
///
/// # Panics
///
/// In debug builds, panics if `a.len() != b.len()`.
#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    #[cfg(target_arch = "x86_64")]
    {
        if is_x86_feature_detected!("avx2") {
            return unsafe { squared_euclidean_avx2(a, b) };
        }
    }

    #[cfg(target_arch = "aarch64")]
    {
        return unsafe { squared_euclidean_neon(a, b) };
    }

    squared_euclidean_scalar(a, b)
}

/// Scalar implementation (portable fallback, and the reference other kernels
/// are checked against).
#[inline]
pub fn squared_euclidean_scalar(a: &[f32], b: &[f32]) -> f32 {
    let mut sum = 0.0_f32;

    for i in 0..a.len() {
        let diff = a[i] - b[i];
        sum += diff * diff;
    }

    sum
}

/// AVX2 implementation with 4-way accumulator unrolling (x86_64 only).
///
/// # Loop Structure
///
/// Main loop: Process 32 floats/iteration (4 accumulators × 8 floats/vector).
/// Tail loop: Process remaining 8-float chunks.
/// Scalar tail: Process final <8 elements.
#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2", enable = "fma")]
unsafe fn squared_euclidean_avx2(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::x86_64::*;

    let len = a.len();
    let mut i = 0;

    // Four independent accumulators to break dependency chains
    let mut sum0 = _mm256_setzero_ps();
    let mut sum1 = _mm256_setzero_ps();
    let mut sum2 = _mm256_setzero_ps();
    let mut sum3 = _mm256_setzero_ps();

    while i + 32 <= len {
        let va0 = unsafe { _mm256_loadu_ps(a.as_ptr().add(i)) };
        let vb0 = unsafe { _mm256_loadu_ps(b.as_ptr().add(i)) };
        let diff0 = _mm256_sub_ps(va0, vb0);

        let va1 = unsafe { _mm256_loadu_ps(a.as_ptr().add(i + 8)) };
        let vb1 = unsafe { _mm256_loadu_ps(b.as_ptr().add(i + 8)) };
        let diff1 = _mm256_sub_ps(va1, vb1);

        let va2 = unsafe { _mm256_loadu_ps(a.as_ptr().add(i + 16)) };
        let vb2 = unsafe { _mm256_loadu_ps(b.as_ptr().add(i + 16)) };
        let diff2 = _mm256_sub_ps(va2, vb2);

        let va3 = unsafe { _mm256_loadu_ps(a.as_ptr().add(i + 24)) };
        let vb3 = unsafe { _mm256_loadu_ps(b.as_ptr().add(i + 24)) };
        let diff3 = _mm256_sub_ps(va3, vb3);

        sum0 = _mm256_fmadd_ps(diff0, diff0, sum0);
        sum1 = _mm256_fmadd_ps(diff1, diff1, sum1);
        sum2 = _mm256_fmadd_ps(diff2, diff2, sum2);
        sum3 = _mm256_fmadd_ps(diff3, diff3, sum3);

        i += 32;
    }

    while i + 8 <= len {
        let va = unsafe { _mm256_loadu_ps(a.as_ptr().add(i)) };
        let vb = unsafe { _mm256_loadu_ps(b.as_ptr().add(i)) };
        let diff = _mm256_sub_ps(va, vb);
        sum0 = _mm256_fmadd_ps(diff, diff, sum0);
        i += 8;
    }

    let sum_combined = _mm256_add_ps(_mm256_add_ps(sum0, sum1), _mm256_add_ps(sum2, sum3));

    // Horizontal reduction: sum 8 lanes into a scalar.
    let sum_high = _mm256_extractf128_ps(sum_combined, 1);
    let sum_low = _mm256_castps256_ps128(sum_combined);
    let sum128 = _mm_add_ps(sum_low, sum_high);

    let sum64 = _mm_add_ps(sum128, _mm_movehl_ps(sum128, sum128));
    let sum32 = _mm_add_ss(sum64, _mm_shuffle_ps(sum64, sum64, 0x55));

    let mut total = _mm_cvtss_f32(sum32);

    while i < len {
        let diff = a[i] - b[i];
        total += diff * diff;
        i += 1;
    }

    total
}

/// NEON implementation with 4-way accumulator unrolling (aarch64).
///
/// Same strategy as AVX2: 4 independent accumulators to maximize throughput.
/// NEON processes 4 floats per vector (vs 8 for AVX2), so the main loop
/// processes 16 floats per iteration.
#[cfg(target_arch = "aarch64")]
#[target_feature(enable = "neon")]
unsafe fn squared_euclidean_neon(a: &[f32], b: &[f32]) -> f32 {
    use std::arch::aarch64::*;

    let len = a.len();
    let mut i = 0;

    let mut sum0 = vdupq_n_f32(0.0);
    let mut sum1 = vdupq_n_f32(0.0);
    let mut sum2 = vdupq_n_f32(0.0);
    let mut sum3 = vdupq_n_f32(0.0);

    while i + 16 <= len {
        let va0 = vld1q_f32(a.as_ptr().add(i));
        let vb0 = vld1q_f32(b.as_ptr().add(i));
        let diff0 = vsubq_f32(va0, vb0);

        let va1 = vld1q_f32(a.as_ptr().add(i + 4));
        let vb1 = vld1q_f32(b.as_ptr().add(i + 4));
        let diff1 = vsubq_f32(va1, vb1);

        let va2 = vld1q_f32(a.as_ptr().add(i + 8));
        let vb2 = vld1q_f32(b.as_ptr().add(i + 8));
        let diff2 = vsubq_f32(va2, vb2);

        let va3 = vld1q_f32(a.as_ptr().add(i + 12));
        let vb3 = vld1q_f32(b.as_ptr().add(i + 12));
        let diff3 = vsubq_f32(va3, vb3);

        sum0 = vfmaq_f32(sum0, diff0, diff0);
        sum1 = vfmaq_f32(sum1, diff1, diff1);
        sum2 = vfmaq_f32(sum2, diff2, diff2);
        sum3 = vfmaq_f32(sum3, diff3, diff3);

        i += 16;
    }

    while i + 4 <= len {
        let va = vld1q_f32(a.as_ptr().add(i));
        let vb = vld1q_f32(b.as_ptr().add(i));
        let diff = vsubq_f32(va, vb);
        sum0 = vfmaq_f32(sum0, diff, diff);
        i += 4;
    }

    let sum_combined = vaddq_f32(vaddq_f32(sum0, sum1), vaddq_f32(sum2, sum3));

    let sum_pair = vpadd_f32(vget_low_f32(sum_combined), vget_high_f32(sum_combined));
    let sum_total = vpadd_f32(sum_pair, sum_pair);

    let mut total = vget_lane_f32(sum_total, 0);

    while i < len {
        let diff = a[i] - b[i];
        total += diff * diff;
        i += 1;
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_squared_euclidean_basic() {
        let a = vec![1.0, 2.0, 3.0];
        let b = vec![4.0, 5.0, 6.0];

        let dist = squared_euclidean(&a, &b);
        let expected = 3.0_f32.powi(2) * 3.0;

        assert!((dist - expected).abs() < 1e-6);
    }

    #[test]
    fn test_distance_identity() {
        let a = vec![0.3, -1.2, 5.0, 7.7];
        assert_eq!(squared_euclidean(&a, &a), 0.0);
    }

    #[test]
    fn test_distance_symmetry() {
        let a = vec![1.0, 2.0, 3.0, 4.0];
        let b = vec![-1.0, 0.5, 2.0, 9.0];
        assert_eq!(squared_euclidean(&a, &b), squared_euclidean(&b, &a));
    }

    #[test]
    fn test_simd_correctness_small() {
        // Exercises the scalar tail only (sizes below any SIMD lane width).
        for size in [3, 7, 15, 31] {
            let a: Vec<f32> = (0..size).map(|i| i as f32 * 0.1).collect();
            let b: Vec<f32> = (0..size).map(|i| (i as f32) * 0.1 + 0.5).collect();

            let simd_result = squared_euclidean(&a, &b);
            let scalar_result = squared_euclidean_scalar(&a, &b);

            assert!(
                (simd_result - scalar_result).abs() < 1e-5,
                "SIMD mismatch at size {size}: simd={simd_result}, scalar={scalar_result}"
            );
        }
    }

    #[test]
    fn test_simd_correctness_large() {
        // Exercises the main unrolled loop.
        for size in [128, 384, 768, 1536] {
            let a: Vec<f32> = (0..size).map(|i| (i as f32).sin()).collect();
            let b: Vec<f32> = (0..size).map(|i| (i as f32).cos()).collect();

            let simd_result = squared_euclidean(&a, &b);
            let scalar_result = squared_euclidean_scalar(&a, &b);

            assert!(
                (simd_result - scalar_result).abs() < 1e-3,
                "SIMD mismatch at size {size}: simd={simd_result}, scalar={scalar_result}"
            );
        }
    }

    #[test]
    fn test_simd_random_vectors() {
        use std::collections::hash_map::RandomState;
        use std::hash::{BuildHasher, Hash, Hasher};

        fn hash_to_f32(seed: u64) -> f32 {
            let state = RandomState::new();
            let mut hasher = state.build_hasher();
            seed.hash(&mut hasher);
            let hash = hasher.finish();
            ((hash % 10000) as f32) / 10000.0
        }

        for dims in [64, 256, 512, 1024] {
            let a: Vec<f32> = (0..dims).map(|i| hash_to_f32(i as u64)).collect();
            let b: Vec<f32> = (0..dims).map(|i| hash_to_f32((i + 1000) as u64)).collect();

            let simd_result = squared_euclidean(&a, &b);
            let scalar_result = squared_euclidean_scalar(&a, &b);

            assert!(
                (simd_result - scalar_result).abs() < 1e-3,
                "Random vector mismatch at dims {dims}: simd={simd_result}, scalar={scalar_result}"
            );
        }
    }

    #[test]
    fn test_simd_edge_cases() {
        let a = vec![0.0; 128];
        let b = vec![0.0; 128];
        assert_eq!(squared_euclidean(&a, &b), 0.0);

        let c = vec![1.0; 256];
        let d = vec![1.0; 256];
        assert_eq!(squared_euclidean(&c, &d), 0.0);

        let mut e = vec![0.0; 512];
        let f = vec![0.0; 512];
        e[100] = 100.0;

        let dist = squared_euclidean(&e, &f);
        assert!((dist - 10_000.0).abs() < 1e-2);
    }

    #[test]
    fn test_simd_negative_values() {
        let a = vec![-1.0, -2.0, -3.0, -4.0];
        let b = vec![1.0, 2.0, 3.0, 4.0];

        let dist = squared_euclidean(&a, &b);
        let expected = 2.0_f32.powi(2) + 4.0_f32.powi(2) + 6.0_f32.powi(2) + 8.0_f32.powi(2);

        assert!((dist - expected).abs() < 1e-5);
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_avx2_specific() {
        if is_x86_feature_detected!("avx2") {
            let a: Vec<f32> = (0..1024).map(|i| i as f32 * 0.01).collect();
            let b: Vec<f32> = (0..1024).map(|i| (i as f32) * 0.01 + 1.0).collect();

            let avx2_result = unsafe { squared_euclidean_avx2(&a, &b) };
            let scalar_result = squared_euclidean_scalar(&a, &b);

            assert!(
                (avx2_result - scalar_result).abs() < 1e-2,
                "AVX2 vs scalar mismatch: avx2={avx2_result}, scalar={scalar_result}"
            );
        }
    }

    #[cfg(target_arch = "aarch64")]
    #[test]
    fn test_neon_specific() {
        let a: Vec<f32> = (0..1024).map(|i| i as f32 * 0.01).collect();
        let b: Vec<f32> = (0..1024).map(|i| (i as f32) * 0.01 + 1.0).collect();

        let neon_result = unsafe { squared_euclidean_neon(&a, &b) };
        let scalar_result = squared_euclidean_scalar(&a, &b);

        assert!(
            (neon_result - scalar_result).abs() < 1e-2,
            "NEON vs scalar mismatch: neon={neon_result}, scalar={scalar_result}"
        );
    }
}
