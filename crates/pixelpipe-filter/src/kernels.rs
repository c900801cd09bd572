use std::f64::consts::PI;

/// Sobel kernel for the horizontal gradient.
pub const SOBEL_X: [[i32; 3]; 3] = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];

/// Sobel kernel for the vertical gradient.
pub const SOBEL_Y: [[i32; 3]; 3] = [[-1, -2, -1], [0, 0, 0], [1, 2, 1]];

/// Create a square gaussian kernel.
///
/// The 2D gaussian density is sampled at integer offsets `-N/2..=N/2` and
/// normalized so the weights sum to one.
///
/// # Arguments
///
/// * `sigma` - The sigma of the gaussian kernel.
///
/// # Returns
///
/// The kernel indexed as `kernel[dy + N / 2][dx + N / 2]`.
pub fn gaussian_kernel_2d<const N: usize>(sigma: f64) -> [[f64; N]; N] {
    let half = (N / 2) as i64;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut kernel = [[0.0f64; N]; N];
    for (ky, row) in kernel.iter_mut().enumerate() {
        for (kx, k) in row.iter_mut().enumerate() {
            let dy = ky as i64 - half;
            let dx = kx as i64 - half;
            let r_sq = (dx * dx + dy * dy) as f64;
            *k = (-r_sq / two_sigma_sq).exp() / (PI * two_sigma_sq);
        }
    }

    // normalize the kernel
    let norm: f64 = kernel.iter().flatten().sum();
    kernel.iter_mut().flatten().for_each(|k| *k /= norm);
    kernel
}
