#![cfg(feature = "rayon")]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ssimkit::lowlevel::{
    gaussian_blur, gaussian_blur_par, ssim_combine, ssim_combine_par, BlurScratch, LocalStats,
    ScalarKernel,
};
use ssimkit::{GaussianKernel, ImageView, Ssim, SsimConfig};

fn random_plane(rng: &mut StdRng, len: usize) -> Vec<f32> {
    (0..len).map(|_| rng.random_range(0..=255) as f32).collect()
}

#[test]
fn parallel_engine_matches_sequential_engine() {
    let mut rng = StdRng::seed_from_u64(17);
    let (w, h) = (53, 41);
    let a: Vec<u8> = (0..w * h * 4).map(|_| rng.random_range(0..=255)).collect();
    let b: Vec<u8> = (0..w * h * 4).map(|_| rng.random_range(0..=255)).collect();
    let va = ImageView::from_slice(&a, w, h, 4).unwrap();
    let vb = ImageView::from_slice(&b, w, h, 4).unwrap();

    let mut parallel = Ssim::new(4).unwrap();
    let mut sequential = Ssim::with_config(SsimConfig {
        parallel: false,
        ..SsimConfig::with_channels(4)
    })
    .unwrap();

    let mean_par = parallel.compute_mean(va, vb).unwrap();
    let mean_seq = sequential.compute_mean(va, vb).unwrap();

    assert_eq!(
        parallel.similarity_map().unwrap().to_vecs(),
        sequential.similarity_map().unwrap().to_vecs()
    );
    for c in 0..4 {
        assert!((mean_par[c] - mean_seq[c]).abs() < 1e-9);
    }
}

#[test]
fn parallel_drivers_match_sequential_drivers() {
    let mut rng = StdRng::seed_from_u64(29);
    let (w, h) = (33, 27);
    let x = random_plane(&mut rng, w * h);
    let y = random_plane(&mut rng, w * h);
    let kernel = GaussianKernel::new(7, 1.2).unwrap();

    let mut seq = vec![0.0f32; w * h];
    let mut par = vec![0.0f32; w * h];
    gaussian_blur::<ScalarKernel>(&x, &mut seq, w, h, &kernel, &mut BlurScratch::new()).unwrap();
    gaussian_blur_par::<ScalarKernel>(&x, &mut par, w, h, &kernel, &mut BlurScratch::new())
        .unwrap();
    assert_eq!(seq, par);

    let mut stats = LocalStats::new();
    stats.compute(&x, &y, w, h, &kernel).unwrap();
    let mut map_seq = vec![0.0f32; w * h];
    let mut map_par = vec![0.0f32; w * h];
    ssim_combine::<ScalarKernel>(stats.combine_inputs(), 6.5536, 58.9824, &mut map_seq).unwrap();
    ssim_combine_par::<ScalarKernel>(stats.combine_inputs(), 6.5536, 58.9824, &mut map_par, w)
        .unwrap();
    assert_eq!(map_seq, map_par);
}
