use criterion::{criterion_group, criterion_main, Criterion};
use ssimkit::lowlevel::{gaussian_blur, BlurScratch, ScalarKernel};
use ssimkit::{GaussianKernel, ImageView, Ssim, SsimConfig};
use std::hint::black_box;

fn make_image(width: usize, height: usize, channels: usize, seed: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(width * height * channels);
    for y in 0..height {
        for x in 0..width {
            for c in 0..channels {
                let value = ((x * 13) ^ (y * 7) ^ (x * y) ^ (c * 31 + seed)) & 0xFF;
                data.push(value as u8);
            }
        }
    }
    data
}

fn bench_engine(c: &mut Criterion) {
    let (width, height) = (512, 512);
    let a = make_image(width, height, 3, 0);
    let b = make_image(width, height, 3, 5);
    let va = ImageView::from_slice(&a, width, height, 3).unwrap();
    let vb = ImageView::from_slice(&b, width, height, 3).unwrap();

    let mut sequential = Ssim::with_config(SsimConfig {
        parallel: false,
        ..SsimConfig::with_channels(3)
    })
    .unwrap();
    c.bench_function("ssim_rgb_512_sequential", |bench| {
        bench.iter(|| black_box(sequential.compute_mean(va, vb).unwrap()));
    });

    if cfg!(feature = "rayon") {
        let mut parallel = Ssim::new(3).unwrap();
        c.bench_function("ssim_rgb_512_parallel", |bench| {
            bench.iter(|| black_box(parallel.compute_mean(va, vb).unwrap()));
        });
    }

    let mut engine = Ssim::new(3).unwrap();
    c.bench_function("ssim_rgb_512_submit_synchronize", |bench| {
        bench.iter(|| {
            let mut submission = engine.submit(va, vb).unwrap();
            engine.synchronize(&mut submission).unwrap();
            black_box(engine.mean_similarity().unwrap())
        });
    });
}

fn bench_blur(c: &mut Criterion) {
    let (width, height) = (1024, 1024);
    let src: Vec<f32> = make_image(width, height, 1, 0)
        .into_iter()
        .map(f32::from)
        .collect();
    let mut dst = vec![0.0f32; width * height];
    let mut scratch = BlurScratch::new();
    let kernel = GaussianKernel::new(11, 1.5).unwrap();

    c.bench_function("gaussian_blur_1024_scalar", |bench| {
        bench.iter(|| {
            gaussian_blur::<ScalarKernel>(&src, &mut dst, width, height, &kernel, &mut scratch)
                .unwrap();
            black_box(dst[0])
        });
    });

    #[cfg(feature = "simd")]
    c.bench_function("gaussian_blur_1024_simd", |bench| {
        bench.iter(|| {
            gaussian_blur::<ssimkit::lowlevel::SimdKernel>(
                &src,
                &mut dst,
                width,
                height,
                &kernel,
                &mut scratch,
            )
            .unwrap();
            black_box(dst[0])
        });
    });
}

criterion_group!(benches, bench_engine, bench_blur);
criterion_main!(benches);
