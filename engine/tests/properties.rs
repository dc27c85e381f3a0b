use galaxy_engine::color::Gradient;
use galaxy_engine::shapes::ShapeKernel;
use galaxy_engine::structure::compute_intensity_field;
use galaxy_engine::{
    sampling, warp, BloomSettings, ColorScheme, CosmeticParameters, EllipticalParams, EngineConfig, FractalSettings,
    GalaxyEngine, GalaxyRenderer, GenerationParameters, IrregularParams, LayeredNoise, NoiseLayer, NoiseParameters,
    Point, RingParams, ShapeParameters, SpiralParams, VoronoiParams,
};
use proptest::prelude::*;

fn arb_shape() -> impl Strategy<Value = ShapeParameters> {
    prop_oneof![
        (10.0..800.0f64, 1u32..=12, 0.05..1.5f64, -8.0..8.0f64).prop_map(|(radius, arm_count, arm_width, arm_rotation)| {
            ShapeParameters::Spiral(SpiralParams { radius, arm_count, arm_width, arm_rotation, ..SpiralParams::default() })
        }),
        (10.0..800.0f64, 1u32..=12, 2.0..200.0f64).prop_map(|(radius, cluster_count, cluster_size)| {
            ShapeParameters::VoronoiCluster(VoronoiParams { radius, cluster_count, cluster_size, ..VoronoiParams::default() })
        }),
        (5.0..500.0f64, 0.5..10.0f64, 0.05..1.0f64, -3.0..3.0f64).prop_map(
            |(effective_radius, sersic_index, axis_ratio, orientation)| {
                ShapeParameters::Elliptical(EllipticalParams { effective_radius, sersic_index, axis_ratio, orientation })
            }
        ),
        (10.0..900.0f64, 1.0..200.0f64, 0.0..2.0f64).prop_map(|(ring_radius, ring_width, core_ratio)| {
            ShapeParameters::Ring(RingParams { ring_radius, ring_width, core_ratio, ..RingParams::default() })
        }),
        (10.0..800.0f64, 1u32..=12, 0.0..1.0f64).prop_map(|(radius, clump_count, irregularity)| {
            ShapeParameters::Irregular(IrregularParams { radius, clump_count, irregularity, ..IrregularParams::default() })
        }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn shape_intensity_stays_in_unit_range(
        shape in arb_shape(),
        seed in any::<u64>(),
        px in -500.0..1500.0f64,
        py in -500.0..1500.0f64,
        noise in 0.0..=1.0f64,
    ) {
        prop_assume!(shape.validate().is_ok());
        let kernel = ShapeKernel::prepare(&shape, seed);
        let center = Point::new(500.0, 500.0);
        let value = kernel.intensity(px, py, center, noise);
        prop_assert!((0.0..=1.0).contains(&value), "{value}");
        prop_assert!(kernel.intensity(center.x, center.y, center, noise).is_finite());
    }

    #[test]
    fn shape_intensity_is_deterministic(shape in arb_shape(), seed in any::<u64>(), px in 0.0..1000.0f64) {
        let a = ShapeKernel::prepare(&shape, seed).intensity(px, 400.0, Point::new(500.0, 500.0), 0.3);
        let b = ShapeKernel::prepare(&shape, seed).intensity(px, 400.0, Point::new(500.0, 500.0), 0.3);
        prop_assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn color_is_total_over_all_intensities(intensity in any::<f64>()) {
        let gradient = Gradient::resolve(&ColorScheme::default());
        let color = gradient.color_at(intensity);
        if intensity.is_finite() {
            prop_assert_eq!(color, gradient.color_at(intensity.clamp(0.0, 1.0)));
        }
    }

    #[test]
    fn warp_moves_points_a_bounded_distance(x in 0.0..100.0f64, y in 0.0..100.0f64, strength in 0.0..=1.0f64) {
        let field = warp::warp_field(4, 100, 100).unwrap();
        let (wx, wy) = warp::warp(x, y, strength, &field);
        let limit = strength * warp::WARP_EXTENT * 100.0 + 1e-9;
        prop_assert!((wx - x).abs() <= limit && (wy - y).abs() <= limit);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    #[test]
    fn noise_grid_is_normalized(
        seed in any::<u64>(),
        octaves in 1u32..=10,
        persistence in 0.1..=1.0f64,
        scale in 0.05..5.0f64,
    ) {
        let settings = FractalSettings { octaves, persistence, lacunarity: 2.0, scale };
        let grid = sampling::generate(seed, 100, 100, &settings).unwrap();
        prop_assert!(grid.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn layered_weights_need_not_sum_to_one(seed in any::<u64>(), a in 0.0..5.0f64, b in 0.1..5.0f64) {
        let layered = LayeredNoise {
            macro_layer: NoiseLayer { scale: 0.3, weight: a },
            meso_layer: NoiseLayer { scale: 1.5, weight: b },
            micro_layer: NoiseLayer { scale: 6.0, weight: 0.2 },
        };
        let grid = sampling::generate_layered(seed, 100, 100, &layered).unwrap();
        prop_assert!(grid.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn layered_fields_stay_in_range(seed in any::<u64>(), warp_strength in 0.0..=1.0f64) {
        let params = GenerationParameters {
            width: 100,
            height: 100,
            seed,
            noise: NoiseParameters::Layered(LayeredNoise::default()),
            warp_strength,
            ..GenerationParameters::default()
        };
        let field = compute_intensity_field(&params).unwrap();
        prop_assert!(field.values().iter().all(|v| (0.0..=1.0).contains(v)));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(4))]

    #[test]
    fn bloom_intensity_never_recomputes_the_structure(seed in any::<u64>(), a in 0.0..2.0f64, b in 0.0..2.0f64) {
        let engine = GalaxyEngine::new(EngineConfig { worker_threads: 2, ..EngineConfig::default() }).unwrap();
        let params = GenerationParameters { seed, width: 100, height: 100, ..GenerationParameters::default() };
        let bloom = |intensity| CosmeticParameters {
            bloom: BloomSettings { enabled: true, intensity, ..BloomSettings::default() },
            ..CosmeticParameters::default()
        };
        let first = engine.render(&params, &bloom(a)).unwrap();
        let second = engine.render(&params, &bloom(b)).unwrap();
        prop_assert_eq!(first.structural_hash, second.structural_hash);
        prop_assert_eq!(engine.cache_stats().structures.computations, 1);
        if a != b {
            prop_assert_ne!(first.cosmetic_hash, second.cosmetic_hash);
        }
    }
}
