use riverflow::classify::speed_scale;
use riverflow::{
    Config, DisplayMode, EngineBuilder, FetchOutcome, FlowEngine, FlowRecord, Level, LoadStatus,
    MemoryProvider, Month, Rgba, Sample, SharedEngine, SpatialHash, Viewport, WeightingScheme,
    interpolate,
};
use std::time::Duration;

fn level(zoom: u8) -> Level {
    Level {
        zoom,
        buffer: 5.0,
        hash_size: 10.0,
        search_radius: 8.0,
        polyline_count: 30,
        segment_length: 4.0,
        segment_count_min: 4,
        segment_count_max: 20,
        url: "https://example.com/rivers/FeatureServer/0".to_string(),
    }
}

/// A river flowing east across a 200x100 map, mapped 1:1 onto pixels.
fn river_records() -> Vec<FlowRecord> {
    (0..50)
        .map(|i| {
            FlowRecord::new(f64::from(i) * 4.0, 50.0)
                .with_flows(90.0, [1000.0; 12])
                .with("V", 800.0)
                .with("D", 1.0)
                .with("OBJECTID", f64::from(i))
        })
        .collect()
}

fn engine() -> FlowEngine {
    let config = Config::default().with_level(level(5)).with_rng_seed(2024);
    EngineBuilder::new()
        .config(config)
        .viewport(Viewport::pixels(200, 100))
        .zoom(5)
        .build()
        .unwrap()
}

#[test]
fn test_cell_size_ten_scenario() {
    let mut hash = SpatialHash::new(10.0);
    let sample = Sample::new(1, 5.0, 5.0, 0.0, [100.0; 12]);
    assert!(hash.insert(sample.clone()));

    let found = hash.query(5.0, 5.0, 5.0);
    assert_eq!(found, vec![&sample]);

    let e = interpolate(&hash, 5.0, 5.0, Month::JANUARY, 5.0, WeightingScheme::Reference).unwrap();
    assert!(e.dx.abs() < 1e-12);
    assert!((e.dy + 1.0).abs() < 1e-12);
    assert_eq!(e.f, 100.0);
}

#[test]
fn test_opposite_azimuth_scenario() {
    let hash = SpatialHash::from_samples(
        10.0,
        vec![
            Sample::new(1, 23.0, 20.0, 0.0, [100.0; 12]),
            Sample::new(2, 17.0, 20.0, 180.0, [100.0; 12]),
        ],
    );
    let e = interpolate(&hash, 20.0, 20.0, Month::JANUARY, 5.0, WeightingScheme::Reference).unwrap();
    assert!(e.dx.abs() < 1e-12);
    assert!(e.dy.abs() < 1e-12);
    assert!((e.f - 100.0).abs() < 1e-9);
}

#[test]
fn test_step_boundary_at_125() {
    assert_eq!(speed_scale(124.999), 0.2);
    assert_eq!(speed_scale(125.0), 0.3);
}

#[test]
fn test_end_to_end_pool_bounds() {
    let mut engine = engine();
    let request = engine.begin_load().unwrap();
    let status = engine.complete_load(&request, FetchOutcome::Ready(river_records()));
    assert_eq!(status, LoadStatus::Loaded { samples: 50 });

    let report = engine.process();
    assert!(report.is_complete());
    assert_eq!(engine.pool().len(), 30);
    for streamline in engine.pool() {
        assert!((4..=20).contains(&streamline.len()));
        assert!(streamline.cursor() <= streamline.len() - 2);
        // Every point lies within reach of the river
        for point in streamline.points() {
            assert!((point.y - 50.0).abs() <= 8.0 + 1e-9);
        }
    }
}

#[test]
fn test_cursor_wrap_through_engine() {
    let mut engine = engine();
    let request = engine.begin_load().unwrap();
    engine.complete_load(&request, FetchOutcome::Ready(river_records()));
    engine.process();

    let start: Vec<(usize, usize)> = engine
        .pool()
        .iter()
        .map(|s| (s.cursor(), s.len()))
        .collect();
    for ticks in 1..=40 {
        engine.tick();
        for (streamline, &(cursor, len)) in engine.pool().iter().zip(&start) {
            assert_eq!(streamline.cursor(), (cursor + ticks) % (len - 1));
        }
    }
}

#[test]
fn test_display_modes_color_segments() {
    let mut engine = engine();
    let request = engine.begin_load().unwrap();
    engine.complete_load(&request, FetchOutcome::Ready(river_records()));
    engine.process();

    let plain = engine.tick();
    assert!(plain.segments.iter().all(|s| s.color == Rgba::TRANSLUCENT_WHITE));

    engine.set_display(DisplayMode::Flow);
    let flow = engine.tick();
    assert!(flow.segments.iter().all(|s| s.color.a == 1.0));
}

#[test]
fn test_stream_order_display() {
    let mut engine = engine();
    let request = engine.begin_load().unwrap();
    let records = river_records()
        .into_iter()
        .map(|r| r.with("S", 9.0))
        .collect();
    engine.complete_load(&request, FetchOutcome::Ready(records));
    engine.process();

    engine.set_display(DisplayMode::StreamOrder);
    let frame = engine.tick();
    assert!(!frame.segments.is_empty());
    for segment in &frame.segments {
        assert_eq!(segment.color, Rgba::opaque(0, 255, 0));
        assert_eq!(segment.width, 2.0);
    }
}

#[test]
fn test_projection_onto_viewport() {
    // Map extent twice the pixel size: samples land at half their map coordinates
    let config = Config::default().with_level(level(5)).with_rng_seed(1);
    let mut engine = FlowEngine::new(
        config,
        Viewport::new(0.0, 0.0, 400.0, 200.0, 200, 100),
        5,
    )
    .unwrap();
    let request = engine.begin_load().unwrap();
    let records = vec![FlowRecord::new(100.0, 150.0).with_flows(0.0, [10.0; 12])];
    engine.complete_load(&request, FetchOutcome::Ready(records));

    let sample = engine.index().unwrap().iter().next().unwrap();
    assert_eq!((sample.x(), sample.y()), (50.0, 25.0));
}

#[tokio::test(start_paused = true)]
async fn test_reset_during_slow_fetch_leaves_pool_empty() {
    let shared = SharedEngine::new(engine());
    let provider = MemoryProvider::new(river_records()).with_latency(Duration::from_secs(3));

    let (status, ()) = tokio::join!(shared.load(&provider), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        shared.reset();
    });

    assert_eq!(status, LoadStatus::Cancelled);
    let engine = shared.lock();
    assert!(engine.pool().is_empty());
    assert!(engine.index().is_none());
}

#[tokio::test]
async fn test_buffer_filters_far_samples() {
    let mut records = river_records();
    records.push(
        FlowRecord::new(100.0, 90.0)
            .with_flows(0.0, [5.0; 12])
            .with("D", 40.0),
    );
    let shared = SharedEngine::new(engine());
    let status = shared.load(&MemoryProvider::new(records)).await;
    assert_eq!(status, LoadStatus::Loaded { samples: 50 });
}

#[cfg(feature = "geojson")]
#[tokio::test]
async fn test_geojson_provider() {
    let features: Vec<String> = (0..50)
        .map(|i| {
            let flows: Vec<String> = (1..=12).map(|m| format!(r#""F{}": 1000.0"#, m)).collect();
            format!(
                r#"{{"type":"Feature","geometry":{{"type":"Point","coordinates":[{},50.0]}},"properties":{{"B":90.0,"V":800.0,{}}}}}"#,
                i * 4,
                flows.join(",")
            )
        })
        .collect();
    let text = format!(
        r#"{{"type":"FeatureCollection","features":[{}]}}"#,
        features.join(",")
    );

    let provider = MemoryProvider::from_geojson(&text).unwrap();
    assert_eq!(provider.records().len(), 50);

    let shared = SharedEngine::new(engine());
    assert_eq!(
        shared.load(&provider).await,
        LoadStatus::Loaded { samples: 50 }
    );
    assert_eq!(shared.stats().streamlines, 30);

    let summary = shared.lock().summary().unwrap();
    assert_eq!(summary.percent_of_average(Month::JANUARY), Some(125.0));
}
