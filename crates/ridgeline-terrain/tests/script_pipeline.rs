use ridgeline_terrain::{LayerExecutor, Pipeline, ScriptError};

const SCRIPT: &str = r#"{
    "HeightmapWidth": 200,
    "HeightmapHeight": 100,
    "HeightmapPixelPerWorldUnit": 0.25,
    "Layers": [
        { "Type": "MST Inverse Distance", "Height": 60, "QuadraticSpline": 0.3,
          "PointSet": [[20, 20, 1.0], [180, 30, 0.8], [100, 80, 0.6], [40, 90, 0.9]] },
        { "Type": "Value Noise", "Height": 5, "Seed": 3, "Blending": "ADDITIVE" },
        { "Type": "Voronoi", "Height": 10, "PointSet": [[50, 50, 0], [150, 50, 0]],
          "Blending": "REFRACTIVE", "BlendFactor": 2 }
    ]
}"#;

#[test]
fn test_script_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("terrain.json");
    std::fs::write(&path, SCRIPT).unwrap();

    let pipeline = Pipeline::load_script(&path).unwrap();
    assert_eq!(pipeline.native_resolution(), (50, 25));
    assert_eq!(pipeline.len(), 5);

    let (w, h) = pipeline.native_resolution();
    let out = pipeline.execute(w, h, true);
    assert_eq!(out.len(), w * h);
    assert!(out.iter().all(|v| (0.0..=1.0 + 1e-6).contains(v)), "normalized output");
}

#[test]
fn test_script_output_is_thread_independent() {
    let base = Pipeline::from_script(SCRIPT).unwrap();
    let reference = base.with_executor(LayerExecutor::sequential()).execute(80, 40, false);
    for threads in [2, 5, 16] {
        let pipeline = Pipeline::from_script(SCRIPT)
            .unwrap()
            .with_executor(LayerExecutor::with_threads(threads));
        assert_eq!(pipeline.execute(80, 40, false), reference, "threads = {threads}");
    }
}

#[test]
fn test_missing_script_is_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Pipeline::load_script(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, ScriptError::ReadError(_)));
}
