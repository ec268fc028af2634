//! Scene document loading against a temporary flat binary workspace.

use std::fs;

use gridded_scene::{Scene, SceneError, Workspace};

const SCENE: &str = r#"{
  "grids": {
    "lcc_small": {
      "grid_name": "lcc_small",
      "height": 2,
      "width": 3,
      "cell_width": 3000.0,
      "cell_height": 3000.0,
      "origin_x": -4500.0,
      "origin_y": 3000.0,
      "proj": { "proj": "lcc", "a": 6371229.0, "lon_0": -97.5, "lat_0": 38.5, "lat_1": 38.5 }
    }
  },
  "products": [
    {
      "product_name": "ch13",
      "satellite": "goes16",
      "instrument": "abi",
      "data_kind": "brightness_temperature",
      "units": "K",
      "begin_time": "2024-05-01T18:00:00Z",
      "grid": "lcc_small",
      "data": "ch13",
      "mask": "ch13_mask",
      "fill_value": -999.0
    },
    {
      "product_name": "orphan",
      "satellite": "goes16",
      "instrument": "abi",
      "data_kind": "reflectance",
      "begin_time": "2024-05-01T18:00:00Z",
      "grid": "missing_grid",
      "data": "ch13"
    }
  ]
}"#;

fn setup() -> (tempfile::TempDir, Scene) {
    let dir = tempfile::tempdir().unwrap();
    let ws = Workspace::new(dir.path());
    ws.write_f32("ch13", 2, 3, &[200.0, -999.0, 250.0, f32::NAN, 280.0, 290.0])
        .unwrap();
    ws.write_f32("ch13_mask", 2, 3, &[0.0, 0.0, 0.0, 0.0, 0.0, 1.0])
        .unwrap();
    let scene_path = dir.path().join("scene.json");
    fs::write(&scene_path, SCENE).unwrap();
    let scene = Scene::load(&scene_path).unwrap();
    (dir, scene)
}

#[test]
fn test_load_product_combines_fill_nan_and_mask() {
    let (_dir, scene) = setup();
    assert_eq!(scene.product_names(), vec!["ch13", "orphan"]);

    let product = scene.load_product(&scene.document.products[0]).unwrap();
    assert_eq!(product.shape(), (2, 3));
    assert_eq!(
        product.mask(),
        &[false, true, false, true, false, true],
        "fill value, NaN and mask file should all mark samples invalid"
    );
    assert_eq!(product.data_range(), Some((200.0, 280.0)));
    assert_eq!(product.info.units.as_deref(), Some("K"));
    assert_eq!(product.info.bit_depth(), 16);
}

#[test]
fn test_unknown_grid() {
    let (_dir, scene) = setup();
    let err = scene.load_product(&scene.document.products[1]).unwrap_err();
    assert!(matches!(err, SceneError::UnknownGrid { .. }), "got {:?}", err);
}

#[test]
fn test_data_shape_must_match_grid() {
    let (dir, mut scene) = setup();
    Workspace::new(dir.path())
        .write_f32("small", 1, 2, &[1.0, 2.0])
        .unwrap();
    scene.document.products[0].data = "small".to_string();
    scene.document.products[0].mask = None;
    let err = scene.load_product(&scene.document.products[0]).unwrap_err();
    assert!(matches!(err, SceneError::Product(_)), "got {:?}", err);
}
