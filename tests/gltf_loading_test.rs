mod common;

use cgmath::Quaternion;
use common::test_utils::{
    GltfBuilder, MODE_POINTS, MODE_TRIANGLE_STRIP, NODE_ROTATION, PrimitiveFixture,
};
use stonehead_preview::{
    PreviewError,
    data_structures::instance::Instance,
    resources::{
        AssetReference, load_scene_gltf,
        source::{FsAssetSource, MemoryAssetSource},
    },
};

#[tokio::test]
async fn glb_keeps_native_materials_and_orientation() {
    let source = MemoryAssetSource::new().with_asset("cube.glb", GltfBuilder::red_cube().glb());
    let scene = load_scene_gltf(&source, &"cube.glb".into()).await.unwrap();

    assert!(!scene.is_normalized());
    assert_eq!(scene.root().name(), "Fixture");
    assert_eq!(scene.root().get_local_transform(), Instance::new());

    let drawables = scene.drawable_nodes();
    assert_eq!(drawables.len(), 1);
    let cube = drawables[0];
    assert_eq!(cube.name(), "Cube");
    let [x, y, z, w] = NODE_ROTATION;
    assert_eq!(cube.get_local_transform().rotation, Quaternion::new(w, x, y, z));

    let drawable = cube.drawable().unwrap();
    assert_eq!(drawable.material.name, "RedMetal");
    assert_eq!(drawable.material.base_color, [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(drawable.material.metalness, 1.0);
    assert!(!drawable.material.flat_shading);
    assert_eq!(drawable.geometry.vertices.len(), 8);
    assert_eq!(drawable.geometry.triangle_count(), 12);
    assert!(drawable.geometry.has_normals);
    assert_eq!(drawable.geometry.vertices[0].normal, [0.0, -1.0, 0.0]);
}

#[tokio::test]
async fn json_gltf_reads_sibling_buffer() {
    let (json, bin) = GltfBuilder::new("Head")
        .with_primitive(PrimitiveFixture::cube())
        .gltf_with_sibling("head.bin");
    let source = MemoryAssetSource::new()
        .with_asset("models/head.gltf", json)
        .with_asset("models/head.bin", bin);

    let scene = load_scene_gltf(&source, &"models/head.gltf".into()).await.unwrap();
    let head = scene.drawable_nodes()[0];
    assert_eq!(head.name(), "Head");
    // No material in the asset: glTF's default.
    assert_eq!(head.drawable().unwrap().material.base_color, [1.0; 4]);
    assert!(!head.drawable().unwrap().geometry.has_normals);
}

#[tokio::test]
async fn missing_sibling_buffer_is_not_found() {
    let (json, _) = GltfBuilder::new("Head")
        .with_primitive(PrimitiveFixture::cube())
        .gltf_with_sibling("head.bin");
    let source = MemoryAssetSource::new().with_asset("head.gltf", json);

    let err = load_scene_gltf(&source, &"head.gltf".into()).await.unwrap_err();
    assert!(
        matches!(&err, PreviewError::AssetNotFound { reference, .. } if reference.as_str() == "head.bin"),
        "{err}"
    );
}

#[tokio::test]
async fn unknown_reference_is_not_found() {
    let source = MemoryAssetSource::new();
    let reference = AssetReference::from("nowhere.glb");
    let err = load_scene_gltf(&source, &reference).await.unwrap_err();
    assert_eq!(
        err,
        PreviewError::AssetNotFound {
            reference,
            reason: "not present in memory source".to_string(),
        }
    );
}

#[tokio::test]
async fn garbage_bytes_are_a_parse_error() {
    let source = MemoryAssetSource::new()
        .with_asset("junk.glb", b"definitely not a model".to_vec())
        .with_asset("truncated.glb", GltfBuilder::red_cube().glb()[..40].to_vec());

    for name in ["junk.glb", "truncated.glb"] {
        let err = load_scene_gltf(&source, &name.into()).await.unwrap_err();
        assert!(matches!(err, PreviewError::AssetParseError { .. }), "{name}: {err}");
    }
}

#[tokio::test]
async fn multiple_primitives_become_sibling_drawables() {
    let glb = GltfBuilder::new("Head")
        .with_primitive(PrimitiveFixture::cube())
        .with_primitive(PrimitiveFixture::cube())
        .glb();
    let source = MemoryAssetSource::new().with_asset("head.glb", glb);

    let scene = load_scene_gltf(&source, &"head.glb".into()).await.unwrap();
    let head = &scene.root().get_children()[0];
    assert_eq!(head.name(), "Head");
    assert!(head.drawable().is_none());

    let names: Vec<&str> = scene.drawable_nodes().iter().map(|n| n.name()).collect();
    assert_eq!(names, ["Head_0", "Head_1"]);
}

#[tokio::test]
async fn strips_are_unrolled_and_points_skipped() {
    let quad = [
        [0.0, 0.0, 0.0],
        [1.0, 0.0, 0.0],
        [0.0, 1.0, 0.0],
        [1.0, 1.0, 0.0],
    ];
    let glb = GltfBuilder::new("Mixed")
        .with_primitive(PrimitiveFixture::triangles(&quad, &[0, 1, 2, 3]).with_mode(MODE_TRIANGLE_STRIP))
        .with_primitive(PrimitiveFixture {
            indices: None,
            ..PrimitiveFixture::triangles(&quad, &[]).with_mode(MODE_POINTS)
        })
        .glb();
    let source = MemoryAssetSource::new().with_asset("mixed.glb", glb);

    let scene = load_scene_gltf(&source, &"mixed.glb".into()).await.unwrap();
    let drawables = scene.drawable_nodes();
    assert_eq!(drawables.len(), 1);
    assert_eq!(drawables[0].name(), "Mixed");
    assert_eq!(
        drawables[0].drawable().unwrap().geometry.indices,
        vec![0, 1, 2, 3, 2, 1]
    );
}

#[tokio::test]
async fn filesystem_fixture_loads() {
    let source = FsAssetSource::new(concat!(env!("CARGO_MANIFEST_DIR"), "/assets"));
    let scene = load_scene_gltf(&source, &"cube.gltf".into()).await.unwrap();

    let drawables = scene.drawable_nodes();
    assert_eq!(drawables.len(), 1);
    let cube = drawables[0].drawable().unwrap();
    assert_eq!(cube.material.name, "RedMetal");
    assert_eq!(cube.geometry.triangle_count(), 12);
}

#[tokio::test]
async fn index_accessor_past_its_view_is_a_parse_error() {
    let glb = GltfBuilder::new("Cube")
        .with_primitive(PrimitiveFixture::cube().with_declared_index_count(3600))
        .glb();
    let source = MemoryAssetSource::new().with_asset("cube.glb", glb);

    let err = load_scene_gltf(&source, &"cube.glb".into()).await.unwrap_err();
    assert!(
        matches!(&err, PreviewError::AssetParseError { reason, .. } if reason.contains("indices")),
        "{err}"
    );
}

#[tokio::test]
async fn position_accessor_past_its_view_is_reported_as_such() {
    let glb = GltfBuilder::new("Cube")
        .with_primitive(PrimitiveFixture::cube().with_declared_vertex_count(800))
        .glb();
    let source = MemoryAssetSource::new().with_asset("cube.glb", glb);

    let err = load_scene_gltf(&source, &"cube.glb".into()).await.unwrap_err();
    match &err {
        PreviewError::AssetParseError { reason, .. } => {
            assert!(reason.contains("POSITION"), "{reason}");
            assert!(reason.contains("past its buffer view"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}
