//! Stroke behaviour against exported documents in `tests/data`.
//!
//! Run with: cargo test -p lottie-core --test stroke

use lottie_core::{
    Color, DisplayList, LineCap, LineJoin, LottieError, ShapeKind, ShapeLayer, StrokeNode,
    StrokePaint,
};
use serde_json::Value;

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn load_layer(file: &str) -> ShapeLayer {
    init_tracing();
    let path = format!("{}/tests/data/{file}", env!("CARGO_MANIFEST_DIR"));
    let raw = std::fs::read_to_string(&path).expect("missing test data");
    let doc: Value = serde_json::from_str(&raw).expect("invalid test data");
    ShapeLayer::first_in_document(&doc).expect("layer should load")
}

fn stroke(layer: &ShapeLayer) -> &StrokeNode {
    layer
        .find_first(ShapeKind::Stroke)
        .and_then(|node| node.as_stroke())
        .expect("document has a stroke")
}

fn stroke_at(file: &str, frame: f32) -> ShapeLayer {
    let mut layer = load_layer(file);
    layer.update_properties(frame).unwrap();
    layer
}

fn assert_close(actual: f32, expected: f32) {
    assert!(
        (actual - expected).abs() < 1e-4,
        "expected {expected}, got {actual}"
    );
}

mod static_stroke {
    use super::*;

    const FILE: &str = "stroke_static_blue_2.json";

    #[test]
    fn identity() {
        let layer = load_layer(FILE);
        let node = layer.find_first(ShapeKind::Stroke).unwrap();
        assert_eq!(node.name(), "Stroke 1");
        assert_eq!(node.kind(), ShapeKind::Stroke);
        assert!(node.active(100.0));
        assert!(!node.hidden());
    }

    #[test]
    fn values_are_frame_invariant() {
        for frame in [0.0, 179.0] {
            let layer = stroke_at(FILE, frame);
            let st = stroke(&layer);
            assert_eq!(st.color().unwrap(), Color::BLUE);
            assert_eq!(st.width().unwrap(), 2.0);
            assert_eq!(st.opacity().unwrap(), 100.0);
            assert_eq!(st.cap(), LineCap::Butt);
            assert_eq!(st.join(), LineJoin::Miter);
            assert_eq!(st.miter_limit(), 4.0);
        }

        let first = stroke_at(FILE, 0.0);
        let last = stroke_at(FILE, 179.0);
        assert_eq!(stroke(&first).paint().unwrap(), stroke(&last).paint().unwrap());
    }

    #[test]
    fn repeated_update_is_idempotent() {
        let mut layer = stroke_at(FILE, 42.0);
        let before = stroke(&layer).paint().unwrap();
        layer.update_properties(42.0).unwrap();
        assert_eq!(stroke(&layer).paint().unwrap(), before);
    }

    #[test]
    fn renders_one_pen() {
        let layer = stroke_at(FILE, 10.0);
        let mut list = DisplayList::new();
        layer.render(&mut list).unwrap();

        let strokes: Vec<_> = list.strokes().collect();
        assert_eq!(strokes.len(), 1);
        let (name, paint, opacity) = strokes[0];
        assert_eq!(name, "Stroke 1");
        assert_eq!(opacity, 100.0);
        let pen = paint.pen().unwrap();
        assert_eq!(pen.color, Color::BLUE);
        assert_eq!(pen.width, 2.0);
        assert!(pen.dash.is_none());
    }
}

mod animated_stroke {
    use super::*;

    const FILE: &str = "stroke_animated_blue5_white1.json";

    #[test]
    fn first_frame() {
        let layer = stroke_at(FILE, 0.0);
        let st = stroke(&layer);
        assert_eq!(st.color().unwrap(), Color::BLUE);
        assert_close(st.width().unwrap(), 5.0);
        assert_close(st.opacity().unwrap(), 100.0);
        assert_eq!(st.cap(), LineCap::Butt);
        assert_eq!(st.join(), LineJoin::Miter);
        assert_eq!(st.miter_limit(), 4.0);
    }

    #[test]
    fn last_frame() {
        let layer = stroke_at(FILE, 179.0);
        let st = stroke(&layer);
        assert_eq!(st.color().unwrap(), Color::WHITE);
        assert_close(st.width().unwrap(), 1.0);
        assert_close(st.opacity().unwrap(), 10.0);
    }

    #[test]
    fn midway_is_between_endpoints() {
        let layer = stroke_at(FILE, 90.0);
        let width = stroke(&layer).width().unwrap();
        assert!(width > 1.0 && width < 5.0, "width {width}");
    }

    #[test]
    fn clones_update_independently() {
        let mut original = stroke_at(FILE, 0.0);
        let mut copy = original.clone();

        copy.update_properties(179.0).unwrap();
        assert_close(stroke(&original).width().unwrap(), 5.0);
        assert_close(stroke(&copy).width().unwrap(), 1.0);

        original.update_properties(179.0).unwrap();
        copy.update_properties(0.0).unwrap();
        assert_close(stroke(&original).width().unwrap(), 1.0);
        assert_close(stroke(&copy).width().unwrap(), 5.0);
    }

    #[test]
    fn width_property_is_keyframed() {
        let layer = load_layer(FILE);
        let st = stroke(&layer);
        assert!(st.width_property().unwrap().is_animated());
        assert!(st.color_property().unwrap().is_animated());
    }
}

mod hidden_stroke {
    use super::*;

    const FILE: &str = "stroke_hidden.json";

    #[test]
    fn never_active() {
        let layer = load_layer(FILE);
        let st = stroke(&layer);
        assert!(st.hidden());
        for frame in [0.0, 100.0, 179.0] {
            assert!(!layer.find_first(ShapeKind::Stroke).unwrap().active(frame));
        }
    }

    #[test]
    fn reports_no_values() {
        let layer = stroke_at(FILE, 100.0);
        let st = stroke(&layer);
        assert_eq!(st.opacity(), Err(LottieError::NotInitialized));
        assert_eq!(st.width(), Err(LottieError::NotInitialized));
        assert_eq!(st.color(), Err(LottieError::NotInitialized));
        assert!(st.width_property().is_none());
        assert!(!st.is_dashed());
    }

    #[test]
    fn draws_nothing() {
        let layer = stroke_at(FILE, 100.0);
        let mut list = DisplayList::new();
        layer.render(&mut list).unwrap();
        assert_eq!(list.strokes().count(), 0);
    }
}

mod dashed_stroke {
    use super::*;

    const FILE: &str = "stroke_dashed_animated_width.json";

    #[test]
    fn dash_ratio_follows_animated_width() {
        let mut layer = load_layer(FILE);
        assert!(stroke(&layer).is_dashed());

        for frame in [0.0, 25.0, 50.0, 100.0] {
            layer.update_properties(frame).unwrap();
            let st = stroke(&layer);
            let width = st.width().unwrap();
            let pen = *st.paint().unwrap().pen().unwrap();
            let dash = pen.dash.unwrap();

            assert_close(pen.width, width);
            assert_close(dash.pattern[0], 8.0 / width);
            assert_close(dash.pattern[1], 4.0 / width);
            assert_close(dash.offset, 2.0 / width);
        }
    }

    #[test]
    fn ratio_at_keyframes() {
        let layer = stroke_at(FILE, 0.0);
        let dash = stroke(&layer).paint().unwrap().pen().unwrap().dash.unwrap();
        assert_eq!(dash.pattern, [4.0, 2.0]);

        let layer = stroke_at(FILE, 100.0);
        let dash = stroke(&layer).paint().unwrap().pen().unwrap().dash.unwrap();
        assert_eq!(dash.pattern, [1.0, 0.5]);
    }

    #[test]
    fn zero_width_suppresses_paint() {
        let path = format!(
            "{}/tests/data/stroke_dashed_animated_width.json",
            env!("CARGO_MANIFEST_DIR")
        );
        let mut doc: Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        doc["layers"][0]["shapes"][0]["it"][1]["w"] = serde_json::json!({ "a": 0, "k": 0 });

        let mut layer = ShapeLayer::first_in_document(&doc).unwrap();
        layer.update_properties(0.0).unwrap();
        assert_eq!(stroke(&layer).paint().unwrap(), StrokePaint::None);
    }
}
