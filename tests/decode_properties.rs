use center_faces::{decode, extract_candidates, DetectionParams, Face, Nms, STRIDE};
use ndarray::Array4;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::{fixture, rstest};

struct Outputs {
    heatmap: Array4<f32>,
    scale: Array4<f32>,
    offset: Array4<f32>,
    input_size: (usize, usize),
}

impl Outputs {
    fn decode(&self, params: &DetectionParams) -> Vec<Face> {
        decode(
            self.heatmap.view(),
            self.scale.view(),
            self.offset.view(),
            self.input_size,
            params,
            None,
        )
        .unwrap()
    }
}

/// Dense random outputs: many overlapping candidates, some with extreme scales.
fn make_outputs(seed: u64) -> Outputs {
    let (rows, cols) = (24, 32);
    let mut rng = StdRng::seed_from_u64(seed);

    let heatmap = Array4::from_shape_fn((1, 1, rows, cols), |_| rng.random::<f32>());
    let scale = Array4::from_shape_fn((1, 2, rows, cols), |_| rng.random_range(-1.0..3.5));
    let offset = Array4::from_shape_fn((1, 2, rows, cols), |_| rng.random_range(-1.0..1.0));

    Outputs {
        heatmap,
        scale,
        offset,
        input_size: (cols * STRIDE, rows * STRIDE),
    }
}

#[fixture]
fn random_outputs() -> Outputs {
    make_outputs(7)
}

fn params(score_threshold: f32, iou_threshold: f32) -> DetectionParams {
    DetectionParams {
        score_threshold,
        nms: Nms { iou_threshold },
    }
}

#[rstest]
fn increasing_threshold_never_adds_candidates(random_outputs: Outputs) {
    let mut previous = usize::MAX;
    for step in 0..=20 {
        let min_score = step as f32 / 20.0;
        let count = extract_candidates(
            random_outputs.heatmap.view(),
            random_outputs.scale.view(),
            random_outputs.offset.view(),
            random_outputs.input_size,
            min_score,
        )
        .unwrap()
        .len();

        assert!(count <= previous, "{count} > {previous} at {min_score}");
        previous = count;
    }
}

#[rstest]
fn candidates_stay_inside_the_input_frame(random_outputs: Outputs) {
    let (width, height) = random_outputs.input_size;
    let candidates = extract_candidates(
        random_outputs.heatmap.view(),
        random_outputs.scale.view(),
        random_outputs.offset.view(),
        random_outputs.input_size,
        0.0,
    )
    .unwrap();

    assert!(!candidates.is_empty());
    for (rect, _) in candidates {
        let (x1, y1, x2, y2) = rect.to_min_max();
        assert!(0.0 <= x1 && x1 < x2 && x2 <= width as f32, "{rect}");
        assert!(0.0 <= y1 && y1 < y2 && y2 <= height as f32, "{rect}");
    }
}

#[rstest]
#[case(7)]
#[case(11)]
#[case(1234)]
fn decode_is_deterministic(#[case] seed: u64) {
    let outputs = make_outputs(seed);
    let params = params(0.3, 0.4);

    let first = outputs.decode(&params);
    for _ in 0..3 {
        assert_eq!(outputs.decode(&params), first);
    }
}

#[rstest]
#[case(0.2, 0.3)]
#[case(0.5, 0.5)]
#[case(0.8, 0.0)]
#[case(0.0, 1.0)]
fn decoded_faces_are_sorted_and_separated(
    random_outputs: Outputs,
    #[case] score_threshold: f32,
    #[case] iou_threshold: f32,
) {
    let faces = random_outputs.decode(&params(score_threshold, iou_threshold));

    assert!(!faces.is_empty());
    for pair in faces.windows(2) {
        assert!(pair[0].confidence >= pair[1].confidence);
    }
    for (i, a) in faces.iter().enumerate() {
        assert!(a.confidence >= score_threshold);
        for b in &faces[i + 1..] {
            assert!(a.rect.iou(&b.rect) <= iou_threshold);
        }
    }
}

#[rstest]
fn decoded_faces_are_normalized(random_outputs: Outputs) {
    for face in random_outputs.decode(&params(0.1, 0.5)) {
        let (x1, y1, x2, y2) = face.rect.to_min_max();
        for value in [x1, y1, x2, y2] {
            assert!((0.0..=1.0).contains(&value), "{}", face.rect);
        }
        assert!(x1 < x2 && y1 < y2, "{}", face.rect);
    }
}

#[rstest]
#[case(3)]
#[case(19)]
fn decoded_faces_are_normalized_for_any_frame(#[case] seed: u64) {
    let mut outputs = make_outputs(seed);
    // A width that is not a power of two and has no exact reciprocal.
    outputs.input_size = (outputs.input_size.0 + 3, outputs.input_size.1 + 2);

    let faces = outputs.decode(&params(0.05, 1.0));
    assert!(!faces.is_empty());
    for face in faces {
        let (x1, y1, x2, y2) = face.rect.to_min_max();
        for value in [x1, y1, x2, y2] {
            assert!((0.0..=1.0).contains(&value), "{}", face.rect);
        }
    }
}

#[rstest]
fn nothing_above_threshold_yields_nothing(random_outputs: Outputs) {
    let mut outputs = random_outputs;
    outputs.heatmap.mapv_inplace(|score| score * 0.4);

    assert!(outputs.decode(&params(0.5, 0.5)).is_empty());
}

#[rstest]
fn decode_can_run_concurrently(random_outputs: Outputs) {
    let params = params(0.3, 0.4);
    let expected = random_outputs.decode(&params);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| random_outputs.decode(&params)))
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), expected);
        }
    });
}
