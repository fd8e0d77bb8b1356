use ndarray::Array2;
use pitchtrack::camera::StableRegion;
use pitchtrack::{
    AnalysisConfig, BBox, DetectedClass, Detection, Detector, Error, Frame, Ltrb, MultiObjectTracker,
    ObjectClass, Pipeline, Team, TeamClassifier, TrackId, TrackedDetection, BALL_TRACK_ID,
};

const FRAMES: usize = 12;

fn texture() -> Frame {
    Frame::new(Array2::from_shape_fn((120, 160), |(r, c)| {
        128.0 + 50.0 * (c as f32 / 5.0).sin() + 50.0 * (r as f32 / 6.0).cos()
    }))
}

/// 10 px per meter on a 16 x 12 m court filling the whole image.
fn config() -> AnalysisConfig {
    let mut config = AnalysisConfig::default();
    config.camera.stable_regions = vec![StableRegion::columns(0, 30), StableRegion::columns(130, 160)];
    config.perspective.pixel_vertices = [[0.0, 120.0], [0.0, 0.0], [160.0, 0.0], [160.0, 120.0]];
    config.perspective.court_length = 16.0;
    config.perspective.court_width = 12.0;
    config.detection.batch_size = 5;
    config
}

fn person(x: f32, confidence: f32, class: DetectedClass) -> Detection {
    Detection::from_ltrb(&BBox::ltrb(x - 5.0, 60.0, x + 5.0, 100.0), confidence, class)
}

/// A runner moving 1 px per frame with the ball at their feet, a standing
/// opponent, a goalkeeper and a referee. The ball is missed in frames 3..=5
/// and after frame 9.
fn scripted_detections() -> Vec<Vec<Detection>> {
    (0..FRAMES)
        .map(|frame_num| {
            let runner = 40.0 + frame_num as f32;
            let mut detections = vec![
                person(runner, 0.9, DetectedClass::Player),
                person(150.0, 0.8, DetectedClass::Player),
                person(10.0, 0.7, DetectedClass::Goalkeeper),
                person(100.0, 0.9, DetectedClass::Referee),
            ];

            if !(3..=5).contains(&frame_num) && frame_num <= 9 {
                let ball = BBox::ltrb(runner + 7.0, 95.0, runner + 13.0, 101.0);
                detections.push(Detection::from_ltrb(&ball, 0.5, DetectedClass::Ball));
            }

            detections
        })
        .collect()
}

struct ScriptedDetector {
    detections: Vec<Vec<Detection>>,
    calls: usize,
}

impl Detector for ScriptedDetector {
    fn detect(&mut self, frames: &[Frame], _: f32) -> Result<Vec<Vec<Detection>>, Error> {
        self.calls += 1;
        Ok(self.detections.drain(..frames.len()).collect())
    }
}

struct FailingDetector;

impl Detector for FailingDetector {
    fn detect(&mut self, _: &[Frame], _: f32) -> Result<Vec<Vec<Detection>>, Error> {
        Err(Error::Collaborator("detector should not run".into()))
    }
}

/// Identity from the horizontal region an object stays in.
struct RegionTracker;

impl MultiObjectTracker for RegionTracker {
    fn update(&mut self, detections: &[Detection]) -> Result<Vec<TrackedDetection>, Error> {
        Ok(detections
            .iter()
            .map(|d| TrackedDetection {
                bbox: d.ltrb(),
                class: d.class,
                track_id: match d.x as u32 {
                    0..=29 => 2,
                    30..=79 => 3,
                    80..=119 => 4,
                    _ => 5,
                },
            })
            .collect())
    }
}

/// Left half of the image is team 1.
struct SideClassifier {
    calibrated_with: usize,
}

impl TeamClassifier for SideClassifier {
    fn calibrate(&mut self, _: &Frame, players: &[(TrackId, BBox<Ltrb>)]) -> Result<(), Error> {
        self.calibrated_with = players.len();
        Ok(())
    }

    fn classify(&mut self, _: &Frame, bbox: &BBox<Ltrb>, _: TrackId) -> Result<Team, Error> {
        Ok(if bbox.center().x < 80.0 { Team(1) } else { Team(2) })
    }
}

#[test]
fn full_analysis_of_a_static_shot() {
    let frames = vec![texture(); FRAMES];
    let detector = ScriptedDetector {
        detections: scripted_detections(),
        calls: 0,
    };
    let mut classifier = SideClassifier { calibrated_with: 0 };

    let analysis = Pipeline::run(&frames, detector, RegionTracker, &mut classifier, config()).unwrap();
    let tracks = &analysis.tracks;

    assert_eq!(tracks.len(), FRAMES);
    assert!(tracks.is_consistent());
    assert_eq!(classifier.calibrated_with, 3);

    // goalkeeper tracked as a player, referee kept apart
    assert!(tracks.get(ObjectClass::Player, 0, 2).is_some());
    assert!(tracks.get(ObjectClass::Referee, 0, 4).is_some());
    assert!(tracks.get(ObjectClass::Player, 0, 4).is_none());

    // every ball gap is filled, the interior one along the runner's path
    assert!(tracks.ball_bboxes().iter().all(Option::is_some));
    let ball = tracks.get(ObjectClass::Ball, 4, BALL_TRACK_ID).unwrap();
    assert!((ball.bbox.center().x - 54.0).abs() < 1e-3);

    // the camera never moved
    assert_eq!(analysis.camera_movement.len(), FRAMES);
    assert!(analysis.camera_movement.cumulative().iter().all(|m| m.norm() == 0.0));

    let runner = tracks.get(ObjectClass::Player, 0, 3).unwrap();
    assert_eq!(runner.position, runner.position_adjusted);
    let court = runner.position_transformed.unwrap();
    assert!((court.x - 4.0).abs() < 1e-3 && (court.y - 10.0).abs() < 1e-3);

    // 0.1 m per frame at 24 fps
    for frame_num in 0..FRAMES {
        let runner = tracks.get(ObjectClass::Player, frame_num, 3).unwrap();
        assert!((runner.speed.unwrap() - 8.64).abs() < 1e-2);
    }
    let last = tracks.get(ObjectClass::Player, FRAMES - 1, 3).unwrap();
    assert!((last.distance.unwrap() - 1.1).abs() < 1e-3);

    let standing = tracks.get(ObjectClass::Player, 6, 5).unwrap();
    assert!(standing.speed.unwrap().abs() < 1e-3);
    assert_eq!(standing.team, Some(Team(2)));
    assert!(tracks.get(ObjectClass::Referee, 6, 4).unwrap().speed.is_some());
    assert!(tracks.get(ObjectClass::Referee, 6, 4).unwrap().team.is_none());

    // the runner dribbles the whole clip
    assert!((0..FRAMES).all(|f| tracks.get(ObjectClass::Player, f, 3).unwrap().has_ball));
    assert!(!tracks.get(ObjectClass::Player, 0, 5).unwrap().has_ball);
    assert_eq!(analysis.possession.len(), FRAMES);
    assert_eq!(analysis.possession.team_share(Team(1), FRAMES - 1), 1.0);
    assert_eq!(analysis.possession.team_share(Team(2), FRAMES - 1), 0.0);
}

#[test]
fn cached_tracks_skip_detection() {
    let dir = tempfile::tempdir().unwrap();
    let frames = vec![texture(); FRAMES];

    let mut config = config();
    config.cache.tracks.read = true;
    config.cache.tracks.path = Some(dir.path().join("stubs").join("tracks.json"));
    config.cache.camera_movement.read = true;
    config.cache.camera_movement.path = Some(dir.path().join("stubs").join("camera_movement.json"));

    let detector = ScriptedDetector {
        detections: scripted_detections(),
        calls: 0,
    };
    let first = Pipeline::run(
        &frames,
        detector,
        RegionTracker,
        &mut SideClassifier { calibrated_with: 0 },
        config.clone(),
    )
    .unwrap();

    let second = Pipeline::run(
        &frames,
        FailingDetector,
        RegionTracker,
        &mut SideClassifier { calibrated_with: 0 },
        config,
    )
    .unwrap();

    assert_eq!(second, first);
}

#[test]
fn degenerate_calibration_fails_before_any_work() {
    let mut config = config();
    config.perspective.pixel_vertices = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];

    let result = Pipeline::run(
        &[texture()],
        FailingDetector,
        RegionTracker,
        &mut SideClassifier { calibrated_with: 0 },
        config,
    );

    assert!(matches!(result, Err(Error::DegenerateCalibration(_))));
}
