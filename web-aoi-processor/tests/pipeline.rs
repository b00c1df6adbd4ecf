//! End-to-end processing of on-disk recordings

mod common;

use common::{IndexFrames, RecordingBuilder, ScriptedTracker, TrackerCall};
use std::path::Path;
use tempfile::TempDir;
use web_aoi_processor::{
    Point2, ProcessingSummary, ProcessorConfig, Recording, RecordingProcessor, ViewportSize,
    WebAoiError,
};

fn run(builder: &RecordingBuilder, root: &Path) -> (ProcessingSummary, ScriptedTracker) {
    let _ = env_logger::builder().is_test(true).try_init();
    let recording_dir = builder.write(&root.join("recording"));
    let config = ProcessorConfig::new();
    let recording = Recording::load(&recording_dir, &config.layout).unwrap();

    let mut processor = RecordingProcessor::new(
        recording,
        ScriptedTracker::default(),
        IndexFrames(builder.frame_count()),
        &root.join("out"),
        config,
    )
    .unwrap();

    let summary = processor.process().unwrap();
    (summary, processor.tracker().clone())
}

fn read_output(root: &Path, tab: usize, file: &str) -> String {
    std::fs::read_to_string(root.join("out").join(format!("tab-{}", tab)).join(file)).unwrap()
}

fn four_markers(builder: RecordingBuilder, start: u64) -> RecordingBuilder {
    builder
        .event(start, "marker[0,0,0]=0,0,100,100")
        .event(start + 1, "marker[0,0,1]=200,0,100,100")
        .event(start + 2, "marker[0,0,2]=200,200,100,100")
        .event(start + 3, "marker[0,0,3]=0,200,100,100")
}

#[test]
fn test_first_geometry_establishes_then_replaces() {
    let root = TempDir::new().unwrap();
    let builder = four_markers(RecordingBuilder::new().event(5, "browser_size=800,600"), 10)
        .frame(100)
        .event(150, "marker[0,1,0]=0,50,100,100")
        .frame(200)
        .frame(300);

    let (summary, tracker) = run(&builder, root.path());

    assert_eq!(tracker.establish_count(), 1);
    assert_eq!(tracker.replace_count(), 1);
    assert_eq!(summary.surfaces_established, 1);
    assert_eq!(summary.surfaces_replaced, 1);

    match &tracker.calls[0] {
        TrackerCall::Establish { markers, size } => {
            assert_eq!(markers.len(), 4);
            assert_eq!(markers[&1][0], Point2::new(200.0, 0.0));
            assert_eq!(*size, ViewportSize::new(800, 600));
        }
        other => panic!("expected establish, got {:?}", other),
    }

    match &tracker.calls[1] {
        TrackerCall::Replace { markers, .. } => {
            assert_eq!(markers[&0][0], Point2::new(0.0, 50.0));
        }
        other => panic!("expected replace, got {:?}", other),
    }
}

#[test]
fn test_gaze_lands_in_aoi() {
    let root = TempDir::new().unwrap();
    let builder = RecordingBuilder::new()
        .event(1, "browser_size=800,640")
        .event(2, "browser_scroll[0,0]=0,0")
        .event(3, "aoi[0,0,banner]=10,10,200,50")
        .event(4, "marker[0,0,0]=0,0,100,100")
        .frame(100)
        // window (50, 30): x = 50 / 800, y = (640 - 30) / 640
        .gaze(150, 0.0625, 0.953125)
        .frame(200);

    let (summary, _) = run(&builder, root.path());

    assert_eq!(summary.gaze_rows, 1);
    assert_eq!(summary.aoi_hits, 1);
    assert_eq!(
        read_output(root.path(), 0, "aoi-banner.csv"),
        "timestamp,x norm,y norm,x [px],y [px]\n150,0.2,0.4,40,20\n"
    );
    assert_eq!(
        read_output(root.path(), 0, "gazes.csv"),
        "timestamp,norm x,norm y,window x [px],window y [px],page x [px],page y [px]\n\
         150,0.0625,0.953125,50,30,50,30\n"
    );
}

#[test]
fn test_garbage_event_does_not_stop_processing() {
    let root = TempDir::new().unwrap();
    let builder = RecordingBuilder::new()
        .event(1, "garbage text !!")
        .event(2, "[not an event")
        .event(3, "browser_url[0,0]=https://example.com/")
        .event(4, "marker[0,0,0]=0,0,100,100")
        .frame(100);

    let (summary, tracker) = run(&builder, root.path());

    assert_eq!(summary.events_unknown, 1);
    assert_eq!(summary.events_dropped, 1);
    assert_eq!(summary.events_applied, 2);
    assert_eq!(tracker.establish_count(), 1);
}

#[test]
fn test_gaze_follows_active_tab() {
    let root = TempDir::new().unwrap();
    let builder = RecordingBuilder::new()
        .event(1, "browser_size=100,100")
        .event(2, "marker[0,0,0]=0,0,10,10")
        .event(3, "marker[1,0,0]=0,0,10,10")
        .frame(100)
        .gaze(110, 0.5, 0.5)
        .event(120, "browser_scroll[1,0]=0,1000")
        .frame(200)
        .gaze(210, 0.25, 0.75)
        .frame(300);

    let (summary, tracker) = run(&builder, root.path());

    // tab 0 became active first; tab 1 only gets a surface once it is active
    assert_eq!(tracker.establish_count(), 2);
    assert_eq!(summary.tabs, 2);
    assert_eq!(summary.gaze_rows, 2);

    let tab0 = read_output(root.path(), 0, "gazes.csv");
    assert_eq!(tab0.lines().count(), 2);
    assert!(tab0.ends_with("110,0.5,0.5,50,50,50,50\n"));

    let tab1 = read_output(root.path(), 1, "gazes.csv");
    assert_eq!(tab1.lines().count(), 2);
    assert!(tab1.ends_with("210,0.25,0.75,25,25,25,1025\n"));
}

#[test]
fn test_gaze_is_projected_against_previous_frame() {
    let root = TempDir::new().unwrap();
    let builder = RecordingBuilder::new()
        .event(1, "marker[0,0,0]=0,0,10,10")
        .frame(100)
        .gaze(150, 0.5, 0.5)
        .gaze(160, 0.5, 0.5)
        .frame(200)
        .gaze(250, 0.5, 0.5)
        .frame(300);

    let (_, tracker) = run(&builder, root.path());

    let projected_frames: Vec<usize> = tracker
        .calls
        .iter()
        .filter_map(|call| match call {
            TrackerCall::Project { frame, .. } => Some(*frame),
            _ => None,
        })
        .collect();
    assert_eq!(projected_frames, vec![0, 0, 1]);
}

#[test]
fn test_out_of_order_timestamps_are_sorted() {
    let root = TempDir::new().unwrap();
    let builder = RecordingBuilder::new()
        .frame(100)
        .event(50, "marker[0,0,0]=0,0,10,10")
        .event(10, "browser_size=640,480")
        .frame(200);

    let (_, tracker) = run(&builder, root.path());

    match &tracker.calls[0] {
        TrackerCall::Establish { size, .. } => assert_eq!(*size, ViewportSize::new(640, 480)),
        other => panic!("expected establish, got {:?}", other),
    }
}

#[test]
fn test_rerun_produces_identical_output() {
    let builder = RecordingBuilder::new()
        .event(1, "browser_size=1280,720")
        .event(2, "browser_scroll[0,0]=0,333.5")
        .event(3, "aoi[0,0,header]=0,0,1280,200")
        .event(4, "aoi[0,0,body]=0,200,1280,2000")
        .event(5, "marker[0,0,0]=0,0,50,50")
        .frame(100)
        .gaze(110, 0.1, 0.9)
        .gaze(120, 0.7, 0.3)
        .gaze(130, 1.5, 0.3)
        .frame(200)
        .gaze(900, 0.33, 0.66);

    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    let (summary_a, _) = run(&builder, first.path());
    let (summary_b, _) = run(&builder, second.path());
    assert_eq!(summary_a, summary_b);

    for file in ["gazes.csv", "aoi-header.csv", "aoi-body.csv"] {
        let a = std::fs::read(first.path().join("out/tab-0").join(file)).unwrap();
        let b = std::fs::read(second.path().join("out/tab-0").join(file)).unwrap();
        assert_eq!(a, b, "{} differs between runs", file);
    }

    // 1.5 is off the surface; trailing gaze at 900 reuses the last frame
    assert_eq!(summary_a.gaze_samples, 4);
    assert_eq!(summary_a.gaze_rows, 3);
}

#[test]
fn test_length_mismatch_aborts_run() {
    let root = TempDir::new().unwrap();
    let dir = RecordingBuilder::new()
        .frame(100)
        .gaze(10, 0.5, 0.5)
        .write(&root.path().join("recording"));

    // Drop the gaze timestamps but keep the sample
    common::write_timestamps(&dir.join("gaze ps1.time"), &[]);

    let result = Recording::load(&dir, &ProcessorConfig::new().layout);
    assert!(matches!(result, Err(WebAoiError::InputError(_))));
}

#[test]
fn test_missing_calibration_aborts_run() {
    let root = TempDir::new().unwrap();
    let dir = RecordingBuilder::new()
        .frame(100)
        .write(&root.path().join("recording"));
    std::fs::remove_file(dir.join("calibration.bin")).unwrap();

    let result = web_aoi_processor::process_recording(
        &dir,
        &root.path().join("out"),
        ProcessorConfig::new(),
        |_, _| Ok((ScriptedTracker::default(), IndexFrames(1))),
    );
    assert!(matches!(result, Err(WebAoiError::CalibrationError(_))));
}
