// Test: directory conversion end to end
//
// Input: a temp directory of MusicXML files
// Expected: one .xes per convertible file, broken files copied to exceptions/

use std::fs;
use std::path::Path;

use mxl2xes::models::Lifecycle;
use mxl2xes::{run, write_report, Config, ConfigError, ConversionError, FileStatus, Granularity};
use tempfile::TempDir;

const TWO_MEASURES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE score-partwise PUBLIC "-//Recordare//DTD MusicXML 3.1 Partwise//EN" "http://www.musicxml.org/dtds/partwise.dtd">
<score-partwise version="3.1">
  <work><work-title>Little Tune</work-title></work>
  <part-list>
    <score-part id="P1"><part-name>Piano</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes>
        <divisions>2</divisions>
        <key><fifths>1</fifths></key>
        <time><beats>2</beats><beat-type>4</beat-type></time>
        <clef><sign>G</sign><line>2</line></clef>
      </attributes>
      <direction placement="above"><sound tempo="120"/></direction>
      <note><pitch><step>G</step><octave>4</octave></pitch><duration>2</duration></note>
      <note><pitch><step>A</step><octave>4</octave></pitch><duration>2</duration></note>
    </measure>
    <measure number="2">
      <note><pitch><step>B</step><octave>4</octave></pitch><duration>2</duration></note>
      <note><rest/><duration>1</duration></note>
      <note><pitch><step>F</step><alter>1</alter><octave>4</octave></pitch><duration>1</duration></note>
    </measure>
  </part>
</score-partwise>"#;

const DUET: &str = r#"<?xml version="1.0"?>
<score-partwise version="3.1">
  <part-list>
    <score-part id="P1"><part-name>Violin</part-name></score-part>
    <score-part id="P2"><part-name>Violin</part-name></score-part>
  </part-list>
  <part id="P1">
    <measure number="1">
      <attributes><divisions>1</divisions></attributes>
      <note><pitch><step>E</step><octave>5</octave></pitch><duration>2</duration></note>
      <note><pitch><step>D</step><octave>5</octave></pitch><duration>2</duration></note>
    </measure>
  </part>
  <part id="P2">
    <measure number="1">
      <attributes><divisions>1</divisions></attributes>
      <note><pitch><step>C</step><octave>4</octave></pitch><duration>4</duration></note>
    </measure>
  </part>
</score-partwise>"#;

fn setup(files: &[(&str, &str)]) -> (TempDir, TempDir) {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    for (name, content) in files {
        fs::write(input.path().join(name), content).unwrap();
    }
    (input, output)
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e))
}

fn activities(xes: &str) -> Vec<String> {
    let doc = roxmltree::Document::parse(xes).unwrap();
    doc.descendants()
        .filter(|n| n.has_tag_name("event"))
        .filter_map(|event| {
            event
                .children()
                .find(|c| c.attribute("key") == Some("concept:name"))
                .and_then(|c| c.attribute("value"))
                .map(str::to_string)
        })
        .collect()
}

#[test]
fn test_default_conversion() {
    let (input, output) = setup(&[("tune.musicxml", TWO_MEASURES)]);
    let config = Config::new(input.path(), output.path());

    let report = run(&config).unwrap();
    assert_eq!(report.good(), 1);
    assert_eq!(report.files[0].events, 4, "rests are left out by default");

    let xes = read(&output.path().join("tune.xes"));
    assert_eq!(activities(&xes), vec!["G", "A", "B", "F#"]);
    assert!(xes.contains(r#"<string key="concept:name" value="tune"/>"#));
    assert!(xes.contains(r#"<string key="title" value="Little Tune"/>"#));
    assert!(xes.contains(r#"<string key="KeySignature" value="1 sharp"/>"#));
    assert!(xes.contains(r#"<string key="TempoIndication" value="120 bpm"/>"#));
    // First quarter ends after half a second at 120 bpm
    assert!(xes.contains(r#"<date key="time:timestamp" value="2024-01-01T00:00:00.500+00:00"/>"#));
}

#[test]
fn test_all_options_start_and_complete() {
    let (input, output) = setup(&[("tune.xml", TWO_MEASURES)]);
    let config = Config {
        include_rests: true,
        show_octave: true,
        ..Config::new(input.path(), output.path())
    }
    .with_lifecycles(&[Lifecycle::Start, Lifecycle::Complete])
    .unwrap();

    let report = run(&config).unwrap();
    assert_eq!(report.files[0].status, FileStatus::Converted);
    assert_eq!(report.files[0].events, 10);

    let xes = read(&output.path().join("tune.xes"));
    assert_eq!(
        activities(&xes),
        vec!["G4", "G4", "A4", "A4", "B4", "B4", "rest", "rest", "F#4", "F#4"]
    );
    assert_eq!(xes.matches(r#"value="start""#).count(), 5);
    assert_eq!(xes.matches(r#"value="complete""#).count(), 5);
}

#[test]
fn test_multi_case_duet() {
    let (input, output) = setup(&[("duet.xml", DUET)]);
    let config = Config {
        multi_case: true,
        ..Config::new(input.path(), output.path())
    };
    run(&config).unwrap();

    let xes = read(&output.path().join("duet.xes"));
    assert!(xes.contains(r#"<string key="concept:name" value="duet - Violin 1"/>"#));
    assert!(xes.contains(r#"<string key="concept:name" value="duet - Violin 2"/>"#));
    assert_eq!(xes.matches("<trace>").count(), 2);
}

#[test]
fn test_measure_events() {
    let (input, output) = setup(&[("tune.xml", TWO_MEASURES)]);
    let config = Config::new(input.path(), output.path()).with_granularity(Granularity::Measure);
    run(&config).unwrap();

    let xes = read(&output.path().join("tune.xes"));
    assert_eq!(activities(&xes), vec!["G_A", "B_F#"]);
}

#[test]
fn test_output_is_deterministic() {
    let (input, output) = setup(&[("duet.xml", DUET), ("tune.xml", TWO_MEASURES)]);
    let config = Config {
        force: true,
        ..Config::new(input.path(), output.path())
    };

    run(&config).unwrap();
    let first = read(&output.path().join("duet.xes"));
    run(&config).unwrap();
    let second = read(&output.path().join("duet.xes"));
    assert_eq!(first, second, "two runs must write identical files");
}

#[test]
fn test_existing_output_skipped_without_force() {
    let (input, output) = setup(&[("tune.xml", TWO_MEASURES)]);
    fs::write(output.path().join("tune.xes"), "keep me").unwrap();

    let report = run(&Config::new(input.path(), output.path())).unwrap();
    assert_eq!(report.files[0].status, FileStatus::AlreadyProcessed);
    assert_eq!(read(&output.path().join("tune.xes")), "keep me");
}

#[test]
fn test_broken_files_set_aside() {
    let unexpandable = TWO_MEASURES.replace(
        "<measure number=\"2\">",
        "<measure number=\"2\"><direction><sound dalsegno=\"segno\"/></direction>",
    );
    let (input, output) = setup(&[
        ("a_broken.xml", "<score-partwise><part"),
        ("b_tune.xml", TWO_MEASURES),
        ("c_jump.xml", unexpandable.as_str()),
        ("notes.txt", "not a score"),
    ]);
    let config = Config::new(input.path(), output.path());

    let report = run(&config).unwrap();
    let statuses: Vec<FileStatus> = report.files.iter().map(|f| f.status).collect();
    assert_eq!(
        statuses,
        vec![FileStatus::Unparseable, FileStatus::Converted, FileStatus::Unexpandable]
    );
    assert_eq!(report.bad(), 2);

    let exceptions = config.exceptions_dir();
    assert!(exceptions.join("a_broken.xml").exists());
    assert!(exceptions.join("c_jump.xml").exists());
    assert!(!output.path().join("a_broken.xes").exists());
    assert!(output.path().join("b_tune.xes").exists());
}

#[test]
fn test_overflowing_durations_do_not_stop_the_run() {
    let huge = TWO_MEASURES.replace(
        "<duration>2</duration>",
        "<duration>9000000000000000000</duration>",
    );
    let (input, output) = setup(&[("a_huge.xml", huge.as_str()), ("b_good.xml", TWO_MEASURES)]);
    let config = Config::new(input.path(), output.path());

    let report = run(&config).unwrap();
    let statuses: Vec<FileStatus> = report.files.iter().map(|f| f.status).collect();
    assert_eq!(statuses, vec![FileStatus::Unparseable, FileStatus::Converted]);
    assert!(config.exceptions_dir().join("a_huge.xml").exists());
    assert!(!output.path().join("a_huge.xes").exists());
    assert_eq!(activities(&read(&output.path().join("b_good.xes"))), vec!["G", "A", "B", "F#"]);
}

#[test]
fn test_report_written() {
    let (input, output) = setup(&[("tune.xml", TWO_MEASURES)]);
    let config = Config::new(input.path(), output.path());
    let report = run(&config).unwrap();

    let report_path = output.path().join("report.json");
    write_report(&report, &report_path).unwrap();
    let json: serde_json::Value = serde_json::from_str(&read(&report_path)).unwrap();
    assert_eq!(json["files"][0]["file"], "tune.xml");
    assert_eq!(json["files"][0]["status"], "converted");
    assert_eq!(json["config"]["lifecycles"][0], "complete");
}

#[test]
fn test_missing_input_dir_is_fatal() {
    let output = TempDir::new().unwrap();
    let config = Config::new(output.path().join("missing"), output.path());
    let err = run(&config).unwrap_err();
    assert!(matches!(
        err,
        ConversionError::Config(ConfigError::InputDirMissing(_))
    ));
}
