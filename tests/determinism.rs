//! Determinism guarantees: identical input, identical report, bit for bit.
//!
//! The wire contract promises stable field order and stable verdict order
//! across runs; these tests pin both.

use retouch::{analyze_upload, Filename, BATTERY};

const XMP_APP1_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

fn jpeg_with_xmp(packet: &str) -> Vec<u8> {
    let mut payload = XMP_APP1_HEADER.to_vec();
    payload.extend_from_slice(packet.as_bytes());

    let mut out = vec![0xFF, 0xD8, 0xFF, 0xE1];
    out.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&[0xFF, 0xD9]);
    out
}

fn fixture() -> Vec<u8> {
    jpeg_with_xmp(
        r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
          <rdf:Description xmlns:xmp="http://ns.adobe.com/xap/1.0/">
            <xmp:CreatorTool>Adobe Photoshop 24.0</xmp:CreatorTool>
            <xmp:CreateDate>2023-06-10T08:15:00</xmp:CreateDate>
            <xmp:ModifyDate>2023-06-12T21:40:18</xmp:ModifyDate>
          </rdf:Description>
        </rdf:RDF>"#,
    )
}

fn name() -> Filename {
    Filename::parse("photo.jpg").unwrap()
}

#[test]
fn repeated_analysis_is_byte_identical() {
    let body = fixture();

    let first = analyze_upload(name(), &body).to_json_pretty().unwrap();
    for _ in 0..10 {
        let next = analyze_upload(name(), &body).to_json_pretty().unwrap();
        assert_eq!(first, next);
    }
}

#[test]
fn verdicts_follow_battery_order() {
    let report = analyze_upload(name(), &fixture());
    let verdicts = report.tests.unwrap().0;

    let expected: Vec<&str> = BATTERY.iter().map(|h| h.id).collect();
    let actual: Vec<&str> = verdicts.iter().map(|v| v.id).collect();
    assert_eq!(actual, expected);
}

#[test]
fn serialized_field_order_is_fixed() {
    let json = analyze_upload(name(), &fixture()).to_json_pretty().unwrap();

    let is_valid = json.find("\"is_valid\"").unwrap();
    let name_pos = json.find("\"name\"").unwrap();
    let tests_pos = json.find("\"tests\"").unwrap();
    assert!(is_valid < name_pos && name_pos < tests_pos);

    // Verdict keys appear in battery order inside the tests object.
    let mut last = tests_pos;
    for heuristic in BATTERY {
        let pos = json.find(heuristic.id).unwrap();
        assert!(pos > last, "{} out of order", heuristic.id);
        last = pos;
    }
}

#[test]
fn failure_reports_are_deterministic_too() {
    let body = b"not an image at all";
    let first = analyze_upload(name(), body).to_json_pretty().unwrap();
    let second = analyze_upload(name(), body).to_json_pretty().unwrap();
    assert_eq!(first, second);
    assert_eq!(first, "{\n  \"is_valid\": false,\n  \"name\": \"photo.jpg\"\n}");
}
