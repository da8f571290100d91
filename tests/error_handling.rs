//! Failure-path coverage: every malformed input must collapse to one of
//! the two invalid report shapes, never to a panic or a partial report.

use retouch::{
    analyze_bytes, AnalysisReport, ContainerType, Filename, PipelineError, UploadPolicy,
    ValidationError, XmpError, ACCEPTED_CONTENT_TYPE,
};

const XMP_APP1_HEADER: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";

fn name(s: &str) -> Filename {
    Filename::parse(s).unwrap()
}

fn policy() -> UploadPolicy {
    UploadPolicy {
        max_upload_bytes: 1024,
        accepted_content_type: ACCEPTED_CONTENT_TYPE.to_string(),
    }
}

#[test]
fn filename_rejections() {
    assert!(matches!(
        Filename::parse("sp ace.jpg"),
        Err(ValidationError::DisallowedCharacter(' '))
    ));
    assert!(matches!(
        Filename::parse(""),
        Err(ValidationError::EmptyFilename)
    ));
    assert!(matches!(
        Filename::parse(&"a".repeat(65)),
        Err(ValidationError::FilenameTooLong(65))
    ));
    assert!(matches!(
        Filename::parse("caf\u{e9}.jpg"),
        Err(ValidationError::DisallowedCharacter('\u{e9}'))
    ));
}

#[test]
fn path_shape_rejections() {
    let policy = policy();
    assert!(matches!(
        policy.filename_from_path("/a/b.jpg"),
        Err(ValidationError::PathShape(2))
    ));
    assert!(matches!(
        policy.filename_from_path("/"),
        Err(ValidationError::PathShape(0))
    ));
    assert!(policy.filename_from_path("/ok.jpg").is_ok());
}

#[test]
fn request_shape_rejections() {
    let policy = policy();

    assert!(matches!(
        policy.check_request(None, ACCEPTED_CONTENT_TYPE),
        Err(ValidationError::UnknownLength)
    ));
    assert!(matches!(
        policy.check_request(Some(2048), ACCEPTED_CONTENT_TYPE),
        Err(ValidationError::TooLarge {
            declared: 2048,
            limit: 1024
        })
    ));
    assert!(matches!(
        policy.check_request(Some(10), "image/jpeg"),
        Err(ValidationError::ContentType(_))
    ));
    assert!(policy.check_request(Some(10), ACCEPTED_CONTENT_TYPE).is_ok());
}

#[test]
fn unknown_container_is_an_extraction_error() {
    // Unrecognized bytes get the dedicated not-a-container variant, not a
    // classification of "unknown type".
    let err = analyze_bytes(b"random bytes with no magic").unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Extraction(XmpError::NotAContainer)
    ));
}

#[test]
fn recognized_non_jpeg_containers_are_rejected_by_type() {
    let png = b"\x89PNG\r\n\x1a\n rest of file";
    let err = analyze_bytes(png).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Extraction(XmpError::UnsupportedContainer(ContainerType::Png))
    ));
}

#[test]
fn truncated_jpeg_collapses_to_named_invalid() {
    // APP1 length field promises more bytes than the buffer holds.
    let body = vec![0xFF, 0xD8, 0xFF, 0xE1, 0xFF, 0xFF, 0x00];
    let report = retouch::analyze_upload(name("cut.jpg"), &body);
    assert_eq!(
        report,
        AnalysisReport {
            is_valid: false,
            name: Some("cut.jpg".into()),
            tests: None,
        }
    );
}

#[test]
fn garbage_xmp_packet_collapses_to_named_invalid() {
    let mut payload = XMP_APP1_HEADER.to_vec();
    payload.extend_from_slice(b"<rdf:RDF unterminated");

    let mut body = vec![0xFF, 0xD8, 0xFF, 0xE1];
    body.extend_from_slice(&((payload.len() + 2) as u16).to_be_bytes());
    body.extend_from_slice(&payload);
    body.extend_from_slice(&[0xFF, 0xD9]);

    let report = retouch::analyze_upload(name("bad.jpg"), &body);
    assert!(!report.is_valid);
    assert_eq!(report.name.as_deref(), Some("bad.jpg"));
}

#[test]
fn empty_body_collapses_to_named_invalid() {
    let report = retouch::analyze_upload(name("empty.jpg"), b"");
    assert!(!report.is_valid);
    assert!(report.tests.is_none());
}
