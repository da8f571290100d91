use std::error::Error;

use retouch::{analyze_upload, Filename};

/// Analyze a local image file and print the report, the same JSON the HTTP
/// service would return. Handy for poking at fixtures without a server.
fn main() -> Result<(), Box<dyn Error>> {
    let path = std::env::args()
        .nth(1)
        .ok_or("usage: retouch <image-file>")?;

    let bytes = std::fs::read(&path)?;
    let basename = std::path::Path::new(&path)
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or("path has no usable basename")?;

    let report = match Filename::parse(basename) {
        Ok(name) => analyze_upload(name, &bytes),
        Err(_) => retouch::AnalysisReport::invalid(),
    };

    println!("{}", report.to_json_pretty()?);
    Ok(())
}
