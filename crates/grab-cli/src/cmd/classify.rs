//! Classify command

use anyhow::Result;
use grab_schema::AssetPattern;

/// Print how each file name is classified
pub fn classify(names: &[String]) -> Result<()> {
    let width = names.iter().map(String::len).max().unwrap_or(0);

    for name in names {
        let pattern = AssetPattern::from_filename(name);
        println!(
            "{name:<width$}  os={:<8} arch={:<6} type={}",
            or_dash(&pattern.os),
            or_dash(&pattern.arch),
            or_dash(&pattern.file_type),
        );
    }
    Ok(())
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}
