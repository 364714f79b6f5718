use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref MONTH_TOKEN: Regex = Regex::new(r"(?:^|[^0-9])((?:19|20)[0-9]{2})(0[1-9]|1[0-2])(?:[^0-9]|$)")
        .expect("valid month token pattern");
}

/// File name without its final extension.
pub fn file_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(file_name)
}

/// Whether `file_name` ends in `.{extension}`, ignoring case.
pub fn has_extension(file_name: &str, extension: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(extension))
}

/// Name of the artifact derived from `file_name` in a tier using `extension`.
pub fn with_extension(file_name: &str, extension: &str) -> String {
    format!("{}.{}", file_stem(file_name), extension)
}

/// `(year, month)` encoded in a monthly export name such as `export_mensual_mat_202403.zip`.
pub fn year_month(file_name: &str) -> Option<(i32, u32)> {
    let captures = MONTH_TOKEN.captures(file_stem(file_name))?;
    let year = captures.get(1)?.as_str().parse().ok()?;
    let month = captures.get(2)?.as_str().parse().ok()?;
    Some((year, month))
}
