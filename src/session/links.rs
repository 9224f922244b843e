//! Share values derived from the saved id, plus parsing of edit locations.

use std::collections::BTreeMap;

use super::files::FileEntry;

pub fn edit_path(id: &str) -> String {
    format!("/edit/{}", id)
}

pub fn image_url(base: &str, id: &str) -> String {
    format!("{}/plot/{}.svg", base, id)
}

pub fn edit_url(base: &str, id: &str) -> String {
    format!("{}{}", base, edit_path(id))
}

pub fn html_image(base: &str, id: &str) -> String {
    format!("<img src=\"{}\">", image_url(base, id))
}

/// Example curl call re-submitting the current files to `/replot/<id>`.
/// File contents are replaced by placeholders; empty when there are no files.
pub fn replot_example(base: &str, id: &str, files: &[FileEntry]) -> String {
    if files.is_empty() {
        return String::new();
    }
    let placeholders: BTreeMap<&str, String> = files
        .iter()
        .map(|f| (f.name.as_str(), format!("content of {}", f.name)))
        .collect();
    let json = serde_json::to_string(&placeholders).unwrap_or_default();
    format!(
        "curl -H 'Content-Type: application/json' --data-binary '{}' {}/replot/{}",
        json, base, id
    )
}

/// Plot ids are non-empty and ASCII alphanumeric, like the service routes.
pub fn is_plot_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Extract a plot id from `.../edit/<id>` or accept a bare id.
pub fn parse_plot_id(location: &str) -> Option<String> {
    let candidate = match location.find("/edit/") {
        Some(pos) => location[pos + "/edit/".len()..]
            .split(['/', '?', '#'])
            .next()
            .unwrap_or_default(),
        None => location,
    };
    is_plot_id(candidate).then(|| candidate.to_string())
}
