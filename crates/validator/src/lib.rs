// Pre-flight checks of a built site against snapshot.toml

use snapshot_kit_core::SnapshotConfig;
use snapshot_kit_generator::{MetadataField, count_scripts};
use std::fs;
use walkdir::WalkDir;

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub info: Vec<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check the dist directory, the entry template and the route outputs.
///
/// Missing dist or entry stop the checks early since nothing else can be
/// inspected without them.
pub fn validate_site(config: &SnapshotConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    let dist = &config.site.dist;

    if !dist.is_dir() {
        report.errors.push(format!(
            "dist directory does not exist: {} (run the site build first)",
            dist.display()
        ));
        return report;
    }

    let entry = config.entry_path();
    let template = match fs::read_to_string(&entry) {
        Ok(template) => template,
        Err(e) => {
            report
                .errors
                .push(format!("Cannot read entry document {}: {}", entry.display(), e));
            return report;
        }
    };

    let root = &config.site.content_root;
    let has_root = template.contains(&format!("id=\"{}\"", root))
        || template.contains(&format!("id='{}'", root));
    if !has_root {
        report.warnings.push(format!(
            "Entry document has no #{} element; renders will be captured degraded",
            root
        ));
    }

    for field in MetadataField::ALL {
        if !field.present_in(&template) {
            report.warnings.push(format!(
                "Entry document has no {}; patching leaves it unchanged",
                field.label()
            ));
        }
    }

    report.info.push(format!(
        "Entry document loads {} script element(s)",
        count_scripts(&template)
    ));

    let assets = WalkDir::new(dist)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count();
    report
        .info
        .push(format!("{} file(s) under {}", assets, dist.display()));

    for route in &config.routes {
        let output = route.output_path(dist);
        if output.is_dir() {
            report.errors.push(format!(
                "Output for route {} is a directory: {}",
                route,
                output.display()
            ));
        }
        if config.bundle_for(route).is_err() {
            report
                .errors
                .push(format!("Route {} has no locale bundle '{}'", route, route.locale()));
        }
    }

    for locale in config.prefixed_locales() {
        let locale_entry = dist.join(&locale).join(&config.site.entry);
        if !locale_entry.is_file() {
            report.info.push(format!(
                "{} not generated yet; requests under /{} fall back to the default entry",
                locale_entry.display(),
                locale
            ));
        }
    }

    report
}
