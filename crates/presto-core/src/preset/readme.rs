//! README generation for new projects

use super::copier::PackageDescriptor;
use crate::install::PackageManager;

/// Scripts worth documenting, with their headings
const SCRIPT_DESCRIPTIONS: &[(&str, &str)] = &[
    ("start", "Start the development server"),
    ("build", "Build for production"),
];

/// Markdown README for a freshly created project
pub fn generate_readme(pkg: &PackageDescriptor, package_manager: PackageManager) -> String {
    let name = pkg.get("name").and_then(|v| v.as_str()).unwrap_or("project");
    let pm = package_manager.command();

    let mut lines = vec![
        format!("# {}\n", name),
        "## Project setup".to_string(),
        "```".to_string(),
        format!("{} install", pm),
        "```".to_string(),
    ];

    let scripts = pkg.get("scripts").and_then(|v| v.as_object());
    if let Some(scripts) = scripts {
        for (script, heading) in SCRIPT_DESCRIPTIONS {
            if scripts.contains_key(*script) {
                lines.push(format!("\n### {}", heading));
                lines.push("```".to_string());
                lines.push(format!("{} run {}", pm, script));
                lines.push("```".to_string());
            }
        }
    }

    lines.push("\n### Customize configuration".to_string());
    lines.push(String::new());
    lines.join("\n")
}
