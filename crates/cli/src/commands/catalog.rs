//! `lexigrade catalog` — Show the study-material catalog.

use std::path::Path;

use lexigrade_enrichment::MaterialCatalog;

use super::load_config;

pub fn run(config_path: Option<&Path>, skill: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(config_path)?;
    let catalog = MaterialCatalog::from_config(&config.catalog);
    print!("{}", render(&catalog, skill));
    Ok(())
}

fn render(catalog: &MaterialCatalog, skill: Option<&str>) -> String {
    let mut out = String::new();
    match skill {
        Some(skill) => {
            let resolved = catalog.resolve_skill(skill);
            if resolved != skill {
                out.push_str(&format!("{skill} is not a catalog skill, using {resolved}\n"));
            }
            push_skill(&mut out, catalog, resolved);
        }
        None => {
            out.push_str(&format!("Fallback skill: {}\n", catalog.fallback_skill()));
            for skill in catalog.skills() {
                push_skill(&mut out, catalog, skill);
            }
        }
    }
    out
}

fn push_skill(out: &mut String, catalog: &MaterialCatalog, skill: &str) {
    out.push_str(&format!("\n{skill}\n"));
    for material in catalog.materials_for(skill) {
        out.push_str(&format!("  - {material}\n"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_every_skill() {
        let text = render(&MaterialCatalog::default(), None);
        for skill in ["Grammar", "Vocabulary", "Listening", "Reading", "Speaking"] {
            assert!(text.contains(&format!("\n{skill}\n")), "missing {skill}");
        }
        assert!(text.starts_with("Fallback skill: Grammar"));
    }

    #[test]
    fn unknown_skill_shows_fallback() {
        let text = render(&MaterialCatalog::default(), Some("Writing"));
        assert!(text.contains("Writing is not a catalog skill, using Grammar"));
        assert!(text.contains("Advanced Grammar Review & Traps in TOEIC"));
    }
}
