//! System prompt rendering for solo mode.

use anyhow::{Context, Result};
use minijinja::{Environment, context};

use crate::core::types::CapabilityDescriptor;

const SOLO_TEMPLATE: &str = include_str!("prompts/solo.md");

/// Render the solo system prompt listing every capability in `catalog`.
pub fn render_solo_prompt(catalog: &[CapabilityDescriptor]) -> Result<String> {
    let mut env = Environment::new();
    env.add_template("solo", SOLO_TEMPLATE)
        .context("load solo prompt template")?;
    let template = env.get_template("solo").context("get solo prompt template")?;
    let rendered = template
        .render(context! { tools => catalog })
        .context("render solo prompt")?;
    Ok(rendered.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn descriptor(name: &str, description: &str) -> CapabilityDescriptor {
        CapabilityDescriptor {
            name: name.to_string(),
            description: description.to_string(),
            schema: json!({"type": "object"}),
        }
    }

    #[test]
    fn lists_every_capability_in_catalog_order() {
        let prompt = render_solo_prompt(&[
            descriptor("deployer", "Deploy a project."),
            descriptor("terminal", "Run a shell command."),
        ])
        .expect("render");

        let deployer = prompt.find("- deployer: Deploy a project.").expect("deployer");
        let terminal = prompt.find("- terminal: Run a shell command.").expect("terminal");
        assert!(deployer < terminal);
        assert!(prompt.contains("**REFLECT**"));
    }

    #[test]
    fn renders_without_capabilities() {
        let prompt = render_solo_prompt(&[]).expect("render");
        assert!(prompt.starts_with("You are an autonomous"));
        assert!(!prompt.contains("- "));
    }
}
