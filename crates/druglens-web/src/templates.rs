//! HTML pages rendered with minijinja.

use std::path::Path;

use minijinja::Environment;
use serde::Serialize;
use tracing::info;

pub const INDEX_TEMPLATE: &str = "index.html";
pub const VISUALIZE_TEMPLATE: &str = "visualize.html";

pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    /// Templates compiled into the binary.
    pub fn embedded() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template(INDEX_TEMPLATE, include_str!("../templates/index.html"))?;
        env.add_template(VISUALIZE_TEMPLATE, include_str!("../templates/visualize.html"))?;
        Ok(Self { env })
    }

    /// Templates read from `dir` on first use.
    pub fn from_dir(dir: &Path) -> Self {
        info!("Loading templates from {}", dir.display());
        let mut env = Environment::new();
        env.set_loader(minijinja::path_loader(dir));
        Self { env }
    }

    pub fn render<S: Serialize>(&self, name: &str, ctx: S) -> Result<String, minijinja::Error> {
        self.env.get_template(name)?.render(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use minijinja::context;

    #[test]
    fn test_embedded_templates_render() {
        let templates = Templates::embedded().unwrap();
        let index = templates.render(INDEX_TEMPLATE, context! {}).unwrap();
        assert!(index.contains("/predict"));

        let page = templates
            .render(VISUALIZE_TEMPLATE, context! { smiles => "C", mol_block => "\n  druglens\n" })
            .unwrap();
        assert!(page.contains("3Dmol"));
    }

    #[test]
    fn test_viewer_script_is_pinned() {
        let templates = Templates::embedded().unwrap();
        let page = templates
            .render(VISUALIZE_TEMPLATE, context! { smiles => "C", mol_block => "" })
            .unwrap();
        assert!(page.contains("https://cdn.jsdelivr.net/npm/3dmol@2.4.0/build/3Dmol-min.js"));
    }

    #[test]
    fn test_mol_block_is_embedded_as_a_script_literal() {
        let templates = Templates::embedded().unwrap();
        let page = templates
            .render(
                VISUALIZE_TEMPLATE,
                context! { smiles => "C", mol_block => "</script><b>x</b>\nM  END" },
            )
            .unwrap();
        assert!(!page.contains("</script><b>"));
        assert!(page.contains("M  END"));
    }

    #[test]
    fn test_templates_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(INDEX_TEMPLATE), "custom {{ 1 + 1 }}").unwrap();

        let templates = Templates::from_dir(dir.path());
        assert_eq!(templates.render(INDEX_TEMPLATE, context! {}).unwrap(), "custom 2");
        assert!(templates.render(VISUALIZE_TEMPLATE, context! {}).is_err());
    }
}
