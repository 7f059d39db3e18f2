//! Prompt templates for vidrag.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Prompts {
    pub answer: AnswerPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

impl Default for Prompts {
    fn default() -> Self {
        let mut variables = HashMap::new();
        variables.insert("course".to_string(), "Sigma Web Development".to_string());

        Self {
            answer: AnswerPrompts::default(),
            variables,
        }
    }
}

/// Prompts for answering a question from retrieved chunks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub template: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            template: r#"I am teaching web development using {{course}} course.
Here are the video subtitle chunks containing video titles, video number, start and end time in seconds, and the text at that time:

{{chunks}}
--------------------
"{{question}}"
User asked this question related to video chunks, you have to answer where and how much content is taught in which video (in which video and which timestamp)
and guide the user to the particular video.

If user asks an unrelated question, tell them you can only answer questions related to the course.
Do not provide exact timestamps, only give a concise 2-line conclusion without extra details.
"#
            .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables.extend(vars.clone());
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let answer_path = custom_path.join("answer.toml");
            if answer_path.exists() {
                let content = std::fs::read_to_string(&answer_path)?;
                prompts.answer = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are filled in one pass over the template, so values that
    /// themselves contain `{{name}}` are inserted as-is. Unknown placeholders
    /// are left untouched.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        let placeholder = Regex::new(r"\{\{([^{}]+)\}\}").expect("Invalid regex");
        placeholder
            .replace_all(template, |caps: &Captures<'_>| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_template() {
        let template = "Hello {{name}}, you have {{count}} messages.";
        let mut vars = HashMap::new();
        vars.insert("name".to_string(), "Alice".to_string());
        vars.insert("count".to_string(), "5".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Hello Alice, you have 5 messages.");
    }

    #[test]
    fn test_render_inserts_values_verbatim() {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), "what does {{course}} cover?".to_string());
        vars.insert("course".to_string(), "Sigma Web Development".to_string());

        for _ in 0..50 {
            let result = Prompts::render("Q: {{question}} ({{course}})", &vars);
            assert_eq!(result, "Q: what does {{course}} cover? (Sigma Web Development)");
        }
    }

    #[test]
    fn test_render_leaves_unknown_placeholders() {
        let vars = HashMap::from([("name".to_string(), "x".to_string())]);
        let result = Prompts::render("{{missing}} and {{ {{name}}", &vars);
        assert_eq!(result, "{{missing}} and {{ x");
    }

    #[test]
    fn test_config_variables_override_course() {
        let mut custom = HashMap::new();
        custom.insert("course".to_string(), "Rust Basics".to_string());

        let prompts = Prompts::load(None, Some(&custom)).unwrap();
        let rendered = prompts.render_with_custom("using {{course}} course", &HashMap::new());
        assert_eq!(rendered, "using Rust Basics course");
    }

    #[test]
    fn test_custom_answer_template_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("answer.toml"),
            "template = \"Q: {{question}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(dir.path().to_str(), None).unwrap();
        assert_eq!(prompts.answer.template, "Q: {{question}}");
    }
}
