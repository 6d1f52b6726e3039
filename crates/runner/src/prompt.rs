//! Prompt construction for the completion service

use testforge_common::{Framework, Language, TestKind};

/// System instruction sent with every kind-specific generation request
pub const SYSTEM_PROMPT: &str =
    "You are an expert test automation engineer. Generate practical, executable test code.";

const UNIT_GUIDANCE: &str = "
    Include:
    - Component testing
    - Function testing
    - State management testing
    - Error handling
    - Mock API calls
    ";

const REGRESSION_GUIDANCE: &str = "
    Include:
    - End-to-end user flow testing
    - UI element verification
    - Form submission testing
    - Navigation testing
    - API integration testing
    ";

/// Inputs to the prompt builder
#[derive(Debug, Clone)]
pub struct PromptRequest<'a> {
    pub url: &'a str,
    pub language: Language,
    /// `None` asks for a single comprehensive script covering both kinds
    pub kind: Option<TestKind>,
    pub framework: Option<Framework>,
}

impl PromptRequest<'_> {
    /// Build the user prompt
    pub fn build(&self) -> String {
        let Some(kind) = self.kind else {
            return format!(
                "Generate a comprehensive test script in {} for the following URL: {}. Include unit tests and regression tests.",
                self.language, self.url
            );
        };

        let framework = self
            .framework
            .map(|f| format!(" using {}", f))
            .unwrap_or_default();
        let guidance = match kind {
            TestKind::Unit => UNIT_GUIDANCE,
            TestKind::Regression => REGRESSION_GUIDANCE,
        };

        format!(
            "Generate a {} test script in {}{} for the URL: {}.
    Include proper imports, setup, and teardown.
    {}
    Return only the executable test code.",
            kind.as_str().to_lowercase(),
            self.language,
            framework,
            self.url,
            guidance
        )
    }

    /// System instruction to pair with this prompt, if any
    pub fn system_prompt(&self) -> Option<&'static str> {
        self.kind.map(|_| SYSTEM_PROMPT)
    }
}
