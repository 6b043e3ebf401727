//! Prompt assembly from an ordered section catalogue
//!
//! A review prompt is built from fixed sections, repository-overridable
//! sections, and sections included only when a predicate holds. Section order
//! is fixed; overrides swap a section's template, never its position. Every
//! emitted section is wrapped in HTML comment markers so the final prompt can
//! be picked apart later.
//!
//! Variable substitution is deliberately single-pass: substituted values are
//! never rescanned, so a pull request title containing `${DIFF}` stays inert
//! text instead of pulling the diff into the wrong place.

use std::collections::HashMap;

/// Predicate gating a conditional section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// The pull request already carries review comments
    HasExistingComments,
    /// The diff is below the configured trivial-change threshold
    IsTrivial,
}

impl Predicate {
    fn evaluate(self, flags: &PromptFlags) -> bool {
        match self {
            Predicate::HasExistingComments => flags.has_existing_comments,
            Predicate::IsTrivial => flags.is_trivial,
        }
    }
}

/// Facts about the pull request that gate conditional sections
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptFlags {
    pub has_existing_comments: bool,
    pub is_trivial: bool,
}

/// One entry of the section catalogue
#[derive(Debug, Clone, Copy)]
pub struct SectionSpec {
    pub id: &'static str,
    pub default_template: &'static str,
    pub predicate: Option<Predicate>,
    /// Repositories may replace the template of an overridable section
    pub overridable: bool,
}

/// The full catalogue, in emission order
pub const SECTIONS: &[SectionSpec] = &[
    SectionSpec {
        id: "role",
        default_template: include_str!("sections/role.md"),
        predicate: None,
        overridable: false,
    },
    SectionSpec {
        id: "goals",
        default_template: include_str!("sections/goals.md"),
        predicate: None,
        overridable: false,
    },
    SectionSpec {
        id: "pr_context",
        default_template: include_str!("sections/pr_context.md"),
        predicate: None,
        overridable: false,
    },
    SectionSpec {
        id: "guidelines",
        default_template: include_str!("sections/guidelines.md"),
        predicate: None,
        overridable: true,
    },
    SectionSpec {
        id: "focus_areas",
        default_template: include_str!("sections/focus_areas.md"),
        predicate: None,
        overridable: true,
    },
    SectionSpec {
        id: "existing_threads",
        default_template: include_str!("sections/existing_threads.md"),
        predicate: Some(Predicate::HasExistingComments),
        overridable: false,
    },
    SectionSpec {
        id: "re_review",
        default_template: include_str!("sections/re_review.md"),
        predicate: Some(Predicate::HasExistingComments),
        overridable: true,
    },
    SectionSpec {
        id: "trivial_change",
        default_template: include_str!("sections/trivial_change.md"),
        predicate: Some(Predicate::IsTrivial),
        overridable: false,
    },
    SectionSpec {
        id: "diff",
        default_template: include_str!("sections/diff.md"),
        predicate: None,
        overridable: false,
    },
    // The output contract is never overridable; the validator depends on it
    SectionSpec {
        id: "output_format",
        default_template: include_str!("sections/output_format.md"),
        predicate: None,
        overridable: false,
    },
    SectionSpec {
        id: "final_instructions",
        default_template: include_str!("sections/final_instructions.md"),
        predicate: None,
        overridable: false,
    },
];

/// Look up a catalogue entry by id
pub fn find_section(id: &str) -> Option<&'static SectionSpec> {
    SECTIONS.iter().find(|s| s.id == id)
}

/// Whether `id` names a section repositories may override
pub fn is_overridable(id: &str) -> bool {
    find_section(id).is_some_and(|s| s.overridable)
}

/// Result of assembling a prompt
#[derive(Debug, Clone)]
pub struct AssembledPrompt {
    pub text: String,
    /// Ids of the sections emitted, in order
    pub sections: Vec<String>,
    /// Ids whose repository override was used
    pub overrides_applied: Vec<String>,
}

/// Assemble the prompt for one review
///
/// Overrides keyed to unknown or non-overridable sections are ignored.
pub fn assemble(
    vars: &HashMap<String, String>,
    overrides: &HashMap<String, String>,
    flags: &PromptFlags,
) -> AssembledPrompt {
    let mut parts = Vec::new();
    let mut sections = Vec::new();
    let mut overrides_applied = Vec::new();

    for spec in SECTIONS {
        if let Some(predicate) = spec.predicate {
            if !predicate.evaluate(flags) {
                continue;
            }
        }

        let template = match overrides.get(spec.id) {
            Some(custom) if spec.overridable => {
                overrides_applied.push(spec.id.to_string());
                custom.as_str()
            }
            _ => spec.default_template,
        };

        let body = substitute(template, vars);
        parts.push(format!(
            "<!-- section:{id} -->\n{body}\n<!-- /section:{id} -->",
            id = spec.id,
            body = body.trim()
        ));
        sections.push(spec.id.to_string());
    }

    AssembledPrompt {
        text: parts.join("\n\n"),
        sections,
        overrides_applied,
    }
}

/// Replace `${NAME}` tokens in a single pass
///
/// Unknown tokens and malformed `${` sequences are copied through verbatim.
/// Substituted values are appended to the output without rescanning.
pub fn substitute(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        match after.find('}') {
            Some(end) if is_var_name(&after[..end]) => {
                let name = &after[..end];
                match vars.get(name) {
                    Some(value) => out.push_str(value),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            _ => {
                out.push_str("${");
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

fn is_var_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit() || b == b'_')
}
