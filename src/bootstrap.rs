//! Project bootstrap: prompt for an idea, generate a product plan, scaffold
//! a repository skeleton, and optionally publish it with one issue per
//! planned ticket. Those issues are what `greenlight run "#<n>"` consumes.

use crate::generation::{GenerationService, PlanTicket, ProductPlan};
use crate::host::RepoHost;
use crate::ui::{StepLogger, sanitize_for_log};
use crate::vcs::VersionControl;
use crate::workspace::Workspace;
use anyhow::{Context, Result};
use dialoguer::{Confirm, Input};
use std::sync::Arc;

/// Everything the interactive prompts collect.
#[derive(Debug, Clone)]
pub struct BootstrapAnswers {
    pub idea: String,
    pub project_name: String,
    pub stack_hints: String,
    pub create_remote: bool,
}

/// Collect answers interactively. With `assume_yes` the remote-creation
/// confirmation is skipped and defaults to true.
pub fn prompt_answers(assume_yes: bool) -> Result<BootstrapAnswers> {
    let idea: String = Input::new()
        .with_prompt("Describe your product or feature (one paragraph)")
        .allow_empty(false)
        .interact_text()
        .context("Failed to read user input")?;

    let project_name: String = Input::new()
        .with_prompt("Project repo name (short)")
        .default(suggest_project_name(&idea))
        .interact_text()
        .context("Failed to read user input")?;

    let stack_hints: String = Input::new()
        .with_prompt("Preferred stack (optional)")
        .allow_empty(true)
        .interact_text()
        .context("Failed to read user input")?;

    let create_remote = if assume_yes {
        true
    } else {
        Confirm::new()
            .with_prompt("Create GitHub repo and issues for the plan?")
            .default(true)
            .interact()
            .context("Failed to read user input")?
    };

    Ok(BootstrapAnswers {
        idea,
        project_name: safe_name(&project_name),
        stack_hints,
        create_remote,
    })
}

/// Derive a repo-safe default name from the first few words of the idea.
pub fn suggest_project_name(idea: &str) -> String {
    safe_name(&idea.split_whitespace().take(4).collect::<Vec<_>>().join("-"))
}

fn safe_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_hyphen = true;
    for ch in name.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            out.push('-');
            last_was_hyphen = true;
        }
    }
    out.trim_end_matches('-').to_string()
}

/// Title for the issue created from one planned ticket.
pub fn issue_title(phase_name: &str, ticket: &PlanTicket) -> String {
    let title = if ticket.title.trim().is_empty() {
        ticket.description.as_str()
    } else {
        ticket.title.as_str()
    };
    format!("[{phase_name}] {title}")
}

/// Body for the issue created from one planned ticket.
pub fn issue_body(phase_name: &str, ticket: &PlanTicket) -> String {
    let description = if ticket.description.trim().is_empty() {
        "No description"
    } else {
        ticket.description.as_str()
    };
    format!(
        "**Phase:** {phase_name}\n\n**Description:** {description}\n\n\
         **Acceptance Criteria:**\n\
         - [ ] Implementation complete\n\
         - [ ] Tests passing\n\
         - [ ] Code reviewed\n"
    )
}

pub struct Bootstrapper {
    generation: Arc<dyn GenerationService>,
    ui: StepLogger,
}

impl Bootstrapper {
    pub fn new(generation: Arc<dyn GenerationService>, ui: StepLogger) -> Self {
        Self { generation, ui }
    }

    /// Generate the plan and write the project skeleton into `workspace`,
    /// committing the scaffold as the repository's first commit.
    pub async fn scaffold(
        &self,
        workspace: &Workspace,
        vcs: &dyn VersionControl,
        answers: &BootstrapAnswers,
    ) -> Result<ProductPlan> {
        self.ui.step("Generating product plan");
        let plan = self
            .generation
            .plan(&answers.idea, &answers.stack_hints)
            .await
            .context("Plan generation failed")?;
        self.ui
            .detail(&format!("Suggested stack: {}", sanitize_for_log(&plan.stack)));

        self.ui.step("Writing project skeleton");
        let readme = format!(
            "# {}\n\n{}\n\nSuggested stack: {}\n",
            answers.project_name, answers.idea, plan.stack
        );
        workspace
            .write_artifact("README.md", &readme)
            .context("Failed to write README.md")?;
        workspace
            .write_artifact(".gitignore", "node_modules\n.env\n")
            .context("Failed to write .gitignore")?;
        let plan_json =
            serde_json::to_string_pretty(&plan).context("Failed to serialize product plan")?;
        workspace
            .write_artifact("PRODUCT_PLAN.json", &plan_json)
            .context("Failed to write PRODUCT_PLAN.json")?;

        // Advisory: a failed sketch should not sink the whole scaffold.
        match self.generation.architecture(&answers.idea).await {
            Ok(sketch) => {
                workspace
                    .write_artifact("ARCHITECTURE.md", &sketch.to_markdown())
                    .context("Failed to write ARCHITECTURE.md")?;
            }
            Err(err) => {
                self.ui
                    .warn(&format!("Skipping architecture sketch: {err}"));
            }
        }

        vcs.commit_all("chore: scaffold initial project")
            .context("Failed to commit project scaffold")?;
        self.ui.success(&format!(
            "Project skeleton written to ./{}",
            sanitize_for_log(&answers.project_name)
        ));
        Ok(plan)
    }

    /// Create the remote repository, push the scaffold, and open one issue
    /// per planned ticket.
    pub async fn publish(
        &self,
        vcs: &dyn VersionControl,
        host: &dyn RepoHost,
        answers: &BootstrapAnswers,
        plan: &ProductPlan,
    ) -> Result<()> {
        self.ui.step("Creating remote repository");
        let repo = host
            .ensure_repository(&answers.project_name, false)
            .await
            .context("Failed to create remote repository")?;
        vcs.add_remote("origin", &repo.clone_url)
            .context("Failed to add origin remote")?;
        vcs.push("main").context("Failed to push scaffold")?;
        self.ui
            .detail(&format!("Pushed to {}", sanitize_for_log(&repo.html_url)));

        self.ui.step("Creating issues from the plan");
        let mut created = 0u32;
        for phase in &plan.phases {
            for ticket in &phase.tickets {
                let issue = host
                    .create_issue(&issue_title(&phase.name, ticket), &issue_body(&phase.name, ticket))
                    .await
                    .context("Failed to create issue")?;
                self.ui.detail(&format!(
                    "Created issue #{}: {}",
                    issue.number,
                    sanitize_for_log(&issue.title)
                ));
                created += 1;
            }
        }
        self.ui
            .success(&format!("Created {created} issues for the project plan"));
        Ok(())
    }
}
