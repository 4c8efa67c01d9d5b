//! Terminal command palette catalog.

use super::{joined, CatalogKind, Difficulty};
use crate::config::{AUXILIARY_WEIGHT, BODY_WEIGHT, TAGS_WEIGHT, TITLE_WEIGHT};
use crate::search::recommend::{
    popularity_from_count, DIFFICULTY_ATTRIBUTE, PLATFORMS_ATTRIBUTE, POPULARITY_ATTRIBUTE,
    TECHNIQUES_ATTRIBUTE,
};
use crate::search::secondary::normalize_key;
use crate::search::IndexableRecord;
use serde::{Deserialize, Serialize};

/// Command palette sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandCategory {
    Navigation,
    Pov,
    Trr,
    Content,
    Knowledge,
    Ai,
    System,
}

impl CommandCategory {
    pub const ALL: [CommandCategory; 7] = [
        CommandCategory::Navigation,
        CommandCategory::Pov,
        CommandCategory::Trr,
        CommandCategory::Content,
        CommandCategory::Knowledge,
        CommandCategory::Ai,
        CommandCategory::System,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CommandCategory::Navigation => "navigation",
            CommandCategory::Pov => "pov",
            CommandCategory::Trr => "trr",
            CommandCategory::Content => "content",
            CommandCategory::Knowledge => "knowledge",
            CommandCategory::Ai => "ai",
            CommandCategory::System => "system",
        }
    }
}

/// A terminal command as shown in the palette.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    /// Record id; derived from the name when empty
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub description: String,
    #[serde(default)]
    pub usage: String,
    #[serde(default)]
    pub examples: Vec<String>,
    pub category: CommandCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub difficulty: Option<Difficulty>,
    /// Technique identifiers the command exercises (e.g. `T1078`)
    #[serde(default)]
    pub techniques: Vec<String>,
    #[serde(default)]
    pub platforms: Vec<String>,
    /// Invocation count, fed to the recommender as popularity
    #[serde(default)]
    pub usage_count: u64,
}

impl CommandDescriptor {
    pub fn new(
        name: impl Into<String>,
        category: CommandCategory,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            aliases: Vec::new(),
            description: description.into(),
            usage: String::new(),
            examples: Vec::new(),
            category,
            tags: Vec::new(),
            difficulty: None,
            techniques: Vec::new(),
            platforms: Vec::new(),
            usage_count: 0,
        }
    }

    pub fn aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases = to_strings(aliases);
        self
    }

    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn examples(mut self, examples: &[&str]) -> Self {
        self.examples = to_strings(examples);
        self
    }

    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.tags = to_strings(tags);
        self
    }

    pub fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = Some(difficulty);
        self
    }

    pub fn platforms(mut self, platforms: &[&str]) -> Self {
        self.platforms = to_strings(platforms);
        self
    }

    pub fn techniques(mut self, techniques: &[&str]) -> Self {
        self.techniques = to_strings(techniques);
        self
    }

    /// Id used when `id` is empty: `cmd_<name>`.
    pub fn record_id(&self) -> String {
        if self.id.trim().is_empty() {
            format!("cmd_{}", normalize_key(&self.name).replace(' ', "_"))
        } else {
            self.id.clone()
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

impl From<CommandDescriptor> for IndexableRecord {
    fn from(cmd: CommandDescriptor) -> Self {
        let mut record = IndexableRecord::new(cmd.record_id())
            .with_name(cmd.name.clone())
            .with_field("name", cmd.name, TITLE_WEIGHT)
            .with_category(cmd.category.as_str());

        if !cmd.tags.is_empty() {
            record = record.with_field("tags", joined(&cmd.tags), TAGS_WEIGHT);
        }
        record = record.with_field("description", cmd.description, BODY_WEIGHT);
        if !cmd.usage.is_empty() {
            record = record.with_field("usage", cmd.usage, AUXILIARY_WEIGHT);
        }
        if !cmd.examples.is_empty() {
            record = record.with_field("examples", cmd.examples.join("\n"), AUXILIARY_WEIGHT);
        }

        if let Some(difficulty) = cmd.difficulty {
            record = record.with_attribute(DIFFICULTY_ATTRIBUTE, difficulty.as_str());
        }
        if !cmd.techniques.is_empty() {
            record = record.with_attribute(TECHNIQUES_ATTRIBUTE, cmd.techniques);
        }
        if !cmd.platforms.is_empty() {
            record = record.with_attribute(PLATFORMS_ATTRIBUTE, cmd.platforms);
        }
        if cmd.usage_count > 0 {
            let popularity = popularity_from_count(cmd.usage_count);
            record = record.with_attribute(POPULARITY_ATTRIBUTE, popularity);
        }

        record.aliases = cmd.aliases;
        record.with_tags(cmd.tags)
    }
}

/// The command palette catalog.
#[derive(Debug, Clone, Copy, Default)]
pub struct Commands;

impl CatalogKind for Commands {
    type Item = CommandDescriptor;
    const NAME: &'static str = "commands";

    fn categories() -> Vec<String> {
        CommandCategory::ALL.iter().map(|c| c.as_str().to_string()).collect()
    }

    fn default_corpus() -> Vec<CommandDescriptor> {
        use CommandCategory::*;

        vec![
            CommandDescriptor::new(
                "help",
                System,
                "List available commands or show detailed help for one command",
            )
            .aliases(&["?", "man"])
            .usage("help [command]")
            .examples(&["help", "help pov-init"])
            .tags(&["help", "docs", "getting-started"])
            .difficulty(Difficulty::Beginner),
            CommandDescriptor::new("clear", System, "Clear the terminal output")
                .aliases(&["cls"])
                .usage("clear")
                .tags(&["terminal"])
                .difficulty(Difficulty::Beginner),
            CommandDescriptor::new(
                "whoami",
                System,
                "Show the signed-in consultant and active engagement",
            )
            .usage("whoami")
            .tags(&["session", "profile"])
            .difficulty(Difficulty::Beginner),
            CommandDescriptor::new("history", System, "Show previously executed commands")
                .usage("history [-n count]")
                .examples(&["history -n 20"])
                .tags(&["terminal"])
                .difficulty(Difficulty::Beginner),
            CommandDescriptor::new("goto", Navigation, "Navigate to a portal section")
                .aliases(&["cd", "open"])
                .usage("goto <dashboard|pov|trr|content|kb>")
                .examples(&["goto dashboard", "goto trr"])
                .tags(&["navigation"])
                .difficulty(Difficulty::Beginner),
            CommandDescriptor::new(
                "dashboard",
                Navigation,
                "Open the engagement dashboard with active POVs and pending TRRs",
            )
            .aliases(&["home"])
            .usage("dashboard")
            .tags(&["navigation", "overview"])
            .difficulty(Difficulty::Beginner),
            CommandDescriptor::new(
                "pov-init",
                Pov,
                "Create a proof-of-value engagement from a template",
            )
            .aliases(&["pov-new"])
            .usage("pov-init <customer> [--template name]")
            .examples(&["pov-init acme --template cloud-detection"])
            .tags(&["pov", "engagement", "setup"])
            .difficulty(Difficulty::Intermediate)
            .platforms(&["aws", "azure", "gcp"]),
            CommandDescriptor::new(
                "pov-status",
                Pov,
                "Show milestones, blockers and success criteria for a POV",
            )
            .usage("pov-status [pov-id]")
            .tags(&["pov", "engagement", "tracking"])
            .difficulty(Difficulty::Beginner),
            CommandDescriptor::new(
                "pov-report",
                Pov,
                "Generate the executive summary report for a completed POV",
            )
            .usage("pov-report <pov-id> [--format pdf|md]")
            .examples(&["pov-report pov-42 --format md"])
            .tags(&["pov", "reporting"])
            .difficulty(Difficulty::Intermediate),
            CommandDescriptor::new(
                "trr-create",
                Trr,
                "Open a technical review request against a POV deliverable",
            )
            .aliases(&["trr-new"])
            .usage("trr-create <pov-id> --title <title>")
            .tags(&["trr", "review"])
            .difficulty(Difficulty::Intermediate),
            CommandDescriptor::new(
                "trr-list",
                Trr,
                "List technical review requests filtered by status",
            )
            .usage("trr-list [--status open|validated|rejected]")
            .examples(&["trr-list --status open"])
            .tags(&["trr", "review", "tracking"])
            .difficulty(Difficulty::Beginner),
            CommandDescriptor::new(
                "trr-validate",
                Trr,
                "Run validation checks on a TRR and record the evidence",
            )
            .usage("trr-validate <trr-id>")
            .examples(&["trr-validate trr-108"])
            .tags(&["trr", "validation", "evidence"])
            .difficulty(Difficulty::Advanced)
            .techniques(&["T1078", "T1110"]),
            CommandDescriptor::new(
                "scenario-deploy",
                Content,
                "Deploy a detection scenario into a customer lab environment",
            )
            .aliases(&["deploy"])
            .usage("scenario-deploy <scenario-id> --env <lab>")
            .examples(&["scenario-deploy cloud-cred-abuse --env acme-lab"])
            .tags(&["content", "scenario", "lab"])
            .difficulty(Difficulty::Advanced)
            .techniques(&["T1078", "T1530"])
            .platforms(&["aws", "azure"]),
            CommandDescriptor::new(
                "content-search",
                Content,
                "Search the content library for scenarios, demos and templates",
            )
            .aliases(&["cs"])
            .usage("content-search <query> [--category name]")
            .examples(&["content-search ransomware --category Demos"])
            .tags(&["content", "search"])
            .difficulty(Difficulty::Beginner),
            CommandDescriptor::new("kb-search", Knowledge, "Search knowledge base articles")
                .aliases(&["kb"])
                .usage("kb-search <query> [--tag tag]")
                .examples(&["kb-search trr validation"])
                .tags(&["knowledge", "search", "docs"])
                .difficulty(Difficulty::Beginner),
            CommandDescriptor::new("kb-open", Knowledge, "Open a knowledge base article by id")
                .usage("kb-open <article-id>")
                .examples(&["kb-open kb_trr_001"])
                .tags(&["knowledge", "docs"])
                .difficulty(Difficulty::Beginner),
            CommandDescriptor::new(
                "ai-ask",
                Ai,
                "Ask the assistant a question about the active engagement",
            )
            .aliases(&["ask"])
            .usage("ai-ask <question>")
            .examples(&["ai-ask which success criteria are still open?"])
            .tags(&["ai", "assistant"])
            .difficulty(Difficulty::Intermediate),
            CommandDescriptor::new(
                "ai-summarize",
                Ai,
                "Summarize TRR evidence or POV notes with the assistant",
            )
            .usage("ai-summarize <trr-id|pov-id>")
            .tags(&["ai", "assistant", "reporting"])
            .difficulty(Difficulty::Intermediate),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::validate::validate;

    #[test]
    fn test_record_id_derived_from_name() {
        let cmd = CommandDescriptor::new("POV Init", CommandCategory::Pov, "x");
        assert_eq!(cmd.record_id(), "cmd_pov_init");

        let explicit = CommandDescriptor {
            id: "custom".to_string(),
            ..cmd
        };
        assert_eq!(explicit.record_id(), "custom");
    }

    #[test]
    fn test_conversion_weights_and_names() {
        let record: IndexableRecord =
            CommandDescriptor::new("help", CommandCategory::System, "List commands")
                .aliases(&["?"])
                .usage("help [command]")
                .tags(&["docs"])
                .into();

        assert_eq!(record.id.as_str(), "cmd_help");
        assert_eq!(record.primary_names, vec!["help".to_string()]);
        assert_eq!(record.aliases, vec!["?".to_string()]);
        assert_eq!(record.category.as_deref(), Some("system"));

        let weights: Vec<(&str, f32)> = record
            .fields
            .iter()
            .map(|f| (f.tag.as_str(), f.weight))
            .collect();
        assert_eq!(
            weights,
            vec![("name", 10.0), ("tags", 8.0), ("description", 5.0), ("usage", 3.0)]
        );
    }

    #[test]
    fn test_category_serde_is_lowercase() {
        let json = serde_json::to_string(&CommandCategory::Navigation).unwrap();
        assert_eq!(json, "\"navigation\"");
        let back: CommandCategory = serde_json::from_str("\"ai\"").unwrap();
        assert_eq!(back, CommandCategory::Ai);
    }

    #[test]
    fn test_default_corpus_is_valid() {
        let records: Vec<IndexableRecord> = Commands::default_corpus()
            .into_iter()
            .map(Into::into)
            .collect();
        let report = validate(&records, &Commands::categories());
        assert!(report.is_valid, "{report:?}");
    }
}
