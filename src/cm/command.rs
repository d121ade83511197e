// ABOUTME: Renders baseline, delivery, upload, and rollback intents as engine commands.
// ABOUTME: Owns the two quoting modes and the free-text list normalization.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::types::{ObjectSpec, StageId};

use super::areas::AreaFilter;

/// Command verbs understood by the engine's command interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    PromoteBaseline,
    DemoteBaseline,
    Deliver,
    Upload,
    RollbackArea,
    CreateBaseline,
    ActionBaseline,
    ActionWorkset,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::PromoteBaseline => "PMBL",
            Verb::DemoteBaseline => "DMBL",
            Verb::Deliver => "DELIVER",
            Verb::Upload => "UPLOAD",
            Verb::RollbackArea => "SRAV",
            Verb::CreateBaseline => "CBL",
            Verb::ActionBaseline => "ABL",
            Verb::ActionWorkset => "AWS",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wrap a value in double quotes unconditionally.
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value)
}

/// Wrap a value in double quotes only if it contains a space.
pub fn quote_if_spaced(value: &str) -> String {
    if value.contains(' ') {
        quote(value)
    } else {
        value.to_string()
    }
}

/// Split free text on `;` and newlines, trimming each entry and dropping blanks.
pub fn split_list(text: &str) -> Vec<String> {
    text.replace(';', "\n")
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Normalize free text into the engine's parenthesized list form.
///
/// `"A ; B\n\n C"` becomes `"(A,B,C)"`.
pub fn normalize_list(text: &str) -> String {
    format!("({})", split_list(text).join(","))
}

/// Parse `NAME=value` lines. Blank lines are skipped; a line without `=` is returned as the error.
pub fn parse_attributes(text: &str) -> Result<Vec<(String, String)>, String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.split_once('=') {
            Some((name, value)) if !name.trim().is_empty() => {
                Ok((name.trim().to_uppercase(), value.trim().to_string()))
            }
            _ => Err(line.to_string()),
        })
        .collect()
}

/// Opaque token appended to a comment so the resulting job can be found later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationToken(String);

impl CorrelationToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `comment[token]`
    pub fn tag(&self, comment: &str) -> String {
        format!("{}[{}]", comment, self.0)
    }

    /// Whether a history comment was tagged with this token.
    pub fn matches(&self, comment: &str) -> bool {
        comment.ends_with(&format!("[{}]", self.0))
    }
}

impl fmt::Display for CorrelationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A rendered, single-line engine command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    verb: Verb,
    text: String,
}

impl Command {
    pub fn verb(&self) -> Verb {
        self.verb
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// `PMBL product:baseline /COMMENT=... [/WORKSET=] [/STAGE=] /DEPLOY|/NODEPLOY [/AREA_LIST=]`
    pub fn promote(transition: &StageTransition) -> Self {
        transition.render(Verb::PromoteBaseline)
    }

    /// Same shape as [`Command::promote`] with the `DMBL` verb.
    pub fn demote(transition: &StageTransition) -> Self {
        transition.render(Verb::DemoteBaseline)
    }

    pub fn deliver(delivery: &Delivery) -> Self {
        let mut builder = CommandBuilder::new(Verb::Deliver)
            .option(
                "USER_DIRECTORY",
                quote_if_spaced(&delivery.directory.to_string_lossy()),
            )
            .option("WORKSET", quote_if_spaced(&delivery.workset.to_string()));

        if !delivery.comment.is_empty() {
            builder = builder.option("COMMENT", quote(&delivery.comment));
        }

        builder = builder
            .switch("ADD", delivery.add)
            .switch("DELETE", delivery.delete)
            .switch("UPDATE", delivery.update);

        if !delivery.attributes.trim().is_empty() {
            builder = builder.option("ATTRIBUTES", normalize_list(&delivery.attributes));
        }

        builder.build()
    }

    pub fn upload(upload: &Upload) -> Self {
        let mut builder = CommandBuilder::new(Verb::Upload)
            .option("PERMS", "KEEP")
            .option(
                "USER_DIRECTORY",
                quote_if_spaced(&upload.directory.to_string_lossy()),
            )
            .option("WORKSET", quote_if_spaced(&upload.workset.to_string()));

        if !upload.comment.is_empty() {
            builder = builder.option("COMMENT", quote(&upload.comment));
        }
        if !upload.description.is_empty() {
            builder = builder.option("DESCRIPTION", quote(&upload.description));
        }
        if !upload.attributes.trim().is_empty() {
            builder = builder.option("ATTRIBUTES", normalize_list(&upload.attributes));
        }

        builder.build()
    }

    /// `SRAV AREA[;version] /COMMENT="..."`
    pub fn rollback_area(rollback: &AreaRollback) -> Self {
        let area = rollback.area.trim().to_uppercase();
        let target = match rollback.version {
            Some(version) => format!("{};{}", area, version),
            None => area,
        };

        CommandBuilder::new(Verb::RollbackArea)
            .arg(quote_if_spaced(&target))
            .option("COMMENT", quote(&rollback.comment))
            .build()
    }
}

impl Command {
    /// `CBL product:baseline /WORKSET=product:project /TYPE="type" [/ATTRIBUTES=(N=v,...)]`
    pub fn create_baseline(creation: &BaselineCreation) -> Self {
        let mut builder = CommandBuilder::new(Verb::CreateBaseline)
            .arg(quote_if_spaced(&creation.baseline.to_string()))
            .option("WORKSET", quote_if_spaced(&creation.project.to_string()))
            .option("TYPE", quote(&creation.baseline_type));

        if !creation.attributes.is_empty() {
            let pairs: Vec<String> = creation
                .attributes
                .iter()
                .map(|(name, value)| format!("{}={}", name, quote_if_spaced(value)))
                .collect();
            builder = builder.option("ATTRIBUTES", format!("({})", pairs.join(",")));
        }

        builder.build()
    }

    /// `ABL|AWS product:name /STATUS="STATE" /COMMENT="..."`
    pub fn action(action: &LifecycleAction) -> Self {
        let verb = match action.kind {
            EntityKind::Baseline => Verb::ActionBaseline,
            EntityKind::Project | EntityKind::Stream => Verb::ActionWorkset,
        };

        CommandBuilder::new(verb)
            .arg(quote_if_spaced(&action.target.to_string()))
            .option("STATUS", quote(&action.state.trim().to_uppercase()))
            .option("COMMENT", quote(&action.comment))
            .build()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Appends space-separated tokens after a verb. Callers are responsible for ordering.
#[derive(Debug)]
pub struct CommandBuilder {
    verb: Verb,
    text: String,
}

impl CommandBuilder {
    pub fn new(verb: Verb) -> Self {
        Self {
            verb,
            text: verb.as_str().to_string(),
        }
    }

    /// Positional argument.
    pub fn arg(mut self, value: impl AsRef<str>) -> Self {
        self.text.push(' ');
        self.text.push_str(value.as_ref());
        self
    }

    /// `/NAME=value`
    pub fn option(mut self, name: &str, value: impl AsRef<str>) -> Self {
        self.text.push_str(" /");
        self.text.push_str(name);
        self.text.push('=');
        self.text.push_str(value.as_ref());
        self
    }

    /// `/NAME`
    pub fn flag(mut self, name: &str) -> Self {
        self.text.push_str(" /");
        self.text.push_str(name);
        self
    }

    /// `/NAME` or `/NONAME`
    pub fn switch(self, name: &str, on: bool) -> Self {
        if on {
            self.flag(name)
        } else {
            self.flag(&format!("NO{}", name))
        }
    }

    pub fn build(self) -> Command {
        Command {
            verb: self.verb,
            text: self.text,
        }
    }
}

/// Promote or demote a baseline between lifecycle stages.
#[derive(Debug, Clone)]
pub struct StageTransition {
    pub baseline: ObjectSpec,
    pub workset: Option<ObjectSpec>,
    pub stage: Option<StageId>,
    pub deploy: bool,
    pub areas: Option<AreaFilter>,
    pub comment: String,
    pub token: CorrelationToken,
}

impl StageTransition {
    fn render(&self, verb: Verb) -> Command {
        let mut builder = CommandBuilder::new(verb)
            .arg(quote_if_spaced(&self.baseline.to_string()))
            .option("COMMENT", quote(&self.token.tag(&self.comment)));

        if let Some(workset) = &self.workset {
            builder = builder.option("WORKSET", quote_if_spaced(&workset.to_string()));
        }
        if let Some(stage) = &self.stage {
            builder = builder.option("STAGE", quote(stage.as_str()));
        }

        if self.deploy {
            builder = builder.flag("DEPLOY");
            if let Some(areas) = &self.areas {
                builder = builder.option("AREA_LIST", areas.to_list_arg());
            }
        } else {
            builder = builder.flag("NODEPLOY");
        }

        builder.build()
    }
}

/// Deliver a local directory into a project or stream.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub directory: PathBuf,
    pub workset: ObjectSpec,
    pub add: bool,
    pub update: bool,
    pub delete: bool,
    pub attributes: String,
    pub comment: String,
}

/// Upload a local directory into a project, keeping file permissions.
#[derive(Debug, Clone)]
pub struct Upload {
    pub directory: PathBuf,
    pub workset: ObjectSpec,
    pub attributes: String,
    pub comment: String,
    pub description: String,
}

/// Roll an area back to its previous (or a specific) deployed version.
#[derive(Debug, Clone)]
pub struct AreaRollback {
    pub area: String,
    pub version: Option<u32>,
    pub comment: String,
}

/// Kind of object a lifecycle action moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Baseline,
    Project,
    Stream,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Baseline => "baseline",
            EntityKind::Project => "project",
            EntityKind::Stream => "stream",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(EntityKind::Baseline),
            "project" => Ok(EntityKind::Project),
            "stream" => Ok(EntityKind::Stream),
            _ => Err(format!("no such entity type: '{}'", s)),
        }
    }
}

/// Create a release baseline from the current content of a project.
#[derive(Debug, Clone)]
pub struct BaselineCreation {
    pub baseline: ObjectSpec,
    pub project: ObjectSpec,
    pub baseline_type: String,
    pub attributes: Vec<(String, String)>,
}

/// Move a baseline, project, or stream to another lifecycle state.
#[derive(Debug, Clone)]
pub struct LifecycleAction {
    pub kind: EntityKind,
    pub target: ObjectSpec,
    pub state: String,
    pub comment: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transition() -> StageTransition {
        StageTransition {
            baseline: ObjectSpec::new("qlarius", "bl_1").unwrap(),
            workset: None,
            stage: None,
            deploy: false,
            areas: None,
            comment: "release".to_string(),
            token: CorrelationToken::new("req-7"),
        }
    }

    mod quoting {
        use super::*;

        #[test]
        fn quote_if_spaced_leaves_plain_values() {
            assert_eq!(quote_if_spaced("no-space"), "no-space");
        }

        #[test]
        fn quote_if_spaced_wraps_values_with_spaces() {
            assert_eq!(quote_if_spaced("has space"), "\"has space\"");
        }

        #[test]
        fn quote_always_wraps() {
            assert_eq!(quote("DEV"), "\"DEV\"");
            assert_eq!(quote(""), "\"\"");
        }
    }

    mod lists {
        use super::*;

        #[test]
        fn normalizes_semicolons_blank_lines_and_padding() {
            assert_eq!(normalize_list("A ; B\n\n C"), "(A,B,C)");
        }

        #[test]
        fn drops_leading_and_trailing_blank_lines() {
            assert_eq!(normalize_list("\n\n  X=1 \r\nY=2\n\n"), "(X=1,Y=2)");
        }

        #[test]
        fn single_entry() {
            assert_eq!(normalize_list("ONLY"), "(ONLY)");
        }
    }

    mod stage_transitions {
        use super::*;

        #[test]
        fn minimal_promote() {
            let cmd = Command::promote(&transition());
            assert_eq!(cmd.verb(), Verb::PromoteBaseline);
            assert_eq!(
                cmd.as_str(),
                "PMBL QLARIUS:BL_1 /COMMENT=\"release[req-7]\" /NODEPLOY"
            );
        }

        #[test]
        fn full_promote_keeps_option_order() {
            let mut t = transition();
            t.workset = Some(ObjectSpec::new("qlarius", "main stream").unwrap());
            t.stage = Some(StageId::new("test"));
            t.deploy = true;
            t.areas = AreaFilter::parse("area_a; area_b");

            assert_eq!(
                Command::promote(&t).as_str(),
                "PMBL QLARIUS:BL_1 /COMMENT=\"release[req-7]\" \
                 /WORKSET=\"QLARIUS:MAIN STREAM\" /STAGE=\"TEST\" /DEPLOY /AREA_LIST=(AREA_A,AREA_B)"
            );
        }

        #[test]
        fn all_areas_omits_area_list() {
            let mut t = transition();
            t.deploy = true;
            t.areas = AreaFilter::parse(" ALL ");
            assert_eq!(
                Command::promote(&t).as_str(),
                "PMBL QLARIUS:BL_1 /COMMENT=\"release[req-7]\" /DEPLOY"
            );
        }

        #[test]
        fn area_list_ignored_without_deploy() {
            let mut t = transition();
            t.areas = AreaFilter::parse("A");
            assert!(!Command::promote(&t).as_str().contains("AREA_LIST"));
        }

        #[test]
        fn demote_uses_dmbl() {
            let mut t = transition();
            t.stage = Some(StageId::new("DEV"));
            assert_eq!(
                Command::demote(&t).as_str(),
                "DMBL QLARIUS:BL_1 /COMMENT=\"release[req-7]\" /STAGE=\"DEV\" /NODEPLOY"
            );
        }

        #[test]
        fn spaced_baseline_is_quoted() {
            let mut t = transition();
            t.baseline = ObjectSpec::new("p", "my baseline").unwrap();
            assert!(
                Command::promote(&t)
                    .as_str()
                    .starts_with("PMBL \"P:MY BASELINE\" ")
            );
        }
    }

    mod deliveries {
        use super::*;

        fn delivery() -> Delivery {
            Delivery {
                directory: PathBuf::from("/work/src"),
                workset: ObjectSpec::new("qlarius", "main").unwrap(),
                add: true,
                update: false,
                delete: true,
                attributes: String::new(),
                comment: String::new(),
            }
        }

        #[test]
        fn deliver_without_optional_parts() {
            assert_eq!(
                Command::deliver(&delivery()).as_str(),
                "DELIVER /USER_DIRECTORY=/work/src /WORKSET=QLARIUS:MAIN /ADD /DELETE /NOUPDATE"
            );
        }

        #[test]
        fn deliver_with_comment_and_attributes_last() {
            let mut d = delivery();
            d.directory = PathBuf::from("/my work");
            d.comment = "nightly".to_string();
            d.attributes = "OWNER=ops;\nTIER = 1".to_string();
            assert_eq!(
                Command::deliver(&d).as_str(),
                "DELIVER /USER_DIRECTORY=\"/my work\" /WORKSET=QLARIUS:MAIN /COMMENT=\"nightly\" \
                 /ADD /DELETE /NOUPDATE /ATTRIBUTES=(OWNER=ops,TIER = 1)"
            );
        }

        #[test]
        fn upload_keeps_permissions_and_description() {
            let upload = Upload {
                directory: PathBuf::from("/out"),
                workset: ObjectSpec::new("qlarius", "main").unwrap(),
                attributes: "A=1".to_string(),
                comment: "c".to_string(),
                description: "d".to_string(),
            };
            assert_eq!(
                Command::upload(&upload).as_str(),
                "UPLOAD /PERMS=KEEP /USER_DIRECTORY=/out /WORKSET=QLARIUS:MAIN \
                 /COMMENT=\"c\" /DESCRIPTION=\"d\" /ATTRIBUTES=(A=1)"
            );
        }
    }

    mod rollbacks {
        use super::*;

        #[test]
        fn rollback_latest_version() {
            let rollback = AreaRollback {
                area: "web_area".to_string(),
                version: None,
                comment: String::new(),
            };
            assert_eq!(
                Command::rollback_area(&rollback).as_str(),
                "SRAV WEB_AREA /COMMENT=\"\""
            );
        }

        #[test]
        fn rollback_specific_version() {
            let rollback = AreaRollback {
                area: "web area".to_string(),
                version: Some(4),
                comment: "revert".to_string(),
            };
            assert_eq!(
                Command::rollback_area(&rollback).as_str(),
                "SRAV \"WEB AREA;4\" /COMMENT=\"revert\""
            );
        }
    }

    mod baselines {
        use super::*;

        #[test]
        fn create_baseline_with_attributes() {
            let creation = BaselineCreation {
                baseline: ObjectSpec::new("qlarius", "bl 2").unwrap(),
                project: ObjectSpec::new("qlarius", "main").unwrap(),
                baseline_type: "RELEASE".to_string(),
                attributes: parse_attributes("owner=ops team\n\ntier=1").unwrap(),
            };
            assert_eq!(
                Command::create_baseline(&creation).as_str(),
                "CBL \"QLARIUS:BL 2\" /WORKSET=QLARIUS:MAIN /TYPE=\"RELEASE\" \
                 /ATTRIBUTES=(OWNER=\"ops team\",TIER=1)"
            );
        }

        #[test]
        fn create_baseline_without_attributes() {
            let creation = BaselineCreation {
                baseline: ObjectSpec::new("p", "b").unwrap(),
                project: ObjectSpec::new("p", "q").unwrap(),
                baseline_type: "BASELINE".to_string(),
                attributes: Vec::new(),
            };
            assert_eq!(
                Command::create_baseline(&creation).as_str(),
                "CBL P:B /WORKSET=P:Q /TYPE=\"BASELINE\""
            );
        }

        #[test]
        fn attribute_line_without_equals_is_rejected() {
            assert_eq!(parse_attributes("A=1\nbroken"), Err("broken".to_string()));
            assert_eq!(parse_attributes("=1"), Err("=1".to_string()));
        }

        #[test]
        fn action_verb_follows_entity_kind() {
            let mut action = LifecycleAction {
                kind: EntityKind::Baseline,
                target: ObjectSpec::new("qlarius", "bl_1").unwrap(),
                state: "approved".to_string(),
                comment: "signed off".to_string(),
            };
            assert_eq!(
                Command::action(&action).as_str(),
                "ABL QLARIUS:BL_1 /STATUS=\"APPROVED\" /COMMENT=\"signed off\""
            );

            action.kind = EntityKind::Stream;
            assert_eq!(Command::action(&action).verb(), Verb::ActionWorkset);
        }

        #[test]
        fn entity_kind_parses_case_insensitively() {
            assert_eq!("STREAM".parse::<EntityKind>(), Ok(EntityKind::Stream));
            assert_eq!(" Baseline ".parse::<EntityKind>(), Ok(EntityKind::Baseline));
            assert!("request".parse::<EntityKind>().is_err());
        }
    }

    mod tokens {
        use super::*;

        #[test]
        fn token_matches_only_as_suffix() {
            let token = CorrelationToken::new("42");
            assert!(token.matches("deploy it[42]"));
            assert!(!token.matches("deploy it[42] later"));
            assert!(!token.matches("deploy it[142]"));
        }
    }
}
