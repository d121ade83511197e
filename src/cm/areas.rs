// ABOUTME: Chooses which file areas take part in a deployment.
// ABOUTME: Driven by the baseline's current stage, the lifecycle order, and an optional name filter.

use tracing::debug;

use crate::types::{FileArea, Lifecycle, StageId};

use super::command::{normalize_list, split_list};

/// Explicit set of area names to deploy to. The literal `ALL` means no filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaFilter {
    names: Vec<String>,
}

impl AreaFilter {
    /// Parse a free-text area list (`;` or newline separated).
    ///
    /// Returns `None` for blank input, for `ALL`, and for input that contains no names.
    pub fn parse(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("ALL") {
            return None;
        }
        Self::from_names(split_list(trimmed))
    }

    /// Build a filter from individual names. `None` when nothing usable remains.
    pub fn from_names<I, S>(names: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut collected: Vec<String> = Vec::new();
        for name in names {
            let name = name.as_ref().trim().to_uppercase();
            if !name.is_empty() && !collected.contains(&name) {
                collected.push(name);
            }
        }

        if collected.is_empty() || (collected.len() == 1 && collected[0] == "ALL") {
            None
        } else {
            Some(Self { names: collected })
        }
    }

    pub fn contains(&self, area: &str) -> bool {
        let area = area.trim().to_uppercase();
        self.names.iter().any(|n| *n == area)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `(A,B,C)` for the `/AREA_LIST=` option.
    pub fn to_list_arg(&self) -> String {
        normalize_list(&self.names.join(";"))
    }
}

/// Select the areas to deploy to.
///
/// With a current stage, keep the areas at that stage, narrowed by `filter` when given.
/// Without one, keep the areas whose lifecycle index equals the minimum index across
/// all areas; `filter` is not applied in that case. Stages missing from the lifecycle
/// index as -1 and therefore win the minimum. Input order is preserved.
pub fn select(
    areas: &[FileArea],
    current_stage: Option<&StageId>,
    lifecycle: &Lifecycle,
    filter: Option<&AreaFilter>,
) -> Vec<FileArea> {
    let selected: Vec<FileArea> = match current_stage {
        Some(stage) => areas
            .iter()
            .filter(|area| area.stage == *stage)
            .filter(|area| filter.is_none_or(|f| f.contains(&area.name)))
            .cloned()
            .collect(),
        None => {
            let indexed: Vec<(i64, &FileArea)> = areas
                .iter()
                .map(|area| (lifecycle.index_of(&area.stage), area))
                .collect();

            match indexed.iter().map(|(index, _)| *index).min() {
                Some(min) => {
                    debug!(
                        min_index = min,
                        stage = lifecycle.stage_at(min).map(StageId::as_str),
                        "baseline has no current stage; selecting earliest areas"
                    );
                    indexed
                        .into_iter()
                        .filter(|(index, _)| *index == min)
                        .map(|(_, area)| area.clone())
                        .collect()
                }
                None => Vec::new(),
            }
        }
    };

    debug!(
        candidates = areas.len(),
        selected = selected.len(),
        stage = current_stage.map(StageId::as_str),
        "area selection complete"
    );

    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lifecycle() -> Lifecycle {
        ["DEV", "TEST", "PROD"].iter().map(|s| StageId::new(s)).collect()
    }

    fn names(areas: &[FileArea]) -> Vec<&str> {
        areas.iter().map(|a| a.name.as_str()).collect()
    }

    mod filter {
        use super::*;

        #[test]
        fn all_and_blank_mean_no_filter() {
            assert_eq!(AreaFilter::parse("ALL"), None);
            assert_eq!(AreaFilter::parse(" all "), None);
            assert_eq!(AreaFilter::parse(""), None);
            assert_eq!(AreaFilter::parse(" ;\n "), None);
        }

        #[test]
        fn names_are_uppercased_and_deduplicated() {
            let filter = AreaFilter::parse("web; db\nweb").unwrap();
            assert_eq!(filter.names(), &["WEB".to_string(), "DB".to_string()]);
            assert_eq!(filter.to_list_arg(), "(WEB,DB)");
        }

        #[test]
        fn membership_ignores_case() {
            let filter = AreaFilter::from_names(["areaC"]).unwrap();
            assert!(filter.contains("AREAC"));
            assert!(filter.contains("areac"));
            assert!(!filter.contains("areaB"));
        }
    }

    mod with_current_stage {
        use super::*;

        #[test]
        fn filter_narrows_stage_matches() {
            let areas = vec![
                FileArea::new("areaA", "DEV"),
                FileArea::new("areaB", "TEST"),
                FileArea::new("areaC", "TEST"),
            ];
            let filter = AreaFilter::from_names(["areaC"]);

            let selected = select(
                &areas,
                Some(&StageId::new("TEST")),
                &lifecycle(),
                filter.as_ref(),
            );

            assert_eq!(names(&selected), vec!["areaC"]);
        }

        #[test]
        fn without_filter_keeps_all_stage_matches() {
            let areas = vec![
                FileArea::new("areaA", "DEV"),
                FileArea::new("areaB", "TEST"),
                FileArea::new("areaC", "TEST"),
            ];

            let selected = select(&areas, Some(&StageId::new("TEST")), &lifecycle(), None);

            assert_eq!(names(&selected), vec!["areaB", "areaC"]);
        }

        #[test]
        fn filter_outside_stage_yields_nothing() {
            let areas = vec![FileArea::new("areaA", "DEV")];
            let filter = AreaFilter::from_names(["areaA"]);

            let selected = select(
                &areas,
                Some(&StageId::new("PROD")),
                &lifecycle(),
                filter.as_ref(),
            );

            assert!(selected.is_empty());
        }
    }

    mod without_current_stage {
        use super::*;

        #[test]
        fn picks_earliest_stage() {
            let areas = vec![FileArea::new("areaA", "DEV"), FileArea::new("areaB", "TEST")];

            let selected = select(&areas, None, &lifecycle(), None);

            assert_eq!(names(&selected), vec!["areaA"]);
        }

        #[test]
        fn filter_is_not_applied() {
            let areas = vec![FileArea::new("areaA", "DEV"), FileArea::new("areaB", "TEST")];
            let filter = AreaFilter::from_names(["areaB"]);

            let selected = select(&areas, None, &lifecycle(), filter.as_ref());

            assert_eq!(names(&selected), vec!["areaA"]);
        }

        #[test]
        fn unmapped_stage_wins_the_minimum() {
            let areas = vec![
                FileArea::new("areaA", "DEV"),
                FileArea::new("areaX", "SANDBOX"),
                FileArea::new("areaB", "TEST"),
            ];

            let selected = select(&areas, None, &lifecycle(), None);

            assert_eq!(names(&selected), vec!["areaX"]);
        }

        #[test]
        fn all_areas_at_same_stage_are_kept() {
            let areas = vec![FileArea::new("a1", "TEST"), FileArea::new("a2", "TEST")];

            let selected = select(&areas, None, &lifecycle(), None);

            assert_eq!(names(&selected), vec!["a1", "a2"]);
        }

        #[test]
        fn no_areas_yields_nothing() {
            assert!(select(&[], None, &lifecycle(), None).is_empty());
        }
    }
}
