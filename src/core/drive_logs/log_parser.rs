// This is the heart of the service: it turns the paragraph lines of a site log
// document into a nested site -> task -> subtask structure.
// Like the rest of `core/`, it has no idea where the lines came from (Drive,
// a local file, a test) and performs no I/O.

use serde::Serialize;
use unicode_general_category::{get_general_category, GeneralCategory};

// ============================================================================
// DOMAIN MODELS
// ============================================================================
// Field names are part of the JSON contract with existing consumers, so they
// must stay exactly `site`/`tasks` and `main`/`subtasks`.

/// A task opened by a line mentioning "main", plus the lines that follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Task {
    pub main: String,
    pub subtasks: Vec<String>,
}

/// A site opened by a single capitalised alphabetic word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    pub site: String,
    pub tasks: Vec<Task>,
}

/// The full output of one parse: sites in the order they were encountered.
pub type StructuredLog = Vec<Site>;

/// What a single line means on its own, before looking at any context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Site,
    Task,
    Subtask,
}

// ============================================================================
// CLASSIFICATION
// ============================================================================

/// Classifies one line. Stateless: the same line always yields the same kind.
///
/// Site markers win over task markers, so "Mainframe" opens a site.
pub fn classify_line(line: &str) -> LineKind {
    if is_site_marker(line) {
        LineKind::Site
    } else if is_task_marker(line) {
        LineKind::Task
    } else {
        LineKind::Subtask
    }
}

/// A letter in the strict sense: Lu, Ll, Lt, Lm or Lo.
///
/// Narrower than `char::is_alphabetic`, which also admits letter numbers
/// (`Ⅻ`), combining vowel signs and circled letters.
fn is_letter(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
    )
}

fn is_site_marker(line: &str) -> bool {
    line.chars().next().is_some_and(char::is_uppercase) && line.chars().all(is_letter)
}

fn is_task_marker(line: &str) -> bool {
    line.to_lowercase().contains("main")
}

// ============================================================================
// PARSER
// ============================================================================

/// Index of the task currently collecting subtasks.
///
/// A task opened before any site has nowhere to live in the output, but it
/// still swallows the lines that follow it until the next marker.
enum OpenTask {
    Attached(usize),
    Detached,
}

/// Builds a [`StructuredLog`] from pre-trimmed, non-empty lines.
///
/// Total over its input: lines that have no container to go into are dropped,
/// never reported.
pub fn parse_lines<I, S>(lines: I) -> StructuredLog
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut sites: StructuredLog = Vec::new();
    let mut current_task: Option<OpenTask> = None;

    for line in lines {
        let line: String = line.into();

        match classify_line(&line) {
            LineKind::Site => {
                sites.push(Site {
                    site: line,
                    tasks: Vec::new(),
                });
                current_task = None;
            }
            LineKind::Task => {
                let task = Task {
                    main: line,
                    subtasks: Vec::new(),
                };
                current_task = Some(match sites.last_mut() {
                    Some(site) => {
                        site.tasks.push(task);
                        OpenTask::Attached(site.tasks.len() - 1)
                    }
                    None => OpenTask::Detached,
                });
            }
            LineKind::Subtask => {
                if let Some(OpenTask::Attached(index)) = current_task {
                    // An attached task always belongs to the last site, because
                    // opening a site resets `current_task`.
                    if let Some(task) = sites.last_mut().and_then(|s| s.tasks.get_mut(index)) {
                        task.subtasks.push(line);
                    }
                }
            }
        }
    }

    sites
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn task(main: &str, subtasks: &[&str]) -> Task {
        Task {
            main: main.to_string(),
            subtasks: subtasks.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn site(name: &str, tasks: Vec<Task>) -> Site {
        Site {
            site: name.to_string(),
            tasks,
        }
    }

    #[test]
    fn single_site_task_and_subtasks() {
        let log = parse_lines(["SiteAlpha", "Main Task One", "Check valves", "Inspect pump"]);

        assert_eq!(
            log,
            vec![site(
                "SiteAlpha",
                vec![task("Main Task One", &["Check valves", "Inspect pump"])]
            )]
        );
    }

    #[test]
    fn lines_before_first_site_are_dropped() {
        let log = parse_lines(["random note", "SiteBeta"]);
        assert_eq!(log, vec![site("SiteBeta", vec![])]);
    }

    #[test]
    fn loose_line_without_task_is_dropped() {
        let log = parse_lines(["SiteGamma", "loose note without any context"]);
        assert_eq!(log, vec![site("SiteGamma", vec![])]);
    }

    #[test]
    fn task_context_does_not_leak_into_next_site() {
        let log = parse_lines([
            "SiteDelta",
            "Main one",
            "sub1",
            "SiteEpsilon",
            "Main two",
            "sub2",
        ]);

        assert_eq!(
            log,
            vec![
                site("SiteDelta", vec![task("Main one", &["sub1"])]),
                site("SiteEpsilon", vec![task("Main two", &["sub2"])]),
            ]
        );
    }

    #[test]
    fn new_site_clears_open_task() {
        let log = parse_lines(["SiteA", "Main one", "SiteB", "orphan"]);
        assert_eq!(
            log,
            vec![site("SiteA", vec![task("Main one", &[])]), site("SiteB", vec![])]
        );
    }

    #[test]
    fn empty_input_gives_empty_log() {
        let log = parse_lines(Vec::<String>::new());
        assert!(log.is_empty());
    }

    #[test]
    fn digits_are_neither_site_nor_task() {
        assert!(parse_lines(["ALLCAPS123"]).is_empty());
        assert_eq!(classify_line("ALLCAPS123"), LineKind::Subtask);
    }

    #[test]
    fn site_marker_wins_over_main() {
        assert_eq!(classify_line("Mainframe"), LineKind::Site);
        assert_eq!(classify_line("Maintenance"), LineKind::Site);

        let log = parse_lines(["Mainframe", "MAIN pump", "x"]);
        assert_eq!(log, vec![site("Mainframe", vec![task("MAIN pump", &["x"])])]);
    }

    #[test]
    fn task_marker_is_case_insensitive_and_anywhere() {
        assert_eq!(classify_line("the MaIn valve"), LineKind::Task);
        assert_eq!(classify_line("remains open"), LineKind::Task);
        assert_eq!(classify_line("domain-7"), LineKind::Task);
    }

    #[test]
    fn site_marker_rules() {
        assert_eq!(classify_line("Harbour"), LineKind::Site);
        assert_eq!(classify_line("Zürich"), LineKind::Site);
        assert_eq!(classify_line("harbour"), LineKind::Subtask);
        assert_eq!(classify_line("Site-12"), LineKind::Subtask);
        assert_eq!(classify_line("Site Alpha"), LineKind::Subtask);
    }

    #[test]
    fn site_marker_needs_letters_not_just_alphabetic() {
        // Circled letter (So), vowel sign (Mc) and roman numeral (Nl) are
        // alphabetic in Unicode but not letters.
        assert_eq!(classify_line("Ⓐbc"), LineKind::Subtask);
        assert_eq!(classify_line("Aा"), LineKind::Subtask);
        assert_eq!(classify_line("Ⅻ"), LineKind::Subtask);

        assert_eq!(classify_line("Ωmega"), LineKind::Site);
        assert_eq!(classify_line("Aʰ"), LineKind::Site);
    }

    #[test]
    fn detached_task_swallows_following_lines() {
        let log = parse_lines(["Main before site", "sub a", "SiteOne", "Main inside", "sub b"]);
        assert_eq!(
            log,
            vec![site("SiteOne", vec![task("Main inside", &["sub b"])])]
        );
    }

    #[test]
    fn subtask_count_matches_lines_between_markers() {
        let lines = [
            "Depot", "Main a", "1", "2", "3", "Main b", "SiteX", "Main c", "4", "5",
        ];
        let log = parse_lines(lines);

        let counts: Vec<usize> = log
            .iter()
            .flat_map(|s| s.tasks.iter().map(|t| t.subtasks.len()))
            .collect();
        assert_eq!(counts, vec![3, 0, 2]);
    }

    #[test]
    fn classification_is_stateless() {
        for line in ["SiteAlpha", "Main Task", "note", "Mainframe", "x1"] {
            assert_eq!(classify_line(line), classify_line(line));
        }
    }

    #[test]
    fn serializes_with_contract_field_names() {
        let log = parse_lines(["SiteAlpha", "Main Task One", "Check valves"]);
        let json = serde_json::to_value(&log).unwrap();

        assert_eq!(
            json,
            serde_json::json!([
                { "site": "SiteAlpha", "tasks": [ { "main": "Main Task One", "subtasks": ["Check valves"] } ] }
            ])
        );
    }
}
