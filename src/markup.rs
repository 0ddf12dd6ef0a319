//! Student extraction from a scraped progress page.
//!
//! The page has no declared schema, so extraction is driven by a small table of
//! selector rules. A rule either resolves to a node or to nothing; a miss drops
//! only the item it was looking for.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::config::{ExtractionConfig, MAX_COURSE_NAME_LEN, MIN_COURSE_NAME_LEN};
use crate::dom::{Document, NodeId};
use crate::error::{ParseError, Result};
use crate::models::{Assignment, AttendanceRecord, Course, Profile, Student};
use crate::status::{
    assignment_status_from_label, attendance_status_from_label, collapse_whitespace,
    course_status_from_label, status_from_banner,
};

#[derive(Debug, Clone, Copy)]
enum Selector {
    TagWithClass(&'static str, &'static str),
    Classes(&'static [&'static str]),
    DataElement(&'static str),
    HasAttr(&'static str),
    Tag(&'static str),
    WidthPercent,
}

impl Selector {
    fn matches(self, doc: &Document, id: NodeId) -> bool {
        match self {
            Selector::TagWithClass(tag, class) => {
                doc.tag(id) == Some(tag) && doc.has_class(id, class)
            }
            Selector::Classes(classes) => classes.iter().all(|class| doc.has_class(id, class)),
            Selector::DataElement(name) => doc.attr(id, "data-element") == Some(name),
            Selector::HasAttr(name) => doc.attr(id, name).is_some(),
            Selector::Tag(tag) => doc.tag(id) == Some(tag),
            Selector::WidthPercent => width_percent(doc, id).is_some(),
        }
    }
}

fn matches_any(selectors: &[Selector], doc: &Document, id: NodeId) -> bool {
    selectors.iter().any(|selector| selector.matches(doc, id))
}

/// How a rule looks for its target relative to a starting node.
#[derive(Debug, Clone, Copy)]
enum Lookup {
    Descendant(&'static [Selector]),
    Ancestor(&'static [Selector], usize),
}

impl Lookup {
    fn resolve(self, doc: &Document, from: NodeId) -> Option<NodeId> {
        match self {
            Lookup::Descendant(selectors) => doc
                .descendant_elements(from)
                .find(|id| matches_any(selectors, doc, *id)),
            Lookup::Ancestor(selectors, depth) => doc
                .ancestors(from)
                .take(depth)
                .find(|id| matches_any(selectors, doc, *id)),
        }
    }

    fn resolve_all(self, doc: &Document, from: NodeId) -> Vec<NodeId> {
        match self {
            Lookup::Descendant(selectors) => doc
                .descendant_elements(from)
                .filter(|id| matches_any(selectors, doc, *id))
                .collect(),
            Lookup::Ancestor(..) => self.resolve(doc, from).into_iter().collect(),
        }
    }
}

const STUDENT_ANCHOR: &[Selector] = &[
    Selector::TagWithClass("h3", "text-3xl"),
    Selector::DataElement("student-name"),
];
const STUDENT_CONTAINER: &[Selector] = &[
    Selector::Classes(&["container", "flex-col", "border-b"]),
    Selector::DataElement("student-card"),
];
const IMAGE: &[Selector] = &[Selector::Tag("img")];
const STATUS_BANNER: &[Selector] = &[
    Selector::DataElement("status-badge"),
    Selector::Classes(&["inline-block", "text-xs"]),
];
const PROGRESS_SECTION: &[Selector] = &[
    Selector::Tag("section"),
    Selector::DataElement("progress-section"),
];
const PROGRESS_BAR: &[Selector] = &[Selector::WidthPercent];
const COURSE_ROW: &[Selector] = &[
    Selector::HasAttr("data-course"),
    Selector::DataElement("course-item"),
];
const ATTENDANCE_ENTRY: &[Selector] = &[Selector::HasAttr("data-event-name")];
const ASSIGNMENT_ENTRY: &[Selector] = &[Selector::HasAttr("data-assignment")];
const STATUS_LABEL: &[Selector] = &[Selector::DataElement("item-status-label")];

/// Text that shows up inside progress sections but never names a course.
const COURSE_NAME_EXCLUSIONS: &[&str] = &[
    "total point",
    "course progress",
    "your learning",
    "attendance",
    "last updated",
];

/// Parses a scraped progress page into students.
pub fn parse_markup(input: &str, config: &ExtractionConfig) -> Result<Vec<Student>> {
    if input.trim().is_empty() {
        return Err(ParseError::EmptyInput);
    }
    let doc = Document::parse(input)?;

    let anchors: Vec<NodeId> = doc
        .elements()
        .filter(|id| matches_any(STUDENT_ANCHOR, &doc, *id))
        .collect();
    if anchors.is_empty() {
        return Err(ParseError::NoStudentsFound);
    }

    let mut seen_containers = HashSet::new();
    let mut students = Vec::with_capacity(anchors.len());
    for anchor in anchors {
        let name = doc.text(anchor);
        if name.is_empty() {
            debug!(node = anchor, "student anchor without a name, skipping");
            continue;
        }
        let Some(container) =
            Lookup::Ancestor(STUDENT_CONTAINER, config.container_depth).resolve(&doc, anchor)
        else {
            warn!(
                student = %name,
                depth = config.container_depth,
                "no student container within ancestor bound, dropping student"
            );
            continue;
        };
        if !seen_containers.insert(container) {
            continue;
        }
        students.push(extract_student(&doc, container, name, config));
    }

    if students.is_empty() {
        return Err(ParseError::NoStudentsFound);
    }
    debug!(count = students.len(), "extracted students from markup");
    Ok(students)
}

fn extract_student(
    doc: &Document,
    container: NodeId,
    name: String,
    config: &ExtractionConfig,
) -> Student {
    let status = Lookup::Descendant(STATUS_BANNER)
        .resolve(doc, container)
        .and_then(|banner| status_from_banner(&doc.text(banner)));

    let mut student = Student::new(name, status);
    student.image = Lookup::Descendant(IMAGE)
        .resolve(doc, container)
        .and_then(|img| doc.attr(img, "src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(str::to_string);
    student.courses = extract_courses(doc, container, config);
    student.attendance = extract_attendance(doc, container);
    student.assignments = extract_assignments(doc, container);

    let lines = doc.text_lines(container);
    student.last_updated = lines
        .iter()
        .find(|line| line.to_lowercase().contains("last updated"))
        .cloned();
    student.profile = extract_profile(&lines);
    student
}

fn extract_courses(doc: &Document, container: NodeId, config: &ExtractionConfig) -> Vec<Course> {
    let mut courses: Vec<Course> = Vec::new();
    let mut visited_bars = HashSet::new();

    for section in Lookup::Descendant(PROGRESS_SECTION).resolve_all(doc, container) {
        for bar in Lookup::Descendant(PROGRESS_BAR).resolve_all(doc, section) {
            if !visited_bars.insert(bar) {
                continue;
            }
            let Some(row) = Lookup::Ancestor(COURSE_ROW, config.row_depth).resolve(doc, bar)
            else {
                warn!(
                    node = bar,
                    depth = config.row_depth,
                    "progress bar without a course row within bound, skipping course"
                );
                continue;
            };
            let Some(course) = course_from_row(doc, row, bar) else {
                continue;
            };
            if courses.iter().any(|existing| existing.name == course.name) {
                continue;
            }
            courses.push(course);
        }
    }
    courses
}

fn course_from_row(doc: &Document, row: NodeId, bar: NodeId) -> Option<Course> {
    let first_line = doc.text_lines(row).into_iter().next()?;
    let name = strip_trailing_percent(&first_line);
    if !is_course_name(&name) {
        debug!(candidate = %name, "rejected course name candidate");
        return None;
    }

    let status_text = Lookup::Descendant(STATUS_LABEL)
        .resolve(doc, row)
        .map(|label| doc.text(label))
        .unwrap_or_else(|| doc.text(row));
    let status = course_status_from_label(&status_text);
    let progress = width_percent(doc, bar).unwrap_or(0.0).round().max(0.0) as u32;

    Some(Course::new(name, progress, status))
}

fn extract_attendance(doc: &Document, container: NodeId) -> Vec<AttendanceRecord> {
    labelled_entries(doc, container, ATTENDANCE_ENTRY, "data-event-name")
        .into_iter()
        .map(|(event, label)| AttendanceRecord {
            event,
            status: attendance_status_from_label(&label),
        })
        .collect()
}

fn extract_assignments(doc: &Document, container: NodeId) -> Vec<Assignment> {
    labelled_entries(doc, container, ASSIGNMENT_ENTRY, "data-assignment")
        .into_iter()
        .map(|(name, label)| Assignment {
            name,
            status: assignment_status_from_label(&label),
        })
        .collect()
}

// (name attribute, nested status label) pairs; entries missing either are skipped.
fn labelled_entries(
    doc: &Document,
    container: NodeId,
    selectors: &'static [Selector],
    name_attr: &str,
) -> Vec<(String, String)> {
    Lookup::Descendant(selectors)
        .resolve_all(doc, container)
        .into_iter()
        .filter_map(|entry| {
            let name = collapse_whitespace(doc.attr(entry, name_attr)?);
            let label = Lookup::Descendant(STATUS_LABEL)
                .resolve(doc, entry)
                .map(|label| doc.text(label))?;
            if name.is_empty() || label.is_empty() {
                return None;
            }
            Some((name, label))
        })
        .collect()
}

fn extract_profile(lines: &[String]) -> Option<Profile> {
    let value_after = |label: &str| {
        lines
            .iter()
            .position(|line| line.eq_ignore_ascii_case(label))
            .and_then(|index| lines.get(index + 1))
            .cloned()
    };
    let profile = Profile {
        university: value_after("University"),
        major: value_after("Major"),
        ..Profile::default()
    };
    if profile == Profile::default() {
        None
    } else {
        Some(profile)
    }
}

/// Reads `width: NN%` out of an inline style.
fn width_percent(doc: &Document, id: NodeId) -> Option<f64> {
    doc.attr(id, "style")?.split(';').find_map(|decl| {
        let (key, value) = decl.split_once(':')?;
        if !key.trim().eq_ignore_ascii_case("width") {
            return None;
        }
        value.trim().strip_suffix('%')?.trim().parse::<f64>().ok()
    })
}

/// "Belajar Dasar AI39%" -> "Belajar Dasar AI"
fn strip_trailing_percent(line: &str) -> String {
    let trimmed = line.trim();
    if let Some(rest) = trimmed.strip_suffix('%') {
        let stripped = rest.trim_end_matches(|c: char| c.is_ascii_digit() || c == '.');
        if stripped.len() < rest.len() {
            return stripped.trim().to_string();
        }
    }
    trimmed.to_string()
}

fn is_course_name(name: &str) -> bool {
    let len = name.chars().count();
    if !(MIN_COURSE_NAME_LEN..=MAX_COURSE_NAME_LEN).contains(&len) {
        return false;
    }
    let lowered = name.to_lowercase();
    !COURSE_NAME_EXCLUSIONS
        .iter()
        .any(|phrase| lowered.contains(phrase))
}
