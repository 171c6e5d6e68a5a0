//! Three-level category taxonomy analysis.
//!
//! Categories run coarsest to finest: great-grandparent, grandparent, parent,
//! then the class name itself. A level is only recorded when every coarser
//! level above it is populated on the same record.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write;

use crate::analyzers::filter::FilterCriteria;
use crate::analyzers::types::CategoryShare;
use crate::analyzers::utility::format_count;
use crate::record::Record;

const UNKNOWN_CATEGORY: &str = "Unknown";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GreatGrandparentNode {
    pub count: usize,
    pub attendance: u64,
    pub grandparents: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GrandparentNode {
    pub count: usize,
    pub attendance: u64,
    pub great_grandparent: String,
    pub parents: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParentNode {
    pub count: usize,
    pub attendance: u64,
    pub grandparent: String,
    pub great_grandparent: String,
    pub classes: BTreeSet<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ClassNode {
    pub count: usize,
    pub attendance: u64,
    pub parent: String,
    pub grandparent: String,
    pub great_grandparent: String,
    /// Physical facilities offering the class; virtual sessions are not listed.
    pub facilities: BTreeSet<String>,
}

/// Every category level keyed by name. Ancestor links are taken from the
/// first record that introduced a node.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryHierarchy {
    pub great_grandparents: BTreeMap<String, GreatGrandparentNode>,
    pub grandparents: BTreeMap<String, GrandparentNode>,
    pub parents: BTreeMap<String, ParentNode>,
    pub classes: BTreeMap<String, ClassNode>,
}

impl CategoryHierarchy {
    pub fn from_records(records: &[&Record]) -> Self {
        let mut hierarchy = Self::default();

        for record in records {
            let Some(ggp) = record.great_grandparent() else {
                continue;
            };
            let attendance = record.attendees();

            let ggp_node = hierarchy.great_grandparents.entry(ggp.to_string()).or_default();
            ggp_node.count += 1;
            ggp_node.attendance = ggp_node.attendance.saturating_add(attendance);

            let Some(gp) = record.grandparent_category.as_deref() else {
                continue;
            };
            ggp_node.grandparents.insert(gp.to_string());

            let gp_node = hierarchy
                .grandparents
                .entry(gp.to_string())
                .or_insert_with(|| GrandparentNode {
                    great_grandparent: ggp.to_string(),
                    ..Default::default()
                });
            gp_node.count += 1;
            gp_node.attendance = gp_node.attendance.saturating_add(attendance);

            let Some(parent) = record.parent_category.as_deref() else {
                continue;
            };
            gp_node.parents.insert(parent.to_string());

            let parent_node = hierarchy
                .parents
                .entry(parent.to_string())
                .or_insert_with(|| ParentNode {
                    grandparent: gp.to_string(),
                    great_grandparent: ggp.to_string(),
                    ..Default::default()
                });
            parent_node.count += 1;
            parent_node.attendance = parent_node.attendance.saturating_add(attendance);

            let Some(class) = record.class() else {
                continue;
            };
            parent_node.classes.insert(class.to_string());

            let class_node = hierarchy
                .classes
                .entry(class.to_string())
                .or_insert_with(|| ClassNode {
                    parent: parent.to_string(),
                    grandparent: gp.to_string(),
                    great_grandparent: ggp.to_string(),
                    ..Default::default()
                });
            class_node.count += 1;
            class_node.attendance = class_node.attendance.saturating_add(attendance);
            if !record.is_virtual() {
                class_node.facilities.insert(record.facility.clone());
            }
        }

        hierarchy
    }
}

/// Plain-text summary of the great-grandparent level, busiest first.
pub fn category_report(hierarchy: &CategoryHierarchy) -> String {
    let mut ranked: Vec<(&String, &GreatGrandparentNode)> =
        hierarchy.great_grandparents.iter().collect();
    ranked.sort_by(|a, b| b.1.attendance.cmp(&a.1.attendance).then_with(|| a.0.cmp(b.0)));

    let mut output = String::new();
    let _ = writeln!(output, "=== CATEGORY HIERARCHY ANALYSIS ===");
    let _ = writeln!(output);
    let _ = writeln!(output, "GREAT GRANDPARENT CATEGORIES:");

    if ranked.is_empty() {
        let _ = writeln!(output, "No categorized classes in this selection.");
    }

    for (name, node) in ranked {
        let _ = writeln!(
            output,
            "{}: {} classes, {} total attendance",
            name,
            format_count(node.count as u64),
            format_count(node.attendance)
        );
        let _ = writeln!(
            output,
            "   └─ {} grandparent categories",
            node.grandparents.len()
        );
    }

    output
}

/// Taxonomy level a breakdown is grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryLevel {
    GreatGrandparent,
    Parent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub level: CategoryLevel,
    /// The great-grandparent category being drilled into, if any.
    pub selected: Option<String>,
    pub shares: Vec<CategoryShare>,
}

/// Attendance by great-grandparent category, or by parent category when the
/// criteria select exactly one great-grandparent category.
pub fn category_breakdown(records: &[&Record], criteria: &FilterCriteria) -> CategoryBreakdown {
    let selected = criteria.single_category().map(str::to_string);
    let level = if selected.is_some() {
        CategoryLevel::Parent
    } else {
        CategoryLevel::GreatGrandparent
    };

    let mut totals: HashMap<&str, u64> = HashMap::new();
    for record in records {
        let category = match level {
            CategoryLevel::GreatGrandparent => record.greatgrandparent_category.as_deref(),
            CategoryLevel::Parent => record.parent_category.as_deref(),
        };
        let total = totals.entry(category.unwrap_or(UNKNOWN_CATEGORY)).or_default();
        *total = total.saturating_add(record.attendees());
    }

    let mut shares: Vec<CategoryShare> = totals
        .into_iter()
        .map(|(category, participants)| CategoryShare {
            category: category.to_string(),
            participants,
        })
        .collect();
    shares.sort_by(|a, b| {
        b.participants
            .cmp(&a.participants)
            .then_with(|| a.category.cmp(&b.category))
    });

    CategoryBreakdown {
        level,
        selected,
        shares,
    }
}

/// Great-grandparent category with the highest total attendance.
pub fn top_category(records: &[&Record]) -> Option<CategoryShare> {
    let mut totals: HashMap<&str, u64> = HashMap::new();
    for record in records {
        if let Some(category) = record.great_grandparent() {
            let total = totals.entry(category).or_default();
            *total = total.saturating_add(record.attendees());
        }
    }

    totals
        .into_iter()
        .max_by(|a, b| a.1.cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(category, participants)| CategoryShare {
            category: category.to_string(),
            participants,
        })
}
