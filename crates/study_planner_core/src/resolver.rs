//! crates/study_planner_core/src/resolver.rs
//!
//! Turns a technology selection into the ordered list of subtopics to schedule.

use rust_decimal::Decimal;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::domain::{DifficultyLevel, Subtopic, Technology};
use crate::error::{PlannerError, PlannerResult};

/// A subtopic ready to be scheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    pub technology_id: Uuid,
    pub subtopic_id: Uuid,
    pub hours_required: Decimal,
    pub difficulty: DifficultyLevel,
    pub technology_rank: i32,
    pub order_index: i32,
}

/// Orders the subtopics of the selected technologies for scheduling.
///
/// Technologies are sorted by complexity rank, subtopics by `order_index` within
/// their technology. The sort is stable, so technologies sharing a rank keep
/// the order in which they were selected. Subtopics of technologies that were
/// not selected are dropped, as are repeated ids.
pub fn resolve_work_items(
    selected: &[Uuid],
    technologies: &[Technology],
    subtopics: &[Subtopic],
) -> PlannerResult<Vec<WorkItem>> {
    let ranks: HashMap<Uuid, i32> = technologies
        .iter()
        .map(|t| (t.id, t.complexity_rank))
        .collect();

    let mut seen_technologies = HashSet::new();
    let mut ordered_technologies = Vec::with_capacity(selected.len());
    for id in selected {
        let rank = ranks
            .get(id)
            .ok_or_else(|| PlannerError::Validation(format!("Unknown technology {}", id)))?;
        if seen_technologies.insert(*id) {
            ordered_technologies.push((*id, *rank));
        }
    }
    ordered_technologies.sort_by_key(|(_, rank)| *rank);

    let mut seen_subtopics = HashSet::new();
    let mut items = Vec::new();
    for (technology_id, rank) in ordered_technologies {
        let mut own: Vec<&Subtopic> = subtopics
            .iter()
            .filter(|s| s.technology_id == technology_id)
            .collect();
        own.sort_by_key(|s| s.order_index);

        for subtopic in own {
            if !seen_subtopics.insert(subtopic.id) {
                continue;
            }
            items.push(WorkItem {
                technology_id,
                subtopic_id: subtopic.id,
                hours_required: subtopic.hours_required,
                difficulty: subtopic.difficulty_level,
                technology_rank: rank,
                order_index: subtopic.order_index,
            });
        }
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn technology(rank: i32) -> Technology {
        Technology {
            id: Uuid::new_v4(),
            name: format!("tech-{}", rank),
            complexity_rank: rank,
        }
    }

    fn subtopic(technology: &Technology, order_index: i32, hours: i64) -> Subtopic {
        Subtopic {
            id: Uuid::new_v4(),
            technology_id: technology.id,
            name: format!("{}-{}", technology.name, order_index),
            hours_required: Decimal::from(hours),
            difficulty_level: DifficultyLevel::Beginner,
            order_index,
        }
    }

    #[test]
    fn orders_by_rank_then_order_index() {
        let html = technology(1);
        let css = technology(2);
        let js = technology(3);
        let subtopics = vec![
            subtopic(&js, 1, 4),
            subtopic(&css, 2, 2),
            subtopic(&html, 2, 1),
            subtopic(&css, 1, 3),
            subtopic(&html, 1, 2),
        ];

        // Selection order is deliberately scrambled.
        let items = resolve_work_items(
            &[js.id, html.id, css.id],
            &[html.clone(), css.clone(), js.clone()],
            &subtopics,
        )
        .unwrap();

        let order: Vec<(i32, i32)> = items
            .iter()
            .map(|i| (i.technology_rank, i.order_index))
            .collect();
        assert_eq!(order, vec![(1, 1), (1, 2), (2, 1), (2, 2), (3, 1)]);
    }

    #[test]
    fn excludes_unselected_technologies() {
        let html = technology(1);
        let css = technology(2);
        let subtopics = vec![subtopic(&html, 1, 2), subtopic(&css, 1, 3)];

        let items =
            resolve_work_items(&[css.id], &[html.clone(), css.clone()], &subtopics).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].technology_id, css.id);
    }

    #[test]
    fn equal_ranks_keep_selection_order() {
        let a = technology(5);
        let b = technology(5);
        let subtopics = vec![subtopic(&a, 1, 1), subtopic(&b, 1, 1)];

        let items = resolve_work_items(&[b.id, a.id], &[a.clone(), b.clone()], &subtopics).unwrap();

        assert_eq!(items[0].technology_id, b.id);
        assert_eq!(items[1].technology_id, a.id);
    }

    #[test]
    fn duplicate_selection_yields_no_duplicate_items() {
        let html = technology(1);
        let subtopics = vec![subtopic(&html, 1, 2), subtopic(&html, 2, 2)];

        let items =
            resolve_work_items(&[html.id, html.id], &[html.clone()], &subtopics).unwrap();

        assert_eq!(items.len(), 2);
    }

    #[test]
    fn unknown_technology_is_a_validation_error() {
        let html = technology(1);
        let err = resolve_work_items(&[Uuid::new_v4()], &[html], &[]).unwrap_err();
        assert!(matches!(err, PlannerError::Validation(_)));
    }
}
