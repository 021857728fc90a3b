//! Task generation for opportunity lifecycle events.
//!
//! Planning is a pure function of the opportunity; persistence is a single
//! batch insert. Callers invoke the generator after the opportunity row is
//! committed. There is no deduplication: planning for the same stage twice
//! produces two sets of rows, matching the write-twice-generate-twice
//! semantics of the stage endpoint.

use chrono::{Duration, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::opportunities::Opportunity;
use crate::shared::schema::tasks;
use crate::tasks::Task;

pub const CATEGORY_NEW_OPPORTUNITY: &str = "new_opportunity";
pub const CATEGORY_STAGE_CHANGE: &str = "stage_change";

/// A follow-up the planner wants created, before it gets an id and owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedTask {
    pub title: String,
    pub description: Option<String>,
    pub due_in_days: i64,
}

impl PlannedTask {
    fn new(title: impl Into<String>, due_in_days: i64) -> Self {
        Self {
            title: title.into(),
            description: None,
            due_in_days,
        }
    }

    fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Follow-ups appropriate to a stage label. Unknown labels still get a
/// generic review task so no transition goes unanswered.
pub fn stage_tasks(opportunity: &Opportunity) -> Vec<PlannedTask> {
    let title = &opportunity.title;
    match opportunity.stage.trim().to_lowercase().as_str() {
        "prospecting" => vec![
            PlannedTask::new(format!("Research account for '{title}'"), 2),
            PlannedTask::new(format!("Schedule discovery call for '{title}'"), 5),
        ],
        "qualification" => vec![
            PlannedTask::new(format!("Confirm budget for '{title}'"), 3),
            PlannedTask::new(format!("Identify decision maker for '{title}'"), 5),
        ],
        "proposal" => vec![
            PlannedTask::new(format!("Draft and send proposal for '{title}'"), 3)
                .describe(format!("Proposal amount: {}", opportunity.amount)),
            PlannedTask::new(format!("Schedule proposal walkthrough for '{title}'"), 7),
        ],
        "negotiation" => vec![
            PlannedTask::new(format!("Prepare revised terms for '{title}'"), 2),
            PlannedTask::new(format!("Get legal review for '{title}'"), 5),
        ],
        "closed" | "closed_won" | "won" => vec![
            PlannedTask::new(format!("Kick off onboarding for '{title}'"), 1),
            PlannedTask::new(format!("Send thank-you note for '{title}'"), 2),
        ],
        "closed_lost" | "lost" => vec![
            PlannedTask::new(format!("Log loss reason for '{title}'"), 1),
            PlannedTask::new(format!("Schedule win-back check-in for '{title}'"), 30),
        ],
        _ => vec![PlannedTask::new(format!("Review opportunity '{title}'"), 7)],
    }
}

/// Plan for a freshly created opportunity: an initial qualification task
/// plus whatever its starting stage calls for.
pub fn plan_opportunity_tasks(opportunity: &Opportunity) -> Vec<PlannedTask> {
    let mut planned = vec![PlannedTask::new(
        format!("Qualify new opportunity '{}'", opportunity.title),
        1,
    )
    .describe(format!("Initial amount: {}", opportunity.amount))];
    planned.extend(stage_tasks(opportunity));
    planned
}

/// Plan for a stage write. Only the destination stage is known here; the
/// previous value is not part of the event.
pub fn plan_stage_change_tasks(opportunity: &Opportunity) -> Vec<PlannedTask> {
    stage_tasks(opportunity)
}

/// The two opportunity lifecycle events that fan out into tasks. Each event
/// maps to exactly one planned batch and one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Created,
    StageChanged,
}

impl LifecycleEvent {
    pub fn category(self) -> &'static str {
        match self {
            Self::Created => CATEGORY_NEW_OPPORTUNITY,
            Self::StageChanged => CATEGORY_STAGE_CHANGE,
        }
    }
}

pub fn plan_for_event(event: LifecycleEvent, opportunity: &Opportunity) -> Vec<PlannedTask> {
    match event {
        LifecycleEvent::Created => plan_opportunity_tasks(opportunity),
        LifecycleEvent::StageChanged => plan_stage_change_tasks(opportunity),
    }
}

#[derive(Debug, Default)]
pub struct TaskGenerator;

impl TaskGenerator {
    pub fn generate_opportunity_tasks(
        &self,
        conn: &mut PgConnection,
        opportunity: &Opportunity,
    ) -> Result<Vec<Task>, diesel::result::Error> {
        self.generate(conn, opportunity, LifecycleEvent::Created)
    }

    pub fn generate_stage_change_tasks(
        &self,
        conn: &mut PgConnection,
        opportunity: &Opportunity,
    ) -> Result<Vec<Task>, diesel::result::Error> {
        self.generate(conn, opportunity, LifecycleEvent::StageChanged)
    }

    fn generate(
        &self,
        conn: &mut PgConnection,
        opportunity: &Opportunity,
        event: LifecycleEvent,
    ) -> Result<Vec<Task>, diesel::result::Error> {
        self.persist(
            conn,
            opportunity,
            event.category(),
            plan_for_event(event, opportunity),
        )
    }

    fn persist(
        &self,
        conn: &mut PgConnection,
        opportunity: &Opportunity,
        category: &str,
        planned: Vec<PlannedTask>,
    ) -> Result<Vec<Task>, diesel::result::Error> {
        let now = Utc::now();
        let rows: Vec<Task> = planned
            .into_iter()
            .map(|p| Task {
                id: Uuid::new_v4(),
                user_id: opportunity.user_id,
                opportunity_id: opportunity.id,
                title: p.title,
                description: p.description,
                category: category.to_string(),
                due_date: Some(now + Duration::days(p.due_in_days)),
                status: "pending".to_string(),
                created_at: now,
            })
            .collect();

        diesel::insert_into(tasks::table)
            .values(&rows)
            .execute(conn)?;

        tracing::debug!(
            opportunity_id = %opportunity.id,
            category,
            count = rows.len(),
            "generated follow-up tasks"
        );

        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::utils::bd;
    use chrono::Utc;

    fn opportunity(stage: &str) -> Opportunity {
        let now = Utc::now();
        Opportunity {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            lead_id: Uuid::new_v4(),
            title: "Acme renewal".to_string(),
            amount: bd(15000.0),
            stage: stage.to_string(),
            description: String::new(),
            expected_close_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn creation_plan_starts_with_qualification() {
        let plan = plan_opportunity_tasks(&opportunity("prospecting"));
        assert!(plan.len() >= 2);
        assert!(plan[0].title.starts_with("Qualify new opportunity"));
        assert!(plan[0].title.contains("Acme renewal"));
    }

    #[test]
    fn every_known_stage_has_tailored_tasks() {
        for stage in [
            "prospecting",
            "qualification",
            "proposal",
            "negotiation",
            "closed",
            "closed_won",
            "closed_lost",
        ] {
            let plan = plan_stage_change_tasks(&opportunity(stage));
            assert_eq!(plan.len(), 2, "stage {stage}");
        }
    }

    #[test]
    fn unknown_stage_falls_back_to_generic_review() {
        let plan = plan_stage_change_tasks(&opportunity("daydreaming"));
        assert_eq!(plan.len(), 1);
        assert!(plan[0].title.starts_with("Review opportunity"));
    }

    #[test]
    fn stage_labels_are_normalized_before_matching() {
        assert_eq!(
            plan_stage_change_tasks(&opportunity("  Negotiation ")),
            plan_stage_change_tasks(&opportunity("negotiation"))
        );
    }

    #[test]
    fn repeated_planning_for_the_same_stage_is_identical() {
        let opp = opportunity("closed");
        assert_eq!(plan_stage_change_tasks(&opp), plan_stage_change_tasks(&opp));
    }

    #[test]
    fn each_lifecycle_event_plans_exactly_one_batch() {
        let opp = opportunity("qualification");

        let created = plan_for_event(LifecycleEvent::Created, &opp);
        let changed = plan_for_event(LifecycleEvent::StageChanged, &opp);

        assert_eq!(created, plan_opportunity_tasks(&opp));
        assert_eq!(changed, plan_stage_change_tasks(&opp));
        assert_eq!(created.len(), changed.len() + 1);

        assert_eq!(LifecycleEvent::Created.category(), CATEGORY_NEW_OPPORTUNITY);
        assert_eq!(
            LifecycleEvent::StageChanged.category(),
            CATEGORY_STAGE_CHANGE
        );
    }

    #[test]
    fn proposal_tasks_carry_the_amount() {
        let plan = plan_stage_change_tasks(&opportunity("proposal"));
        let described = plan.iter().find(|p| p.description.is_some()).expect("one");
        assert!(described.description.as_deref().unwrap().contains("15000"));
    }
}
