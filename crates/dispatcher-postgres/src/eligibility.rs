//! Builds the eligibility `CASE` expression (§4.1, §9) once from the worker
//! registry at queuer startup — a pure function of the registry, replacing
//! the source's pattern of rebuilding it ad hoc from a hardcoded worker list.

use dispatcher_core::registry::{WorkerPolicy, UNKNOWN_WORKER_DELAY_SECONDS, UNKNOWN_WORKER_RETRY_SECONDS};

/// The `delay_seconds`/`retry_seconds` `CASE` fragments, precomputed as SQL
/// text once per process. Rebuilt only when the registry changes (i.e.
/// never, after startup).
#[derive(Debug, Clone)]
pub struct EligibilityExpr {
    delay_case: String,
    retry_case: String,
}

impl EligibilityExpr {
    pub fn build(policies: &[WorkerPolicy]) -> Self {
        let mut delay_case = String::from("CASE bg_worker_task");
        let mut retry_case = String::from("CASE bg_worker_task");

        for policy in policies {
            let name = policy.queue_name.replace('\'', "''");
            delay_case.push_str(&format!(
                " WHEN '{name}' THEN INTERVAL '{} seconds'",
                policy.delay_seconds
            ));
            retry_case.push_str(&format!(
                " WHEN '{name}' THEN INTERVAL '{} seconds'",
                policy.retry_seconds
            ));
        }

        delay_case.push_str(&format!(
            " ELSE INTERVAL '{UNKNOWN_WORKER_DELAY_SECONDS} seconds' END"
        ));
        retry_case.push_str(&format!(
            " ELSE INTERVAL '{UNKNOWN_WORKER_RETRY_SECONDS} seconds' END"
        ));

        Self {
            delay_case,
            retry_case,
        }
    }

    /// The full `promote_eligible` statement: select-for-update-skip-locked
    /// plus the bump, in one round trip (§4.1).
    pub fn promote_eligible_sql(&self) -> String {
        format!(
            r#"
            WITH eligible AS (
                SELECT id
                FROM tasks
                WHERE COALESCE(execute_after, creation_time) + {delay} + (num_pushed * {retry}) <= now()
                ORDER BY id
                FOR UPDATE SKIP LOCKED
            )
            UPDATE tasks
            SET num_pushed = num_pushed + 1
            WHERE id IN (SELECT id FROM eligible)
            RETURNING id, bg_worker_task, num_pushed
            "#,
            delay = self.delay_case,
            retry = self.retry_case,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_worker_falls_back_to_documented_defaults() {
        let expr = EligibilityExpr::build(&[WorkerPolicy {
            queue_name: "known".to_string(),
            delay_seconds: 5,
            retry_seconds: 10,
        }]);
        let sql = expr.promote_eligible_sql();
        assert!(sql.contains("WHEN 'known' THEN INTERVAL '5 seconds'"));
        assert!(sql.contains("WHEN 'known' THEN INTERVAL '10 seconds'"));
        assert!(sql.contains("ELSE INTERVAL '0 seconds' END"));
        assert!(sql.contains("ELSE INTERVAL '200 seconds' END"));
    }

    #[test]
    fn escapes_single_quotes_in_worker_names() {
        let expr = EligibilityExpr::build(&[WorkerPolicy {
            queue_name: "weird'name".to_string(),
            delay_seconds: 0,
            retry_seconds: 1,
        }]);
        assert!(expr.delay_case.contains("weird''name"));
    }
}
