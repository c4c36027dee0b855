use anyhow::{anyhow, Result};
use cadence_core::error::CoreError;
use cadence_core::repository::Repository;
use uuid::Uuid;

const MIN_PREFIX_LEN: usize = 4;

fn check_prefix(short_id: &str) -> Result<()> {
    if short_id.trim().len() < MIN_PREFIX_LEN {
        return Err(anyhow!(CoreError::Validation(format!(
            "Short ID must be at least {} characters long.",
            MIN_PREFIX_LEN
        ))));
    }
    Ok(())
}

/// Resolves a full ID or unique prefix to a task ID owned by `user_id`.
pub async fn resolve_task_id(repo: &impl Repository, user_id: Uuid, short_id: &str) -> Result<Uuid> {
    if let Ok(id) = short_id.parse::<Uuid>() {
        return Ok(id);
    }
    check_prefix(short_id)?;

    let tasks = repo.find_tasks_by_short_id_prefix(user_id, short_id).await?;
    match tasks.len() {
        1 => Ok(tasks[0].id),
        0 => Err(anyhow!(CoreError::NotFound(format!(
            "No task found with ID prefix '{}'",
            short_id
        )))),
        _ => {
            let candidates = tasks
                .into_iter()
                .map(|t| (t.id.to_string(), t.title))
                .collect();
            Err(anyhow!(CoreError::AmbiguousId(candidates)))
        }
    }
}

/// Resolves a full ID or unique prefix to an occurrence of `task_id`.
pub async fn resolve_occurrence_id(
    repo: &impl Repository,
    user_id: Uuid,
    task_id: Uuid,
    short_id: &str,
) -> Result<Uuid> {
    if let Ok(id) = short_id.parse::<Uuid>() {
        return Ok(id);
    }
    check_prefix(short_id)?;

    let occurrences = repo
        .find_occurrences_by_short_id_prefix(user_id, task_id, short_id)
        .await?;
    match occurrences.len() {
        1 => Ok(occurrences[0].id),
        0 => Err(anyhow!(CoreError::NotFound(format!(
            "No occurrence found with ID prefix '{}'",
            short_id
        )))),
        _ => {
            let candidates = occurrences
                .into_iter()
                .map(|o| (o.id.to_string(), o.due_at.format("%Y-%m-%d %H:%M").to_string()))
                .collect();
            Err(anyhow!(CoreError::AmbiguousId(candidates)))
        }
    }
}

/// Display form of an ID that can be typed back as a prefix. UUIDv7 ids
/// start with a millisecond timestamp, so the prefix has to reach past it
/// into the counter bits to stay unique.
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        let id: Uuid = "0190c3a2-7d4e-7b1a-9f00-123456789abc".parse().unwrap();
        assert_eq!(short_id(&id), "0190c3a27d4e7b1a");
    }

    #[test]
    fn test_prefix_too_short() {
        assert!(check_prefix("ab").is_err());
        assert!(check_prefix("abcd").is_ok());
    }
}
