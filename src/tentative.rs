use std::future::Future;

use tokio::sync::RwLock;

/// Applies `forward` to `target` right away, then awaits `commit`. When the
/// commit fails, `rollback` compensates the change and the error is returned.
///
/// The rollback is a compensating edit rather than a restore of the old value,
/// so changes made by others while the commit was in flight survive.
pub async fn apply_tentatively<T, R, E, F, B, Fut>(
    target: &RwLock<T>,
    forward: F,
    rollback: B,
    commit: Fut,
) -> Result<R, E>
where
    F: FnOnce(&mut T),
    B: FnOnce(&mut T),
    Fut: Future<Output = Result<R, E>>,
{
    {
        let mut guard = target.write().await;
        forward(&mut *guard);
    }

    match commit.await {
        Ok(value) => Ok(value),
        Err(e) => {
            let mut guard = target.write().await;
            rollback(&mut *guard);
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn change_is_visible_before_commit_finishes() {
        let flag = RwLock::new(false);
        let result: Result<bool, String> = apply_tentatively(
            &flag,
            |f| *f = true,
            |f| *f = false,
            async { Ok(*flag.read().await) },
        )
        .await;
        assert_eq!(result, Ok(true));
        assert!(*flag.read().await);
    }

    #[tokio::test]
    async fn failure_runs_the_rollback() {
        let counter = RwLock::new(10);
        let result: Result<(), String> = apply_tentatively(
            &counter,
            |c| *c += 5,
            |c| *c -= 5,
            async { Err("Network error".to_string()) },
        )
        .await;
        assert_eq!(result, Err("Network error".to_string()));
        assert_eq!(*counter.read().await, 10);
    }
}
