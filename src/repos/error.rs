/*
 * Responsibility
 * - repo が上位に伝える意味の定義
 * - sqlx::Error を「重複」「接続不可」「その他」に分類する (HTTP status はここでは決めない)
 */
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("conflict")]
    Conflict,
    #[error("database unavailable")]
    Unavailable(#[source] sqlx::Error),
    #[error("db error")]
    Db(#[source] sqlx::Error),
}

const UNIQUE_VIOLATION: &str = "23505";

impl From<sqlx::Error> for RepoError {
    fn from(e: sqlx::Error) -> Self {
        if let sqlx::Error::Database(dbe) = &e
            && dbe.code().as_deref() == Some(UNIQUE_VIOLATION)
        {
            return RepoError::Conflict;
        }

        match e {
            sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_) => RepoError::Unavailable(e),
            other => RepoError::Db(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_connection_failures_as_unavailable() {
        assert!(matches!(
            RepoError::from(sqlx::Error::PoolTimedOut),
            RepoError::Unavailable(_)
        ));
        assert!(matches!(
            RepoError::from(sqlx::Error::PoolClosed),
            RepoError::Unavailable(_)
        ));
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert!(matches!(
            RepoError::from(sqlx::Error::Io(io)),
            RepoError::Unavailable(_)
        ));
    }

    #[test]
    fn other_failures_stay_db_errors() {
        assert!(matches!(
            RepoError::from(sqlx::Error::RowNotFound),
            RepoError::Db(_)
        ));
        assert!(matches!(
            RepoError::from(sqlx::Error::ColumnNotFound("recipe".into())),
            RepoError::Db(_)
        ));
    }
}
