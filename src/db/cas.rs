//! Compare-and-swap helper shared by every repository's version-bump
//! update: fold the expected-version check into the `UPDATE ... WHERE`
//! clause and inspect `rows_affected()` rather than issuing a separate
//! read-then-write.

use crate::error::DomainError;

/// Every versioned-row UPDATE in this crate is written as
/// `UPDATE t SET version = version + 1, ... WHERE id = $1 AND version = $2`.
/// `rows_affected() == 1` means the CAS succeeded; `0` means either the row
/// doesn't exist or another writer already advanced `version` — both
/// collapse to `VersionConflict`, leaving the caller to re-read and
/// decide which.
pub fn check_cas(rows_affected: u64, expected_version: i64) -> Result<(), DomainError> {
    if rows_affected == 1 {
        Ok(())
    } else {
        Err(DomainError::VersionConflict {
            expected: expected_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_row_is_success() {
        assert!(check_cas(1, 5).is_ok());
    }

    #[test]
    fn zero_rows_is_conflict() {
        assert!(matches!(
            check_cas(0, 5),
            Err(DomainError::VersionConflict { expected: 5 })
        ));
    }
}
