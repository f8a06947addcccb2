use std::time::Duration;

/// Terminal result of one orchestrated action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(String),
    /// The polling bound ran out. The remote operation may still complete.
    Timeout(Duration),
    /// The id is absent from the snapshot the caller supplied.
    NotFound(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success(msg) => f.write_str(msg),
            Self::Failure(reason) => f.write_str(reason),
            Self::Timeout(elapsed) => write!(
                f,
                "Timeout waiting for guest to stop (gave up after {}s).",
                elapsed.as_secs()
            ),
            Self::NotFound(id) => write!(f, "VM/CT with ID {} not found.", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_not_found() {
        assert_eq!(
            Outcome::NotFound("999".to_string()).to_string(),
            "VM/CT with ID 999 not found."
        );
    }

    #[test]
    fn test_display_timeout() {
        let out = Outcome::Timeout(Duration::from_secs(145));
        assert_eq!(
            out.to_string(),
            "Timeout waiting for guest to stop (gave up after 145s)."
        );
        assert!(!out.is_success());
    }
}
