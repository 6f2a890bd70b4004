use std::sync::Mutex;

/// Line-oriented log of a single build, shared between the deploy pipeline
/// and the registry push.
#[derive(Debug, Default)]
pub struct BuildLog {
    lines: Mutex<Vec<String>>,
}

impl BuildLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self, line: impl Into<String>) {
        let line = line.into();
        tracing::debug!(build_log = %line);
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::BuildLog;

    #[test]
    fn test_lines_are_kept_in_order() {
        let log = BuildLog::new();
        log.log("Retagging");
        log.log(String::from("Pushing"));
        assert_eq!(log.lines(), vec!["Retagging", "Pushing"]);
    }
}
