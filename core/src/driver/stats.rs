/// Running totals of a sync run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Users processed, including empty and failed ones.
    pub users: usize,
    /// Users with at least one inserted row.
    pub users_with_inserts: usize,
    /// Rows inserted across all users.
    pub inserted: usize,
}

impl RunStats {
    pub fn record(&mut self, inserted: usize) {
        self.users += 1;
        self.users_with_inserts += inserted.min(1);
        self.inserted += inserted;
    }

    pub fn success_rate(&self) -> f64 {
        if self.users == 0 {
            0.0
        } else {
            self.users_with_inserts as f64 / self.users as f64
        }
    }
}

/// The per-user stdout progress line.
pub fn progress_line(user_id: &str, inserted: usize, stats: &RunStats) -> String {
    format!(
        "User: {} | Inserted: {} | Total users: {} | Total Inserted: {} | Success rate: {:.2}",
        user_id,
        inserted,
        stats.users,
        stats.inserted,
        stats.success_rate()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_users_and_rows() {
        let mut stats = RunStats::default();
        stats.record(3);
        stats.record(0);
        stats.record(1);
        assert_eq!(stats.users, 3);
        assert_eq!(stats.users_with_inserts, 2);
        assert_eq!(stats.inserted, 4);
    }

    #[test]
    fn test_success_rate_without_users_is_zero() {
        assert_eq!(RunStats::default().success_rate(), 0.0);
    }

    #[test]
    fn test_progress_line_format() {
        let mut stats = RunStats::default();
        stats.record(2);
        stats.record(0);
        stats.record(0);
        assert_eq!(
            progress_line("u3", 0, &stats),
            "User: u3 | Inserted: 0 | Total users: 3 | Total Inserted: 2 | Success rate: 0.33"
        );
    }
}
