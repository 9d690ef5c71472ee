/// Running sum and count of answered values. An empty accumulator averages to 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Average {
    total: f64,
    count: usize,
}

impl Average {
    pub fn push(&mut self, value: i32) {
        self.total += value as f64;
        self.count += 1;
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn value(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// Formats `part / total` as a percentage with one decimal, or `"0%"` when `total` is zero.
/// Halves round away from zero, so 1 of 16 reads `6.3%`.
pub fn percent_label(part: usize, total: usize) -> String {
    if total == 0 {
        return "0%".to_string();
    }
    let tenths = (part as f64 * 1000.0 / total as f64).round();
    format!("{:.1}%", tenths / 10.0)
}

/// Qualitative label for a Likert answer.
pub fn score_label(value: i32) -> String {
    match value {
        1 => "미흡(1점)".to_string(),
        2 => "개선필요(2점)".to_string(),
        3 => "양호(3점)".to_string(),
        4 => "우수(4점)".to_string(),
        5 => "탁월(5점)".to_string(),
        other => format!("{other}점"),
    }
}

/// First run of ASCII digits inside a label, or 0 when there is none.
pub fn embedded_score(label: &str) -> u64 {
    label
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .fold(0u64, |acc, c| {
            acc.saturating_mul(10)
                .saturating_add(u64::from(c.to_digit(10).unwrap_or(0)))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_average_is_zero() {
        let avg = Average::default();
        assert_eq!(avg.count(), 0);
        assert_eq!(avg.value(), 0.0);
    }

    #[test]
    fn average_divides_sum_by_count() {
        let mut avg = Average::default();
        for v in [4, 5, 3, 5] {
            avg.push(v);
        }
        assert_eq!(avg.count(), 4);
        assert!((avg.value() - 4.25).abs() < 1e-9);
    }

    #[test]
    fn percent_label_rounds_to_one_decimal() {
        assert_eq!(percent_label(0, 0), "0%");
        assert_eq!(percent_label(1, 4), "25.0%");
        assert_eq!(percent_label(1, 3), "33.3%");
        assert_eq!(percent_label(2, 3), "66.7%");
        assert_eq!(percent_label(3, 3), "100.0%");
        assert_eq!(percent_label(1, 16), "6.3%");
        assert_eq!(percent_label(1, 80), "1.3%");
        assert_eq!(percent_label(3, 16), "18.8%");
    }

    #[test]
    fn known_scores_get_fixed_labels() {
        assert_eq!(score_label(1), "미흡(1점)");
        assert_eq!(score_label(3), "양호(3점)");
        assert_eq!(score_label(5), "탁월(5점)");
        assert_eq!(score_label(7), "7점");
        assert_eq!(score_label(0), "0점");
    }

    #[test]
    fn embedded_score_reads_first_digit_run() {
        assert_eq!(embedded_score("개선필요(2점)"), 2);
        assert_eq!(embedded_score("10점"), 10);
        assert_eq!(embedded_score("no digits"), 0);
    }
}
