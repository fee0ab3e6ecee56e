//! Day buckets for the thread view.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

use crate::models::Message;

/// Label of the bucket holding today's messages.
pub const TODAY_LABEL: &str = "TODAY";

/// Messages that fall on one calendar day, in backend order.
#[derive(Debug)]
pub struct DayGroup<'a> {
    pub date: NaiveDate,
    pub label: String,
    pub messages: Vec<&'a Message>,
}

/// Group messages by local calendar date, relative to the current local day.
pub fn group_by_day(messages: &[Message]) -> Vec<DayGroup<'_>> {
    group_by_day_in(messages, &Local, Local::now().date_naive())
}

/// Group messages by calendar date in `tz`.
///
/// Buckets appear in order of first appearance and are never re-sorted; a
/// message whose day already has a bucket joins it even if other days came in
/// between.
pub fn group_by_day_in<'a, Tz: TimeZone>(
    messages: &'a [Message],
    tz: &Tz,
    today: NaiveDate,
) -> Vec<DayGroup<'a>> {
    let mut groups: Vec<DayGroup<'a>> = Vec::new();

    for msg in messages {
        let date = msg.timestamp.with_timezone(tz).date_naive();
        match groups.iter_mut().find(|g| g.date == date) {
            Some(group) => group.messages.push(msg),
            None => groups.push(DayGroup {
                date,
                label: day_label(date, today),
                messages: vec![msg],
            }),
        }
    }

    groups
}

/// "TODAY" for the current date, otherwise `M/D/YYYY`.
pub fn day_label(date: NaiveDate, today: NaiveDate) -> String {
    if date == today {
        TODAY_LABEL.to_string()
    } else {
        date.format("%-m/%-d/%Y").to_string()
    }
}

/// Local wall-clock time as `HH:MM`.
pub fn local_time(ts: &DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format("%H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::fake;
    use chrono::FixedOffset;

    fn message(id: &str, timestamp: &str) -> Message {
        fake::message(id, "c1", timestamp)
    }

    fn ids<'a>(group: &DayGroup<'a>) -> Vec<&'a str> {
        group.messages.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn test_today_and_yesterday() {
        let messages = vec![
            message("old", "2023-12-31T10:00:00Z"),
            message("a", "2024-01-01T10:00:00Z"),
            message("b", "2024-01-01T15:00:00Z"),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let groups = group_by_day_in(&messages, &Utc, today);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "12/31/2023");
        assert_eq!(ids(&groups[0]), vec!["old"]);
        assert_eq!(groups[1].label, "TODAY");
        assert_eq!(ids(&groups[1]), vec!["a", "b"]);
    }

    #[test]
    fn test_backend_order_preserved_within_day() {
        let messages = vec![
            message("late", "2024-01-01T15:00:00Z"),
            message("early", "2024-01-01T10:00:00Z"),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let groups = group_by_day_in(&messages, &Utc, today);

        assert_eq!(groups.len(), 1);
        assert_eq!(ids(&groups[0]), vec!["late", "early"]);
    }

    #[test]
    fn test_non_adjacent_same_day_share_bucket() {
        let messages = vec![
            message("a", "2024-01-02T09:00:00Z"),
            message("b", "2024-01-03T09:00:00Z"),
            message("c", "2024-01-02T18:00:00Z"),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 2, 1).unwrap();
        let groups = group_by_day_in(&messages, &Utc, today);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].label, "1/2/2024");
        assert_eq!(ids(&groups[0]), vec!["a", "c"]);
        assert_eq!(ids(&groups[1]), vec!["b"]);
    }

    #[test]
    fn test_buckets_use_local_date() {
        // 23:30 UTC on New Year's Eve is already Jan 1st at UTC+2.
        let messages = vec![message("a", "2023-12-31T23:30:00Z")];
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let groups = group_by_day_in(&messages, &tz, today);

        assert_eq!(groups[0].label, TODAY_LABEL);
    }

    #[test]
    fn test_empty_input() {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        assert!(group_by_day_in(&[], &Utc, today).is_empty());
    }
}
