//! Derived homework and timetable views.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use ecoledirecte_core::{Homework, Lesson};

/// Number of days of timetable fetched from the start of the current week.
pub const TIMETABLE_SPAN_DAYS: i64 = 21;

/// Current week, next week and everything after, Monday-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekWindows {
    pub current_start: NaiveDate,
    pub current_end: NaiveDate,
    pub next_start: NaiveDate,
    pub next_end: NaiveDate,
    pub after_start: NaiveDate,
}

impl WeekWindows {
    pub fn containing(today: NaiveDate) -> Self {
        let current_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let current_end = current_start + Duration::days(6);
        let next_start = current_end + Duration::days(1);
        let next_end = next_start + Duration::days(6);
        Self {
            current_start,
            current_end,
            next_start,
            next_end,
            after_start: next_end + Duration::days(1),
        }
    }

    /// Last day of the timetable fetch window.
    pub fn fetch_end(&self) -> NaiveDate {
        self.current_start + Duration::days(TIMETABLE_SPAN_DAYS)
    }
}

fn homework_day(homework: &Homework) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&homework.date, "%Y-%m-%d").ok()
}

/// Homework due this week, next week and later.
pub fn homework_by_week(homework: &[Homework], weeks: &WeekWindows) -> [Vec<Homework>; 3] {
    let mut split: [Vec<Homework>; 3] = Default::default();
    for item in homework {
        let Some(day) = homework_day(item) else {
            continue;
        };
        if day >= weeks.current_start && day <= weeks.current_end {
            split[0].push(item.clone());
        } else if day >= weeks.next_start && day <= weeks.next_end {
            split[1].push(item.clone());
        } else if day >= weeks.after_start {
            split[2].push(item.clone());
        }
    }
    split
}

/// Lessons starting on `day`.
pub fn lessons_on(lessons: &[Lesson], day: NaiveDate) -> Vec<Lesson> {
    lessons
        .iter()
        .filter(|l| l.start.date() == day)
        .cloned()
        .collect()
}

/// Lessons starting between `from` and `to` inclusive, or from `from` on.
pub fn lessons_between(lessons: &[Lesson], from: NaiveDate, to: Option<NaiveDate>) -> Vec<Lesson> {
    lessons
        .iter()
        .filter(|l| {
            let day = l.start.date();
            day >= from && to.map_or(true, |to| day <= to)
        })
        .cloned()
        .collect()
}

/// The first day from `from` on that has lessons.
///
/// `None` when the fetched lessons stop before `from`.
pub fn next_day_with_lessons(lessons: &[Lesson], from: NaiveDate) -> Option<(NaiveDate, Vec<Lesson>)> {
    let last = lessons.iter().map(|l| l.start.date()).max()?;
    let mut day = from;
    while day <= last {
        let found = lessons_on(lessons, day);
        if !found.is_empty() {
            return Some((day, found));
        }
        day += Duration::days(1);
    }
    None
}

/// A single day of lessons with its bounds and lunch break.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaySchedule {
    pub date: NaiveDate,
    pub lessons: Vec<Lesson>,
    pub day_start_at: Option<NaiveDateTime>,
    pub day_end_at: Option<NaiveDateTime>,
    pub lunch_break_start_at: Option<NaiveDateTime>,
    pub lunch_break_end_at: Option<NaiveDateTime>,
    pub canceled_count: usize,
}

impl DaySchedule {
    /// Summarize one day's lessons (sorted by start).
    ///
    /// A canceled lesson sharing its start with the previous lesson was
    /// replaced and is not listed. The lunch break runs from the end of the
    /// last lesson ending before `lunch_break` to the start of the first
    /// lesson starting at or after it; canceled lessons are ignored.
    pub fn build(date: NaiveDate, lessons: &[Lesson], lunch_break: NaiveTime) -> Self {
        let mut schedule = Self {
            date,
            lessons: Vec::with_capacity(lessons.len()),
            day_start_at: None,
            day_end_at: None,
            lunch_break_start_at: None,
            lunch_break_end_at: None,
            canceled_count: 0,
        };

        for (index, lesson) in lessons.iter().enumerate() {
            let replaced = lesson.canceled
                && index > 0
                && lessons[index - 1].start == lesson.start;
            if !replaced {
                schedule.lessons.push(lesson.clone());
            }

            if lesson.canceled {
                schedule.canceled_count += 1;
                continue;
            }

            if schedule.day_start_at.is_none() {
                schedule.day_start_at = Some(lesson.start);
            }
            schedule.day_end_at = Some(lesson.end);
            if lesson.end.time() < lunch_break {
                schedule.lunch_break_start_at = Some(lesson.end);
            }
            if schedule.lunch_break_end_at.is_none() && lesson.start.time() >= lunch_break {
                schedule.lunch_break_end_at = Some(lesson.start);
            }
        }

        schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn lesson(id: i64, day: u32, start: (u32, u32), end: (u32, u32), canceled: bool) -> Lesson {
        Lesson {
            id,
            start: at(day, start.0, start.1),
            end: at(day, end.0, end.1),
            subject: format!("S{}", id),
            subject_code: None,
            teacher: None,
            room: None,
            kind: Some("COURS".into()),
            canceled,
            modified: false,
        }
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn test_week_windows_from_wednesday() {
        let weeks = WeekWindows::containing(date(15));
        assert_eq!(weeks.current_start, date(13));
        assert_eq!(weeks.current_end, date(19));
        assert_eq!(weeks.next_start, date(20));
        assert_eq!(weeks.next_end, date(26));
        assert_eq!(weeks.after_start, date(27));
        assert_eq!(weeks.fetch_end(), NaiveDate::from_ymd_opt(2025, 2, 3).unwrap());
    }

    #[test]
    fn test_day_schedule_lunch_break() {
        let lessons = vec![
            lesson(1, 13, (8, 0), (9, 0), false),
            lesson(2, 13, (9, 0), (10, 0), true),
            lesson(3, 13, (10, 0), (12, 0), false),
            lesson(4, 13, (14, 0), (15, 0), false),
            lesson(5, 13, (15, 0), (16, 30), false),
        ];
        let schedule = DaySchedule::build(date(13), &lessons, NaiveTime::from_hms_opt(13, 0, 0).unwrap());

        assert_eq!(schedule.lessons.len(), 5);
        assert_eq!(schedule.canceled_count, 1);
        assert_eq!(schedule.day_start_at, Some(at(13, 8, 0)));
        assert_eq!(schedule.day_end_at, Some(at(13, 16, 30)));
        assert_eq!(schedule.lunch_break_start_at, Some(at(13, 12, 0)));
        assert_eq!(schedule.lunch_break_end_at, Some(at(13, 14, 0)));
    }

    #[test]
    fn test_replaced_lesson_hidden() {
        let lessons = vec![
            lesson(1, 13, (8, 0), (9, 0), false),
            lesson(2, 13, (8, 0), (9, 0), true),
        ];
        let schedule = DaySchedule::build(date(13), &lessons, NaiveTime::from_hms_opt(13, 0, 0).unwrap());
        assert_eq!(schedule.lessons.len(), 1);
        assert_eq!(schedule.canceled_count, 1);
    }

    #[test]
    fn test_next_day_skips_empty_days() {
        let lessons = vec![
            lesson(1, 17, (8, 0), (9, 0), false),
            lesson(2, 20, (8, 0), (9, 0), false),
            lesson(3, 20, (9, 0), (10, 0), false),
        ];
        let (day, found) = next_day_with_lessons(&lessons, date(18)).unwrap();
        assert_eq!(day, date(20));
        assert_eq!(found.len(), 2);

        assert!(next_day_with_lessons(&lessons, date(21)).is_none());
        assert!(next_day_with_lessons(&[], date(18)).is_none());
    }

    #[test]
    fn test_homework_by_week() {
        let make = |date: &str| Homework {
            id: 1,
            date: date.into(),
            subject: "MATHS".into(),
            subject_code: None,
            short_description: String::new(),
            description: String::new(),
            done: false,
            requires_quiz: false,
            given_on: None,
            submit_online: false,
            max_submit_days: None,
        };
        let homework = vec![
            make("2025-01-14"),
            make("2025-01-20"),
            make("2025-01-26"),
            make("2025-02-10"),
            make("2025-01-10"),
            make("bad"),
        ];
        let [current, next, after] = homework_by_week(&homework, &WeekWindows::containing(date(15)));
        assert_eq!(current.len(), 1);
        assert_eq!(next.len(), 2);
        assert_eq!(after.len(), 1);
    }

    #[test]
    fn test_lessons_between_open_ended() {
        let lessons = vec![
            lesson(1, 13, (8, 0), (9, 0), false),
            lesson(2, 27, (8, 0), (9, 0), false),
            lesson(3, 31, (8, 0), (9, 0), false),
        ];
        assert_eq!(lessons_between(&lessons, date(13), Some(date(19))).len(), 1);
        assert_eq!(lessons_between(&lessons, date(27), None).len(), 2);
    }
}
