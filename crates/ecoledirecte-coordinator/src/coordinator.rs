//! Poll coordinator: log in, fetch, store, diff, publish.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{debug, error, info, warn};

use ecoledirecte_client::EdClient;
use ecoledirecte_core::{modules, EcoleDirecteEvent, Error, Result, Session, Student};

use crate::diff::{new_items, DiffRule, FORMS_RULE, STUDENT_RULES};
use crate::snapshot::{Resource, Snapshot};
use crate::views::{self, DaySchedule, WeekWindows};

const HOMEWORK_KEYS: &[&str] = &["homework", "homework_1", "homework_2", "homework_3"];
const GRADES_KEYS: &[&str] = &["grades", "evaluations", "disciplines", "general_average"];
const TIMETABLE_KEYS: &[&str] = &[
    "timetable_today",
    "timetable_tomorrow",
    "timetable_next_day",
    "timetable_period",
    "timetable_period_1",
    "timetable_period_2",
];
const ATTENDANCE_KEYS: &[&str] = &["absences", "lateness", "sanctions", "commendations"];
const MAILBOX_KEYS: &[&str] = &["mailbox"];

fn student_keys(student: &Student, suffixes: &[&str]) -> Vec<String> {
    let prefix = student.key();
    suffixes
        .iter()
        .map(|suffix| format!("{}_{}", prefix, suffix))
        .collect()
}

fn account_keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Keeps the previous snapshot and turns each refresh into events.
pub struct Coordinator {
    client: EdClient,
    lunch_break: NaiveTime,
    snapshot: Option<Snapshot>,
}

impl Coordinator {
    pub fn new(client: EdClient) -> Result<Self> {
        let lunch_break = client.config().lunch_break()?;
        Ok(Self {
            client,
            lunch_break,
            snapshot: None,
        })
    }

    pub fn client(&self) -> &EdClient {
        &self.client
    }

    /// The last successful snapshot.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        self.snapshot.as_ref()
    }

    pub async fn refresh(&mut self) -> Result<&Snapshot> {
        self.refresh_at(Local::now().naive_local()).await
    }

    /// Poll once as of `now`.
    ///
    /// A failed login fails the refresh and keeps the previous snapshot. A
    /// failed fetch only affects its own keys, which keep their previous
    /// value. Nothing is published on the first refresh.
    pub async fn refresh_at(&mut self, now: NaiveDateTime) -> Result<&Snapshot> {
        let previous = self.snapshot.clone();

        let mut session = match self.client.login().await {
            Ok(session) => session,
            Err(e) => {
                error!(category = "poll", error = %e, "Unable to log in to Ecole Directe");
                return Err(e);
            }
        };

        let today = now.date();
        let mut next = Snapshot::new(now);

        if session.is_family() {
            self.fetch_account(&mut session, &mut next, previous.as_ref(), today)
                .await;
        }

        let students = session.students.clone();
        for student in &students {
            self.fetch_student(&mut session, student, &mut next, previous.as_ref(), today)
                .await;
        }

        let published = match &previous {
            Some(previous) => self.publish_new_items(previous, &next, &students),
            None => 0,
        };

        info!(
            category = "poll",
            entries = next.len(),
            stale = next.stale.len(),
            events = published,
            "Refresh complete"
        );

        next.session = Some(session);
        let stored: &Snapshot = self.snapshot.insert(next);
        Ok(stored)
    }

    async fn fetch_account(
        &self,
        session: &mut Session,
        next: &mut Snapshot,
        previous: Option<&Snapshot>,
        today: NaiveDate,
    ) {
        if session.has_module(modules::MESSAGING) {
            match self.client.fetch_mailbox(session, None, today).await {
                Ok(mailbox) => next.insert("mailbox", Resource::Mailbox(mailbox)),
                Err(e) => failed(next, previous, "mailbox", &account_keys(MAILBOX_KEYS), e),
            }
        }
        if session.has_module(modules::FORMS) {
            match self.client.fetch_forms(session, today).await {
                Ok(forms) => next.insert("forms", Resource::Forms(forms)),
                Err(e) => failed(next, previous, "forms", &account_keys(&["forms"]), e),
            }
        }
        if session.has_module(modules::WALLET) {
            match self.client.fetch_wallets(session).await {
                Ok(wallets) => next.insert("wallets", Resource::Wallets(wallets)),
                Err(e) => failed(next, previous, "wallets", &account_keys(&["wallets"]), e),
            }
        }
    }

    async fn fetch_student(
        &self,
        session: &mut Session,
        student: &Student,
        next: &mut Snapshot,
        previous: Option<&Snapshot>,
        today: NaiveDate,
    ) {
        let prefix = student.key();
        let key = |suffix: &str| format!("{}_{}", prefix, suffix);
        let weeks = WeekWindows::containing(today);

        if student.has_module(modules::HOMEWORK) {
            match self.client.fetch_homework(session, student).await {
                Ok(homework) => {
                    let [current, following, later] = views::homework_by_week(&homework, &weeks);
                    next.insert(key("homework"), Resource::Homework(homework));
                    next.insert(key("homework_1"), Resource::Homework(current));
                    next.insert(key("homework_2"), Resource::Homework(following));
                    next.insert(key("homework_3"), Resource::Homework(later));
                }
                Err(e) => failed(next, previous, "homework", &student_keys(student, HOMEWORK_KEYS), e),
            }
        }

        if student.has_module(modules::GRADES) {
            match self.client.fetch_grades(session, student, today).await {
                Ok(report) => {
                    next.insert(key("grades"), Resource::Grades(report.grades));
                    next.insert(key("evaluations"), Resource::Evaluations(report.evaluations));
                    next.insert(key("disciplines"), Resource::Disciplines(report.disciplines));
                    if let Some(average) = report.general_average {
                        next.insert(key("general_average"), Resource::GeneralAverage(average));
                    }
                }
                Err(e) => failed(next, previous, "grades", &student_keys(student, GRADES_KEYS), e),
            }
        }

        if student.has_module(modules::TIMETABLE) {
            match self
                .client
                .fetch_lessons(session, student, weeks.current_start, weeks.fetch_end())
                .await
            {
                Ok(lessons) => self.store_timetable(next, &key, &lessons, today, &weeks),
                Err(e) => failed(next, previous, "timetable", &student_keys(student, TIMETABLE_KEYS), e),
            }
        }

        if student.has_module(modules::ATTENDANCE) {
            match self.client.fetch_attendance(session, student).await {
                Ok(report) => {
                    next.insert(key("absences"), Resource::Attendance(report.absences));
                    next.insert(key("lateness"), Resource::Attendance(report.lateness));
                    next.insert(key("sanctions"), Resource::Attendance(report.sanctions));
                    next.insert(key("commendations"), Resource::Attendance(report.commendations));
                }
                Err(e) => failed(next, previous, "attendance", &student_keys(student, ATTENDANCE_KEYS), e),
            }
        }

        if student.has_module(modules::MESSAGING) {
            match self.client.fetch_mailbox(session, Some(student), today).await {
                Ok(mailbox) => next.insert(key("mailbox"), Resource::Mailbox(mailbox)),
                Err(e) => failed(next, previous, "mailbox", &student_keys(student, MAILBOX_KEYS), e),
            }
        }
    }

    fn store_timetable(
        &self,
        next: &mut Snapshot,
        key: &dyn Fn(&str) -> String,
        lessons: &[ecoledirecte_core::Lesson],
        today: NaiveDate,
        weeks: &WeekWindows,
    ) {
        let tomorrow = today + Duration::days(1);
        let day = |date: NaiveDate| {
            let lessons = views::lessons_on(lessons, date);
            Resource::Schedule(Some(DaySchedule::build(date, &lessons, self.lunch_break)))
        };

        next.insert(key("timetable_today"), day(today));
        next.insert(key("timetable_tomorrow"), day(tomorrow));

        let next_day = views::next_day_with_lessons(lessons, tomorrow)
            .map(|(date, found)| DaySchedule::build(date, &found, self.lunch_break));
        next.insert(key("timetable_next_day"), Resource::Schedule(next_day));

        next.insert(
            key("timetable_period"),
            Resource::Lessons(views::lessons_between(lessons, weeks.current_start, Some(weeks.current_end))),
        );
        next.insert(
            key("timetable_period_1"),
            Resource::Lessons(views::lessons_between(lessons, weeks.next_start, Some(weeks.next_end))),
        );
        next.insert(
            key("timetable_period_2"),
            Resource::Lessons(views::lessons_between(lessons, weeks.after_start, None)),
        );
    }

    /// Publish one event per record that was not in `previous`.
    fn publish_new_items(&self, previous: &Snapshot, next: &Snapshot, students: &[Student]) -> usize {
        let mut published = self.publish_rule(previous, next, FORMS_RULE.resource, &FORMS_RULE, "");
        for student in students {
            let child_name = student.full_name();
            for rule in STUDENT_RULES {
                let key = format!("{}_{}", student.key(), rule.resource);
                published += self.publish_rule(previous, next, &key, rule, &child_name);
            }
        }
        published
    }

    fn publish_rule(
        &self,
        previous: &Snapshot,
        next: &Snapshot,
        key: &str,
        rule: &DiffRule,
        child_name: &str,
    ) -> usize {
        let (Some(before), Some(after)) = (previous.get(key), next.get(key)) else {
            return 0;
        };

        let new = new_items(&before.records(), &after.records(), rule.keys);
        for record in &new {
            debug!(category = "poll", key, event = rule.event, "New item");
            self.client.events().publish(
                EcoleDirecteEvent::new(child_name, rule.event, record.clone()),
                "coordinator",
            );
        }
        new.len()
    }
}

fn failed(next: &mut Snapshot, previous: Option<&Snapshot>, resource: &str, keys: &[String], error: Error) {
    let carried = next.carry_over(previous, keys);
    warn!(
        category = "poll",
        resource,
        error = %error,
        carried,
        "Fetch failed, keeping previous values"
    );
}
