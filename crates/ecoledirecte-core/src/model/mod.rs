//! Domain model: session, students and fetched records.

pub mod records;
pub mod session;

pub use records::{
    AttendanceEvent, AttendanceKind, Discipline, Evaluation, Form, GeneralAverage, Grade,
    Homework, Lesson, MailboxSummary, Skill, Wallet,
};
pub use session::{modules, AccountType, Session, Student};
