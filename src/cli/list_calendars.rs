//! List-calendars subcommand for google-tasks-to-tasks-org CLI

use crate::tasks_org::CaldavCalendar;
use clap::Args;
use std::fmt::Write as _;
use std::path::PathBuf;

/// Arguments for the list-calendars subcommand
#[derive(Args, Debug)]
pub struct ListCalendarsArgs {
    /// Tasks.org backup (optionally gzipped)
    #[arg(value_name = "TASKS_ORG_FILE")]
    pub tasks_org: PathBuf,
}

/// One tab-separated line per calendar: uuid, account, name.
pub fn render_calendars(calendars: &[CaldavCalendar]) -> String {
    let mut out = String::new();
    for calendar in calendars {
        let _ = writeln!(
            out,
            "{}\t{}\t{}",
            calendar.uuid, calendar.account, calendar.name
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_calendars() {
        let calendars = vec![
            CaldavCalendar {
                uuid: "cal-1".to_string(),
                account: "acc".to_string(),
                name: "Inbox".to_string(),
            },
            CaldavCalendar {
                uuid: "cal-2".to_string(),
                account: "acc".to_string(),
                name: "Work".to_string(),
            },
        ];
        assert_eq!(
            render_calendars(&calendars),
            "cal-1\tacc\tInbox\ncal-2\tacc\tWork\n"
        );
        assert_eq!(render_calendars(&[]), "");
    }
}
