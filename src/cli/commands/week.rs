use clap::Subcommand;

use crate::cli::{utils, OutputFormat};
use crate::week::IsoWeek;

#[derive(Subcommand)]
pub enum WeekCommands {
    #[command(about = "Show a week (defaults to the current week)")]
    Show {
        #[arg(help = "Week in YYYY-Www form")]
        week: Option<String>,
    },

    #[command(about = "Show the week after WEEK")]
    Next {
        #[arg(help = "Week in YYYY-Www form")]
        week: Option<String>,
    },

    #[command(about = "Show the week before WEEK")]
    Prev {
        #[arg(help = "Week in YYYY-Www form")]
        week: Option<String>,
    },
}

fn parse_or_current(week: Option<String>) -> anyhow::Result<IsoWeek> {
    Ok(match week {
        Some(w) => IsoWeek::parse(&w)?,
        None => IsoWeek::current(),
    })
}

pub fn handle(cmd: WeekCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let week = match cmd {
        WeekCommands::Show { week } => parse_or_current(week)?,
        WeekCommands::Next { week } => parse_or_current(week)?.next(),
        WeekCommands::Prev { week } => parse_or_current(week)?.previous(),
    };

    let (start, end) = week.range();
    utils::output_fields(
        &output_format,
        &[
            ("week", week.to_string()),
            ("label", week.display_label()),
            ("start", start.to_string()),
            ("end", end.to_string()),
            ("current", week.is_current().to_string()),
        ],
    )
}
