use anyhow::bail;
use chrono::Utc;
use clap::Subcommand;
use serde_json::json;

use crate::cli::{connect, utils, OutputFormat};
use crate::config;
use crate::services::weekly_digest::{WeeklyDigest, HISTORY_WEEKS};
use crate::services::DigestService;
use crate::telegram::TelegramClient;
use crate::week::IsoWeek;

#[derive(Subcommand)]
pub enum ReportCommands {
    #[command(about = "Build the weekly digest and post it to Telegram")]
    Send {
        #[arg(long, help = "Week to report on (defaults to the previous week)")]
        week: Option<String>,
        #[arg(long, help = "Print the digest instead of sending it")]
        dry_run: bool,
        #[arg(long, help = "Upload the digest as a Markdown file instead of a message")]
        document: bool,
    },
}

pub async fn handle(cmd: ReportCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        ReportCommands::Send { week, dry_run, document } => {
            let week = match week {
                Some(w) => IsoWeek::parse(&w)?,
                None => IsoWeek::current().previous(),
            };

            let config = config::config();
            let service = DigestService::new(connect(config).await?);

            if dry_run {
                println!("{}", render(&service, week).await?);
                return Ok(());
            }

            let telegram = TelegramClient::new(&config.telegram);
            if !telegram.is_configured() {
                bail!("TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID must be set");
            }

            if document {
                let report = render(&service, week).await?;
                let file_name = format!("weekly-report-{week}.md");
                let caption = format!("Weekly report: {}", week.display_label());
                telegram.send_document(&report, &file_name, Some(&caption)).await?;
                return utils::output_success(
                    &output_format,
                    &format!("Weekly digest for {week} uploaded as {file_name}"),
                    Some(json!({ "weekIso": week, "fileName": file_name, "reportLength": report.chars().count() })),
                );
            }

            let outcome = service.run(&telegram, week).await?;
            utils::output_success(
                &output_format,
                &format!("Weekly digest for {} sent", outcome.week_iso),
                Some(serde_json::to_value(&outcome)?),
            )
        }
    }
}

async fn render(service: &DigestService, week: IsoWeek) -> anyhow::Result<String> {
    let weeks = week.trailing(HISTORY_WEEKS);
    let rows = service.load_rows(&weeks).await?;
    let active = service.active_managers().await?;
    Ok(WeeklyDigest::build(&weeks, &rows, active, Utc::now().date_naive()).render_markdown())
}
