use super::HandlerContext;
use crate::presentation::views::SummaryView;
use crate::snapshot::Snapshot;
use crate::types::OutputFormat;
use anyhow::Result;
use asadm_engine::create_summary;

pub fn handle(ctx: &HandlerContext, snapshot: &Snapshot, allow_unstable: bool) -> Result<()> {
    let allow_unstable = allow_unstable || ctx.config.license.allow_unstable;

    let summary = create_summary(
        &snapshot.stats,
        &snapshot.metadata,
        snapshot.agent_response.as_ref(),
        allow_unstable,
    );

    match ctx.format {
        OutputFormat::Json => ctx.print_json(&summary),
        OutputFormat::Plain => {
            print!(
                "{}",
                SummaryView {
                    summary: &summary,
                    enable_color: ctx.color,
                }
            );
            Ok(())
        }
    }
}
