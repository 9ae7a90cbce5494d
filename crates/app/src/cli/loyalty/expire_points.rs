use clap::Args;
use hearth_app::context::AppContext;
use jiff::Timestamp;

#[derive(Debug, Args)]
pub(crate) struct ExpirePointsArgs {
    /// Expire points as of this instant instead of now (RFC 3339)
    #[arg(long)]
    at: Option<Timestamp>,
}

pub(crate) async fn run(context: &AppContext, args: ExpirePointsArgs) -> Result<(), String> {
    let now = args.at.unwrap_or_else(Timestamp::now);

    let expired = context
        .loyalty
        .process_expired_points(now)
        .await
        .map_err(|error| format!("failed to expire points: {error}"))?;

    println!("expired_entries: {expired}");

    Ok(())
}
