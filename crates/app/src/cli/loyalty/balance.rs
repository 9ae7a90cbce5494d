use clap::Args;
use hearth_app::{context::AppContext, domain::customers::CustomerUuid};
use jiff::Timestamp;
use uuid::Uuid;

#[derive(Debug, Args)]
pub(crate) struct BalanceArgs {
    /// Customer UUID
    #[arg(long)]
    customer: Uuid,
}

pub(crate) async fn run(context: &AppContext, args: BalanceArgs) -> Result<(), String> {
    let customer = CustomerUuid::from_uuid(args.customer);
    let now = Timestamp::now();

    let balance = context
        .loyalty
        .current_balance(customer, now)
        .await
        .map_err(|error| format!("failed to read balance: {error}"))?;

    let tier = context
        .loyalty
        .current_tier(customer, now)
        .await
        .map_err(|error| format!("failed to read tier: {error}"))?;

    let next = context
        .loyalty
        .next_tier(customer, now)
        .await
        .map_err(|error| format!("failed to read next tier: {error}"))?;

    println!("customer_uuid: {customer}");
    println!("balance: {balance}");
    println!(
        "tier: {}",
        tier.map_or_else(|| "none".to_string(), |tier| tier.tier.name)
    );

    if let Some(next) = next {
        println!("next_tier: {}", next.tier.tier.name);
        println!("points_needed: {}", next.points_needed);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use hearth_app::domain::loyalty::{LoyaltyServiceError, MockLoyaltyService};
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn reads_balance_and_tiers_for_the_customer() -> TestResult {
        let uuid = Uuid::now_v7();
        let mut loyalty = MockLoyaltyService::new();

        loyalty
            .expect_current_balance()
            .once()
            .withf(move |customer, _| customer.into_uuid() == uuid)
            .return_once(|_, _| Ok(120));

        loyalty
            .expect_current_tier()
            .once()
            .return_once(|_, _| Ok(None));

        loyalty.expect_next_tier().once().return_once(|_, _| Ok(None));

        loyalty.expect_process_expired_points().never();
        loyalty.expect_redeem_points().never();

        run(
            &crate::cli::loyalty::tests::context(loyalty),
            BalanceArgs { customer: uuid },
        )
        .await?;

        Ok(())
    }

    #[tokio::test]
    async fn stops_at_the_first_failure() {
        let mut loyalty = MockLoyaltyService::new();

        loyalty
            .expect_current_balance()
            .once()
            .return_once(|_, _| Err(LoyaltyServiceError::InvalidData));

        loyalty.expect_current_tier().never();
        loyalty.expect_next_tier().never();

        let result = run(
            &crate::cli::loyalty::tests::context(loyalty),
            BalanceArgs {
                customer: Uuid::now_v7(),
            },
        )
        .await;

        assert!(
            matches!(&result, Err(message) if message.starts_with("failed to read balance")),
            "expected a balance error, got {result:?}"
        );
    }
}
