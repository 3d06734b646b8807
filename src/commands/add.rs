use crate::app::App;
use crate::args::AddArgs;
use crate::commands::Out;
use crate::model::{NewTransaction, Transaction};
use crate::Result;
use tracing::warn;

/// Records a transaction. The date and time default to now when not given.
///
/// A category that is not in the configured list is accepted with a warning.
///
/// # Errors
/// - Returns a `Validation` error if the amount is empty, not a number, or not greater than zero.
///   Nothing is recorded in that case.
pub async fn add(app: &mut App, args: AddArgs) -> Result<Out<Transaction>> {
    let now = app.now();
    let date = args
        .date()
        .unwrap_or(now.date())
        .and_time(args.time().unwrap_or(now.time()));

    if !app.config().categories().iter().any(|c| c == args.category()) {
        warn!(
            "'{}' is not one of the configured categories: {}",
            args.category(),
            app.config().categories().join(", ")
        );
    }

    let details = NewTransaction::parse(
        args.description(),
        args.amount(),
        args.category(),
        args.transaction_type(),
        date,
    )?;
    let transaction = app.add(details).await;

    let mut message = format!(
        "Added {} {} of {}, balance is now {}",
        transaction.transaction_type(),
        transaction.id(),
        transaction.amount(),
        app.view().balance
    );
    if !app.ledger().is_persisted() {
        message.push_str(" (not saved, see the log for details)");
    }
    Ok(Out::new(message, transaction))
}
