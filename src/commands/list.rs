use crate::app::App;
use crate::commands::Out;
use crate::ledger::Summary;
use crate::render::View;
use crate::Result;

/// Shows the balance, totals and every transaction, newest first.
pub async fn list(app: &App) -> Result<Out<View>> {
    let view = app.view();
    Ok(Out::new(view.to_string(), view))
}

/// Shows the balance and totals only.
pub async fn summary(app: &App) -> Result<Out<Summary>> {
    let view = app.view();
    let message = format!(
        "Balance: {}, Income: {}, Expenses: {}",
        view.balance, view.income, view.expenses
    );
    Ok(Out::new(message, app.ledger().summary()))
}
