use crate::app::App;
use crate::args::DeleteArgs;
use crate::commands::Out;
use crate::Result;

/// Deletes the transaction with the given id. An unknown id is not an error; nothing changes and
/// the structured output is `false`.
pub async fn delete(app: &mut App, args: DeleteArgs) -> Result<Out<bool>> {
    let id = args.id();
    let description = app
        .ledger()
        .get(id)
        .map(|t| format!("'{}' ({})", t.description(), t.amount()));
    let removed = app.remove(id).await;

    let message = match description {
        Some(d) if removed => format!(
            "Deleted transaction {id} {d}, balance is now {}",
            app.view().balance
        ),
        _ => format!("No transaction with id {id}, nothing was deleted"),
    };
    Ok(Out::new(message, removed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::TestEnv;

    #[tokio::test]
    async fn test_delete() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let id = app.ledger().transactions()[0].id();

        let out = delete(&mut app, DeleteArgs::new(id)).await.unwrap();
        assert_eq!(out.structure(), Some(&true));
        assert!(out.message().ends_with("balance is now $0.00"), "{}", out.message());
        assert!(app.ledger().is_empty());

        let out = delete(&mut app, DeleteArgs::new(id)).await.unwrap();
        assert_eq!(out.structure(), Some(&false));
        assert!(out.message().starts_with("No transaction"));
    }

    #[tokio::test]
    async fn test_delete_everything_stays_empty() {
        let env = TestEnv::new().await;
        let mut app = env.app().await;
        let id = app.ledger().transactions()[0].id();
        delete(&mut app, DeleteArgs::new(id)).await.unwrap();

        let reloaded = env.app().await;
        assert!(reloaded.ledger().is_empty());
        assert_eq!(reloaded.view().empty_message.as_deref(), Some("No transactions yet"));
    }
}
