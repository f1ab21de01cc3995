use crate::error::FormError;
use crate::render::escape_markdown;
use crate::smoothie::{Smoothie, SmoothieId};
use crate::store::SmoothieStore;

/// One smoothie with its edit link and delete trigger.
pub struct SmoothieCard<'a> {
    smoothie: &'a Smoothie,
}

impl<'a> SmoothieCard<'a> {
    pub fn new(smoothie: &'a Smoothie) -> Self {
        SmoothieCard { smoothie }
    }

    /// MarkdownV2 rendering of the card.
    pub fn render(&self) -> String {
        let s = self.smoothie;
        format!(
            "*{}*\n{}\nRating: {}\n/edit {}   /delete {}",
            escape_markdown(&s.title),
            escape_markdown(&s.method),
            escape_markdown(&s.rating.to_string()),
            s.id,
            s.id
        )
    }

    /// Deletes the smoothie; `on_deleted` only runs once the store confirms.
    pub async fn delete(
        &self,
        store: &dyn SmoothieStore,
        on_deleted: impl FnOnce(SmoothieId),
    ) -> Result<(), FormError> {
        let id = self.smoothie.id;
        match store.delete(id).await {
            Ok(rows) => {
                log::debug!("Deleted {:?}", rows);
                on_deleted(id);
                Ok(())
            }
            Err(e) => {
                log::error!("Failed to delete smoothie {}: {}", id, e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smoothie::OrderBy;
    use crate::store::testing::FlakyStore;

    #[tokio::test]
    async fn notifies_after_a_confirmed_delete() {
        let store = FlakyStore::with(&[("Kiwi Kick", "Blend kiwi", 5)]).await;
        let smoothie = store.list(OrderBy::CreatedAt).await.unwrap().remove(0);

        let mut notified = None;
        SmoothieCard::new(&smoothie)
            .delete(&store, |id| notified = Some(id))
            .await
            .unwrap();
        assert_eq!(notified, Some(smoothie.id));
        assert!(store.list(OrderBy::CreatedAt).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_delete_does_not_notify() {
        let store = FlakyStore::with(&[("Kiwi Kick", "Blend kiwi", 5)]).await;
        let smoothie = store.list(OrderBy::CreatedAt).await.unwrap().remove(0);
        store.fail(true);

        let mut notified = false;
        let result = SmoothieCard::new(&smoothie)
            .delete(&store, |_| notified = true)
            .await;
        assert!(matches!(result, Err(FormError::Network(_))));
        assert!(!notified);
    }

    #[tokio::test]
    async fn renders_escaped_fields_and_links() {
        let store = FlakyStore::with(&[("Mango-Tango!", "Blend (slowly).", 9)]).await;
        let smoothie = store.list(OrderBy::CreatedAt).await.unwrap().remove(0);
        let card = SmoothieCard::new(&smoothie);

        assert_eq!(
            card.render(),
            format!(
                "*Mango\\-Tango\\!*\nBlend \\(slowly\\)\\.\nRating: 9\n/edit {0}   /delete {0}",
                smoothie.id
            )
        );
    }
}
